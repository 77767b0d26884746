// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Configuration for a rewrite pass.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no file)
//! gives the stock runtime and constructor symbols:
//!
//! ```toml
//! [rewrite]
//! prefix = "_"
//!
//! [constructors]
//! mapping = "pyrsistent.pmap"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// File name looked up by [`Config::load_from_dir`].
pub const CONFIG_FILE_NAME: &str = "pyrmute.toml";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A symbol is not a dotted `module.name` path.
    #[error("invalid symbol path '{path}': {reason}")]
    InvalidSymbolPath { path: String, reason: String },

    /// The fresh-name prefix cannot start an identifier.
    #[error("invalid name prefix '{0}'")]
    InvalidPrefix(String),
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

// ============================================================================
// Symbol paths
// ============================================================================

/// A dotted path naming an external symbol, e.g. `pyrsistent.pmap`.
///
/// Always has at least two segments: the defining module and the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolPath(Vec<String>);

impl SymbolPath {
    pub fn parse(path: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSymbolPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.len() < 2 {
            return Err(invalid("expected at least a module and a name"));
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(invalid(&format!("'{}' is not an identifier", bad)));
        }
        Ok(SymbolPath(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Everything but the last segment, dotted.
    pub fn module(&self) -> String {
        self.0[..self.0.len() - 1].join(".")
    }

    /// The last segment.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl TryFrom<String> for SymbolPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SymbolPath::parse(&value)
    }
}

impl From<SymbolPath> for String {
    fn from(path: SymbolPath) -> Self {
        path.0.join(".")
    }
}

impl fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rewrite: RewriteSettings,

    /// Runtime support functions the rewritten code calls.
    #[serde(default)]
    pub runtime: RuntimeSymbols,

    /// Immutable constructors for composite literals and slices.
    #[serde(default)]
    pub constructors: ConstructorSymbols,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteSettings {
    /// Prefix for every synthesized identifier.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Attach rendered source to a rewritten function.
    #[serde(default = "default_write_source")]
    pub write_source: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSymbols {
    #[serde(default = "default_set_attr")]
    pub set_attr: SymbolPath,
    #[serde(default = "default_set_subscript")]
    pub set_subscript: SymbolPath,
    #[serde(default = "default_del_attr")]
    pub del_attr: SymbolPath,
    #[serde(default = "default_del_subscript")]
    pub del_subscript: SymbolPath,
    #[serde(default = "default_invoke")]
    pub invoke: SymbolPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorSymbols {
    #[serde(default = "default_mapping")]
    pub mapping: SymbolPath,
    #[serde(default = "default_sequence")]
    pub sequence: SymbolPath,
    #[serde(default = "default_set")]
    pub set: SymbolPath,
    #[serde(default = "default_slice")]
    pub slice: SymbolPath,
}

fn builtin(path: &[&str]) -> SymbolPath {
    SymbolPath(path.iter().map(|s| s.to_string()).collect())
}

fn default_prefix() -> String {
    "_".to_string()
}

fn default_write_source() -> bool {
    true
}

fn default_set_attr() -> SymbolPath {
    builtin(&["pyrmute", "runtime", "set_attr_with_fallback"])
}

fn default_set_subscript() -> SymbolPath {
    builtin(&["pyrmute", "runtime", "set_subscript_with_fallback"])
}

fn default_del_attr() -> SymbolPath {
    builtin(&["pyrmute", "runtime", "del_attr_with_fallback"])
}

fn default_del_subscript() -> SymbolPath {
    builtin(&["pyrmute", "runtime", "del_subscript_with_fallback"])
}

fn default_invoke() -> SymbolPath {
    builtin(&["pyrmute", "runtime", "invoke"])
}

fn default_mapping() -> SymbolPath {
    builtin(&["pyrsistent", "pmap"])
}

fn default_sequence() -> SymbolPath {
    builtin(&["pyrsistent", "pvector"])
}

fn default_set() -> SymbolPath {
    builtin(&["pyrsistent", "pset"])
}

fn default_slice() -> SymbolPath {
    builtin(&["builtins", "slice"])
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            write_source: default_write_source(),
        }
    }
}

impl Default for RuntimeSymbols {
    fn default() -> Self {
        Self {
            set_attr: default_set_attr(),
            set_subscript: default_set_subscript(),
            del_attr: default_del_attr(),
            del_subscript: default_del_subscript(),
            invoke: default_invoke(),
        }
    }
}

impl Default for ConstructorSymbols {
    fn default() -> Self {
        Self {
            mapping: default_mapping(),
            sequence: default_sequence(),
            set: default_set(),
            slice: default_slice(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&content)
    }

    /// Load `pyrmute.toml` from `dir` if present, else the defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.rewrite.prefix;
        if !prefix.is_empty() && !is_identifier(prefix) {
            return Err(ConfigError::InvalidPrefix(prefix.clone()));
        }
        Ok(())
    }

    /// Every external symbol the rewrite may import, with its role.
    pub fn symbols(&self) -> Vec<(&'static str, &SymbolPath)> {
        vec![
            ("set_attr", &self.runtime.set_attr),
            ("set_subscript", &self.runtime.set_subscript),
            ("del_attr", &self.runtime.del_attr),
            ("del_subscript", &self.runtime.del_subscript),
            ("invoke", &self.runtime.invoke),
            ("mapping", &self.constructors.mapping),
            ("sequence", &self.constructors.sequence),
            ("set", &self.constructors.set),
            ("slice", &self.constructors.slice),
        ]
    }
}
