//! JSON response types for CLI output.
//!
//! Every response starts with `status` and carries `schema_version`.
//! Field order and array order are deterministic: the same inputs produce
//! the same bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use pyrmute_core::Module;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PyrmuteError;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// SHA-256 of an input file, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Rewrite
// ============================================================================

/// The result of rewriting one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    /// Hash of the input bytes the result was computed from.
    pub input_hash: ContentHash,
    /// Number of import statements the rewrite prepended.
    pub imports: usize,
    /// The rewritten tree (`--format json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Module>,
    /// The rendered rewritten source (`--format source`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Where the debug dump was written (`--dump`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewriteResponse {
    pub status: String,
    pub schema_version: String,
    pub files: Vec<FileResult>,
}

impl RewriteResponse {
    pub fn new(files: Vec<FileResult>) -> Self {
        RewriteResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

// ============================================================================
// Exec
// ============================================================================

/// The state left behind by executing one unit.
#[derive(Debug, Clone, Serialize)]
pub struct ExecResponse {
    pub status: String,
    pub schema_version: String,
    pub path: String,
    /// Whether the unit was rewritten before it ran.
    pub rewritten: bool,
    /// Every user binding, rendered as source-like text.
    pub bindings: BTreeMap<String, String>,
    /// Values passed to `trace`, in evaluation order.
    pub traced: Vec<String>,
}

impl ExecResponse {
    pub fn new(
        path: impl Into<String>,
        rewritten: bool,
        bindings: BTreeMap<String, String>,
        traced: Vec<String>,
    ) -> Self {
        ExecResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            path: path.into(),
            rewritten,
            bindings,
            traced,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorInfo {
    pub fn from_error(err: &PyrmuteError) -> Self {
        ErrorInfo {
            code: err.error_code().code(),
            message: err.to_string(),
            path: err.path().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &PyrmuteError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_hex_sha256() {
        let hash = ContentHash::compute(b"");
        assert_eq!(
            hash.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn status_comes_first() {
        let response = RewriteResponse::new(Vec::new());
        let mut out = Vec::new();
        emit_response(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let status = text.find("\"status\"").unwrap();
        let version = text.find("\"schema_version\"").unwrap();
        assert!(status < version);
    }

    #[test]
    fn absent_fields_are_skipped() {
        let result = FileResult {
            path: "a.json".to_string(),
            input_hash: ContentHash::compute(b"{}"),
            imports: 0,
            tree: None,
            source: Some("x = 1\n".to_string()),
            dump: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("tree").is_none());
        assert!(json.get("dump").is_none());
        assert_eq!(json["source"], "x = 1\n");
    }

    #[test]
    fn error_response_carries_code_and_path() {
        let err = PyrmuteError::FileNotFound {
            path: "missing.json".to_string(),
        };
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.status, "error");
        assert_eq!(response.error.code, 3);
        assert_eq!(response.error.path.as_deref(), Some("missing.json"));
    }
}
