// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Function rewriting behind an explicit re-entry guard.
//!
//! A loader that rewrites a function and then executes the result may be
//! asked to rewrite the same function again while that execution is in
//! progress. The caller holds a [`GuardScope`] for the duration; nested
//! requests made with the same [`RewriteGuard`] return
//! [`Rewritten::Reentered`] and leave the unit alone.

use std::cell::Cell;

use pyrmute_core::render::to_source;
use pyrmute_core::{Config, Module, StmtKind};
use tracing::debug;

use crate::error::{RewriteError, RewriteResult};
use crate::transformer::rewrite;

/// Re-entry state owned by the caller.
#[derive(Debug, Default)]
pub struct RewriteGuard {
    depth: Cell<usize>,
}

impl RewriteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    /// Mark the guard active until the returned scope is dropped.
    pub fn enter(&self) -> GuardScope<'_> {
        self.depth.set(self.depth.get() + 1);
        GuardScope { guard: self }
    }
}

/// Holds a [`RewriteGuard`] active.
#[derive(Debug)]
pub struct GuardScope<'g> {
    guard: &'g RewriteGuard,
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        let depth = self.guard.depth.get();
        self.guard.depth.set(depth.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions<'c> {
    pub config: &'c Config,
    /// Attach the rendered source of the rewritten unit.
    pub write_source: bool,
}

impl<'c> RewriteOptions<'c> {
    pub fn from_config(config: &'c Config) -> Self {
        RewriteOptions {
            config,
            write_source: config.rewrite.write_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rewritten {
    Transformed {
        module: Module,
        source: Option<String>,
    },
    /// The guard was active; nothing was rewritten.
    Reentered,
}

/// Rewrite the unit defining the top-level function `name`.
pub fn rewrite_function(
    unit: &Module,
    name: &str,
    options: RewriteOptions<'_>,
    guard: &RewriteGuard,
) -> RewriteResult<Rewritten> {
    if guard.is_active() {
        debug!(function = name, "rewrite re-entered, passing through");
        return Ok(Rewritten::Reentered);
    }
    let defines = unit.body.iter().any(|stmt| {
        matches!(&stmt.kind, StmtKind::FunctionDef { name: defined, .. } if defined == name)
    });
    if !defines {
        return Err(RewriteError::FunctionNotFound(name.to_string()));
    }

    let module = rewrite(unit, options.config)?;
    let source = options.write_source.then(|| to_source(&module));
    debug!(function = name, "rewrote function unit");
    Ok(Rewritten::Transformed { module, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{build, Location, Stmt};

    fn unit() -> Module {
        let loc = Location::new(1, 0);
        let body = vec![build::assign(
            vec![build::name("v", loc).attr("x")],
            build::int(1, loc),
            loc,
        )];
        Module::new(vec![Stmt::new(
            StmtKind::FunctionDef {
                name: "update".to_string(),
                params: Vec::new(),
                body,
                decorators: Vec::new(),
                is_async: false,
            },
            loc,
        )])
    }

    #[test]
    fn rewrites_and_attaches_source() {
        let config = Config::default();
        let guard = RewriteGuard::new();
        let out = rewrite_function(&unit(), "update", RewriteOptions::from_config(&config), &guard)
            .unwrap();
        match out {
            Rewritten::Transformed { source, .. } => {
                let source = source.unwrap();
                assert!(source.contains("v = _set_attr_with_fallback(v, 'x', 1)"));
            }
            Rewritten::Reentered => panic!("guard was not active"),
        }
    }

    #[test]
    fn source_can_be_omitted() {
        let config = Config::default();
        let options = RewriteOptions {
            config: &config,
            write_source: false,
        };
        let out = rewrite_function(&unit(), "update", options, &RewriteGuard::new()).unwrap();
        assert!(matches!(out, Rewritten::Transformed { source: None, .. }));
    }

    #[test]
    fn nested_request_passes_through() {
        let config = Config::default();
        let guard = RewriteGuard::new();
        {
            let _scope = guard.enter();
            let _inner = guard.enter();
            let out =
                rewrite_function(&unit(), "update", RewriteOptions::from_config(&config), &guard)
                    .unwrap();
            assert_eq!(out, Rewritten::Reentered);
        }
        assert!(!guard.is_active());
    }

    #[test]
    fn missing_function_is_an_error() {
        let config = Config::default();
        let err = rewrite_function(
            &unit(),
            "other",
            RewriteOptions::from_config(&config),
            &RewriteGuard::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::FunctionNotFound(name) if name == "other"));
    }
}
