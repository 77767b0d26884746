// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Name hygiene and import synthesis.
//!
//! A [`Names`] scope lives for one rewrite of one unit. It starts from every
//! identifier spelled anywhere in the unit and hands out fresh identifiers
//! that collide with none of them. External symbols (runtime functions,
//! constructors) get one memoized local alias each, and closing the scope
//! prepends the `from module import name as alias` statements that bind them.
//!
//! Collection is deliberately not scope-aware: a name used in any function
//! is avoided everywhere.

use std::collections::{BTreeMap, BTreeSet};

use pyrmute_core::{
    build, walk_module, Alias, ExceptHandler, Expr, ExprKind, Keyword, Location, Module, Param,
    Stmt, StmtKind, SymbolPath, VisitResult, Visitor,
};
use tracing::debug;

use crate::error::RewriteResult;

// ============================================================================
// Reserved names
// ============================================================================

/// Collects every identifier spelled in a unit.
#[derive(Default)]
struct NameCollector {
    names: BTreeSet<String>,
}

impl<'a> Visitor<'a> for NameCollector {
    fn visit_stmt(&mut self, node: &'a Stmt) -> VisitResult {
        match &node.kind {
            StmtKind::FunctionDef { name, .. } | StmtKind::ClassDef { name, .. } => {
                self.names.insert(name.clone());
            }
            StmtKind::Global { names } | StmtKind::Nonlocal { names } => {
                self.names.extend(names.iter().cloned());
            }
            _ => {}
        }
        VisitResult::Continue
    }

    fn visit_expr(&mut self, node: &'a Expr) -> VisitResult {
        if let ExprKind::Name { id, .. } = &node.kind {
            self.names.insert(id.clone());
        }
        VisitResult::Continue
    }

    fn visit_alias(&mut self, node: &'a Alias) -> VisitResult {
        self.names.insert(node.bound_name().to_string());
        VisitResult::Continue
    }

    fn visit_param(&mut self, node: &'a Param) -> VisitResult {
        self.names.insert(node.name.clone());
        VisitResult::Continue
    }

    fn visit_except_handler(&mut self, node: &'a ExceptHandler) -> VisitResult {
        if let Some(name) = &node.name {
            self.names.insert(name.clone());
        }
        VisitResult::Continue
    }
}

/// Every identifier spelled anywhere in `module`.
pub fn reserve_existing(module: &Module) -> BTreeSet<String> {
    let mut collector = NameCollector::default();
    walk_module(&mut collector, module);
    collector.names
}

// ============================================================================
// Names
// ============================================================================

/// Hygiene scope for one rewrite pass.
#[derive(Debug, Clone)]
pub struct Names {
    prefix: String,
    reserved: BTreeSet<String>,
    imports: BTreeMap<SymbolPath, String>,
}

impl Names {
    /// Open a scope over `module`, reserving every name it already uses.
    pub fn open(module: &Module, prefix: &str) -> Self {
        let reserved = reserve_existing(module);
        debug!(reserved = reserved.len(), prefix, "opened name scope");
        Names {
            prefix: prefix.to_string(),
            reserved,
            imports: BTreeMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn reserved(&self) -> &BTreeSet<String> {
        &self.reserved
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// A new identifier based on `hint`: `prefix+hint`, else `prefix+hint+N`
    /// for the smallest free N. The result is reserved before returning.
    pub fn fresh(&mut self, hint: &str) -> String {
        let base = format!("{}{}", self.prefix, hint);
        let mut candidate = base.clone();
        let mut counter: u64 = 0;
        while self.reserved.contains(&candidate) {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
        self.reserved.insert(candidate.clone());
        debug!(name = %candidate, "allocated fresh name");
        candidate
    }

    /// The local alias for an external symbol, allocated on first use.
    pub fn external(&mut self, path: &SymbolPath) -> String {
        if let Some(alias) = self.imports.get(path) {
            return alias.clone();
        }
        let alias = self.fresh(path.name());
        debug!(symbol = %path, alias = %alias, "bound external symbol");
        self.imports.insert(path.clone(), alias.clone());
        alias
    }

    /// Like [`Names::external`], from path segments.
    ///
    /// Fails with a config error for fewer than two segments.
    pub fn external_parts(&mut self, parts: &[&str]) -> RewriteResult<String> {
        let path = SymbolPath::parse(&parts.join("."))?;
        Ok(self.external(&path))
    }

    /// `alias(args, keywords)` for an external function.
    pub fn call_external(
        &mut self,
        path: &SymbolPath,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        loc: Location,
    ) -> Expr {
        let func = build::name(self.external(path), loc);
        build::call(func, args, keywords, loc)
    }

    /// Number of external symbols bound so far.
    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    /// Close the scope, prepending one import statement per module.
    ///
    /// Modules are sorted, and each statement's aliases are sorted by
    /// (original name, alias). Returns the number of statements inserted.
    pub fn close(self, module: &mut Module) -> usize {
        let mut by_module: BTreeMap<Vec<String>, Vec<(String, String)>> = BTreeMap::new();
        for (path, alias) in self.imports {
            let segments = path.segments();
            let (name, module_path) = match segments.split_last() {
                Some(split) => split,
                None => continue,
            };
            by_module
                .entry(module_path.to_vec())
                .or_default()
                .push((name.clone(), alias));
        }

        let mut stmts: Vec<Stmt> = by_module
            .into_iter()
            .map(|(module_path, mut aliases)| {
                aliases.sort();
                let names = aliases
                    .into_iter()
                    .map(|(name, alias)| (name, Some(alias)))
                    .collect();
                build::import_from(&module_path.join("."), names, Location::START)
            })
            .collect();

        let count = stmts.len();
        debug!(statements = count, "closing name scope");
        stmts.append(&mut module.body);
        module.body = stmts;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{ConfigError, ExprContext, ParamKind};

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn import_from(module: Option<&str>, level: u32, names: &[(&str, Option<&str>)]) -> Stmt {
        Stmt::new(
            StmtKind::ImportFrom {
                module: module.map(str::to_string),
                names: names
                    .iter()
                    .map(|(name, asname)| Alias {
                        name: name.to_string(),
                        asname: asname.map(str::to_string),
                        loc: loc(),
                    })
                    .collect(),
                level,
            },
            loc(),
        )
    }

    fn function(name: &str, params: &[&str], body: Vec<Stmt>, is_async: bool) -> Stmt {
        Stmt::new(
            StmtKind::FunctionDef {
                name: name.to_string(),
                params: params
                    .iter()
                    .map(|p| Param {
                        name: p.to_string(),
                        kind: ParamKind::Positional,
                        default: None,
                        loc: loc(),
                    })
                    .collect(),
                body,
                decorators: Vec::new(),
                is_async,
            },
            loc(),
        )
    }

    /// The unit used by the name tests:
    ///
    /// ```text
    /// import mod_name.bar.qux
    /// from .relative_name import relative_name
    /// import another.module as aliased_module
    /// from some.mod import imported_name
    /// from some.mod import thing as aliased_name
    ///
    /// global_name = 1
    /// async def async_func():
    ///     local_name = 2
    /// def func_name(param_name):
    ///     del some_name
    /// class class_name:
    ///     pass
    /// ```
    fn check_module() -> Module {
        let import = Stmt::new(
            StmtKind::Import {
                names: vec![Alias {
                    name: "mod_name.bar.qux".to_string(),
                    asname: None,
                    loc: loc(),
                }],
            },
            loc(),
        );
        let import_as = Stmt::new(
            StmtKind::Import {
                names: vec![Alias {
                    name: "another.module".to_string(),
                    asname: Some("aliased_module".to_string()),
                    loc: loc(),
                }],
            },
            loc(),
        );
        Module::new(vec![
            import,
            import_from(Some("relative_name"), 1, &[("relative_name", None)]),
            import_as,
            import_from(Some("some.mod"), 0, &[("imported_name", None)]),
            import_from(Some("some.mod"), 0, &[("thing", Some("aliased_name"))]),
            build::assign(vec![build::name("global_name", loc())], build::int(1, loc()), loc()),
            function(
                "async_func",
                &[],
                vec![build::assign(
                    vec![build::name("local_name", loc())],
                    build::int(2, loc()),
                    loc(),
                )],
                true,
            ),
            function(
                "func_name",
                &["param_name"],
                vec![build::delete(vec![build::name("some_name", loc())], loc())],
                false,
            ),
            Stmt::new(
                StmtKind::ClassDef {
                    name: "class_name".to_string(),
                    bases: Vec::new(),
                    keywords: Vec::new(),
                    body: vec![Stmt::new(StmtKind::Pass, loc())],
                    decorators: Vec::new(),
                },
                loc(),
            ),
        ])
    }

    #[test]
    fn sees_names() {
        let names = Names::open(&check_module(), "_");
        let expected: BTreeSet<String> = [
            "aliased_module",
            "aliased_name",
            "async_func",
            "class_name",
            "func_name",
            "global_name",
            "imported_name",
            "local_name",
            "mod_name",
            "param_name",
            "relative_name",
            "some_name",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(names.reserved(), &expected);
    }

    #[test]
    fn skips_existent() {
        let mut names = Names::open(&check_module(), "");
        let first = names.external_parts(&["test", "mod", "func_name"]).unwrap();
        let second = names.external_parts(&["test", "mod2", "func_name"]).unwrap();
        assert_eq!(first, "func_name0");
        assert_eq!(second, "func_name1");
        assert_eq!(
            names.external_parts(&["test", "mod", "func_name"]).unwrap(),
            "func_name0"
        );
        assert_eq!(
            names.external_parts(&["test", "mod2", "func_name"]).unwrap(),
            "func_name1"
        );
    }

    #[test]
    fn fresh_names_are_distinct() {
        let mut names = Names::open(&check_module(), "_");
        let mut seen = BTreeSet::new();
        for _ in 0..5 {
            let name = names.fresh("value");
            assert!(!check_module_names().contains(&name));
            assert!(seen.insert(name));
        }
        assert!(seen.contains("_value"));
        assert!(seen.contains("_value0"));
        assert!(seen.contains("_value3"));
    }

    fn check_module_names() -> BTreeSet<String> {
        reserve_existing(&check_module())
    }

    #[test]
    fn fresh_avoids_user_spelled_prefix_names() {
        let module = Module::new(vec![build::expr_stmt(build::name("_pmap", loc()), loc())]);
        let mut names = Names::open(&module, "_");
        let path = SymbolPath::parse("pyrsistent.pmap").unwrap();
        assert_eq!(names.external(&path), "_pmap0");
    }

    #[test]
    fn external_rejects_short_path() {
        let mut names = Names::open(&Module::default(), "_");
        assert!(matches!(
            names.external_parts(&["invoke"]),
            Err(crate::RewriteError::Config(
                ConfigError::InvalidSymbolPath { .. }
            ))
        ));
    }

    #[test]
    fn close_prepends_sorted_imports() {
        let mut module = Module::new(vec![build::expr_stmt(build::name("x", loc()), loc())]);
        let mut names = Names::open(&module, "_");
        for path in ["pyrsistent.pvector", "a.mod.zed", "pyrsistent.pmap", "a.mod.alpha"] {
            names.external(&SymbolPath::parse(path).unwrap());
        }
        assert_eq!(names.import_count(), 4);
        let inserted = names.close(&mut module);
        assert_eq!(inserted, 2);
        assert_eq!(module.body.len(), 3);

        let rendered = pyrmute_core::render::to_source(&module);
        assert_eq!(
            rendered,
            "from a.mod import alpha as _alpha, zed as _zed\n\
             from pyrsistent import pmap as _pmap, pvector as _pvector\n\
             x\n"
        );
        assert!(module.body[..2].iter().all(|s| s.loc == Location::START));
    }

    #[test]
    fn call_external_uses_alias_and_location() {
        let mut names = Names::open(&Module::default(), "_");
        let at = Location::new(4, 8);
        let path = SymbolPath::parse("pyrmute.runtime.invoke").unwrap();
        let call = names.call_external(&path, vec![build::name("v", at)], Vec::new(), at);
        assert_eq!(call.loc, at);
        match &call.kind {
            ExprKind::Call { func, .. } => {
                assert!(matches!(
                    &func.kind,
                    ExprKind::Name { id, ctx: ExprContext::Load } if id == "_invoke"
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
