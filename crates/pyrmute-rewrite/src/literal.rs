// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Composite literal wrapping.
//!
//! `{...}`, `[...]` and `{a, b}` (and their comprehension forms) are passed
//! to the configured immutable constructor. Children are rewritten before
//! the parent is wrapped, so nested literals convert inner to outer.

use pyrmute_core::{ExprContext, Expr, ExprKind, Keyword, SymbolPath};
use tracing::debug;

use crate::error::RewriteResult;
use crate::transformer::Rewriter;

impl Rewriter<'_> {
    /// Wrap an already rewritten expression if it is a composite literal.
    pub(crate) fn wrap_literal(&mut self, expr: Expr) -> RewriteResult<Expr> {
        let constructor: &SymbolPath = match &expr.kind {
            ExprKind::Dict { .. } | ExprKind::DictComp { .. } => &self.config.constructors.mapping,
            ExprKind::List {
                ctx: ExprContext::Load,
                ..
            }
            | ExprKind::ListComp { .. } => &self.config.constructors.sequence,
            ExprKind::Set { .. } | ExprKind::SetComp { .. } => &self.config.constructors.set,
            _ => return Ok(expr),
        };
        let loc = expr.loc;
        debug!(%loc, kind = %expr.kind.node_kind(), "wrapping literal");
        Ok(self
            .names
            .call_external(constructor, vec![expr], Vec::new(), loc))
    }

    /// A `**{...}` splat is consumed by the call, so the mapping itself
    /// stays plain; only its children are rewritten.
    pub(crate) fn rewrite_keyword(&mut self, keyword: &Keyword) -> RewriteResult<Keyword> {
        let splat_literal = keyword.arg.is_none()
            && matches!(
                keyword.value.kind,
                ExprKind::Dict { .. } | ExprKind::DictComp { .. }
            );
        let value = if splat_literal {
            self.rewrite_children(&keyword.value)?
        } else {
            self.rewrite_expr(&keyword.value)?
        };
        Ok(Keyword {
            arg: keyword.arg.clone(),
            value,
            loc: keyword.loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use pyrmute_core::render::to_source;
    use pyrmute_core::{build, Config, Expr, ExprContext, ExprKind, Location, Module, Stmt};

    use crate::transformer::rewrite;

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn source(stmts: Vec<Stmt>) -> String {
        to_source(&rewrite(&Module::new(stmts), &Config::default()).unwrap())
    }

    fn assign(target: &str, value: Expr) -> Stmt {
        build::assign(vec![build::name(target, loc())], value, loc())
    }

    #[test]
    fn nested_literals_wrap_inner_first() {
        let value = build::list(
            vec![build::dict(Vec::new(), loc()), build::dict(Vec::new(), loc())],
            loc(),
        );
        assert_eq!(
            source(vec![assign("x", value)]),
            "from pyrsistent import pmap as _pmap, pvector as _pvector\n\
             x = _pvector([_pmap({}), _pmap({})])\n"
        );
    }

    #[test]
    fn sets_and_comprehensions_are_wrapped() {
        let set = build::set(vec![build::int(1, loc())], loc());
        let comp = Expr::new(
            ExprKind::ListComp {
                elt: Box::new(build::name("i", loc())),
                generators: vec![pyrmute_core::Comprehension {
                    target: build::store("i", loc()),
                    iter: build::name("items", loc()),
                    ifs: Vec::new(),
                    is_async: false,
                    loc: loc(),
                }],
            },
            loc(),
        );
        assert_eq!(
            source(vec![assign("s", set), assign("l", comp)]),
            "from pyrsistent import pset as _pset, pvector as _pvector\n\
             s = _pset({1})\n\
             l = _pvector([i for i in items])\n"
        );
    }

    #[test]
    fn tuples_and_unpacking_targets_are_not_wrapped() {
        let tuple = build::tuple(vec![build::int(1, loc()), build::int(2, loc())], loc());
        let target = Expr::new(
            ExprKind::List {
                elts: vec![build::store("a", loc()), build::store("b", loc())],
                ctx: ExprContext::Store,
            },
            loc(),
        );
        let stmt = build::assign(vec![target], tuple, loc());
        assert_eq!(source(vec![stmt]), "[a, b] = (1, 2)\n");
    }

    #[test]
    fn keyword_splat_mapping_stays_plain() {
        let splat = build::dict(
            vec![(
                Some(build::string("a", loc())),
                build::list(Vec::new(), loc()),
            )],
            loc(),
        );
        let call = build::name("f", loc()).call(
            Vec::new(),
            vec![build::keyword(None, splat, loc())],
        );
        assert_eq!(
            source(vec![build::expr_stmt(call, loc())]),
            "from pyrsistent import pvector as _pvector\n\
             f(**{'a': _pvector([])})\n"
        );
    }
}
