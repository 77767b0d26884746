// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Assignment destructuring.
//!
//! An assignment to an access chain becomes one assignment to the chain's
//! root, whose value evolves each level from the innermost access outward:
//!
//! ```text
//! a.b.c = v
//!   => a = set_attr(a, 'b', set_attr(a.b, 'c', v))
//! m[k] = v
//!   => m = set_subscript(m, k, v)
//! ```
//!
//! Evaluation order is kept: the value is hoisted into a temporary before
//! any target is touched when it has side effects, feeds several targets or
//! could be rebound by an effectful target. Effectful chain roots and
//! indices are hoisted in source order so the repeated reads of the chain
//! never re-run user code.

use pyrmute_core::{build, Expr, ExprContext, ExprKind, Location, Operator, Stmt};
use tracing::debug;

use crate::effects::{has_side_effects, is_trivial};
use crate::error::RewriteResult;
use crate::subscript::normalize;
use crate::transformer::Rewriter;

/// True for an access chain or an unpacking target containing one.
pub(crate) fn targets_access(target: &Expr) -> bool {
    match &target.kind {
        ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => true,
        ExprKind::Tuple { elts, .. } | ExprKind::List { elts, .. } => {
            elts.iter().any(targets_access)
        }
        ExprKind::Starred { value, .. } => targets_access(value),
        _ => false,
    }
}

/// True when evaluating an access chain's root or indices may run user code.
fn access_has_effects(target: &Expr) -> bool {
    match &target.kind {
        ExprKind::Name { .. } => false,
        ExprKind::Attribute { value, .. } => access_has_effects(value),
        ExprKind::Subscript { value, slice, .. } => {
            has_side_effects(slice) || access_has_effects(value)
        }
        _ => has_side_effects(target),
    }
}

impl Rewriter<'_> {
    /// `t1 = t2 = ... = value`
    pub(crate) fn rewrite_assign(
        &mut self,
        targets: &[Expr],
        value: &Expr,
        loc: Location,
    ) -> RewriteResult<Vec<Stmt>> {
        let mut out = Vec::new();
        let value = self.rewrite_expr(value)?;

        let shared = targets.len() > 1 && !is_trivial(&value);
        let effectful = has_side_effects(&value) && targets.iter().any(targets_access);
        // The value is read before any target root or index runs.
        let overtaken = !matches!(value.kind, ExprKind::Constant { .. })
            && targets.iter().any(|t| t.is_access() && access_has_effects(t));
        let value = if shared || effectful || overtaken {
            self.hoist(value, "value", &mut out)
        } else {
            value
        };

        for target in targets {
            self.assign_target(target, value.clone(), loc, &mut out)?;
        }
        Ok(out)
    }

    /// `target op= value`, desugared to `target = target op value`.
    ///
    /// Every target degrades to a plain assignment, names included.
    pub(crate) fn rewrite_aug_assign(
        &mut self,
        target: &Expr,
        op: Operator,
        value: &Expr,
        loc: Location,
    ) -> RewriteResult<Vec<Stmt>> {
        let mut out = Vec::new();
        let target = self.stabilize(target, &mut out)?;
        let value = self.rewrite_expr(value)?;
        let effectful = has_side_effects(&value);
        let combined = Expr::new(
            ExprKind::BinOp {
                left: Box::new(target.as_load()),
                op,
                right: Box::new(value),
            },
            loc,
        );
        let combined = if effectful && target.is_access() {
            self.hoist(combined, "value", &mut out)
        } else {
            combined
        };
        let (lhs, rhs) = self.destructure(&target, combined)?;
        out.push(build::assign(vec![lhs], rhs, loc));
        Ok(out)
    }

    /// Emit the statements binding one target to `value`.
    pub(crate) fn assign_target(
        &mut self,
        target: &Expr,
        value: Expr,
        loc: Location,
        out: &mut Vec<Stmt>,
    ) -> RewriteResult<()> {
        match &target.kind {
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => {
                let target = self.stabilize(target, out)?;
                let (lhs, rhs) = self.destructure(&target, value)?;
                out.push(build::assign(vec![lhs], rhs, loc));
            }
            ExprKind::Tuple { .. } | ExprKind::List { .. } if targets_access(target) => {
                let mut deferred = Vec::new();
                let unpack = self.split_unpacking(target, &mut deferred);
                out.push(build::assign(vec![unpack], value, loc));
                for (access, temp) in deferred {
                    let temp = build::name(temp, access.loc);
                    self.assign_target(&access, temp, loc, out)?;
                }
            }
            _ => out.push(build::assign(vec![target.clone()], value, loc)),
        }
        Ok(())
    }

    /// Replace access elements of an unpacking target with fresh names,
    /// recording each (access, name) pair to assign afterwards.
    fn split_unpacking(&mut self, target: &Expr, deferred: &mut Vec<(Expr, String)>) -> Expr {
        let kind = match &target.kind {
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => {
                let temp = self.names.fresh("item");
                deferred.push((target.clone(), temp.clone()));
                return build::store(temp, target.loc);
            }
            ExprKind::Tuple { elts, .. } => ExprKind::Tuple {
                elts: elts
                    .iter()
                    .map(|e| self.split_unpacking(e, deferred))
                    .collect(),
                ctx: ExprContext::Store,
            },
            ExprKind::List { elts, .. } => ExprKind::List {
                elts: elts
                    .iter()
                    .map(|e| self.split_unpacking(e, deferred))
                    .collect(),
                ctx: ExprContext::Store,
            },
            ExprKind::Starred { value, .. } => ExprKind::Starred {
                value: Box::new(self.split_unpacking(value, deferred)),
                ctx: ExprContext::Store,
            },
            _ => return target.as_target(ExprContext::Store),
        };
        Expr::new(kind, target.loc)
    }

    /// Bind `value` to a fresh temporary, returning a read of it.
    pub(crate) fn hoist(&mut self, value: Expr, hint: &str, out: &mut Vec<Stmt>) -> Expr {
        let temp = self.names.fresh(hint);
        let loc = value.loc;
        debug!(%loc, temp = %temp, "hoisted into temporary");
        out.push(build::assign(vec![build::store(temp.clone(), loc)], value, loc));
        build::name(temp, loc)
    }

    /// A copy of an access chain that is safe to read repeatedly.
    ///
    /// The root becomes a temporary unless it is a plain name; effectful
    /// indices become temporaries holding their normalized value. Hoisting
    /// follows evaluation order: root first, then each index outward.
    pub(crate) fn stabilize(&mut self, expr: &Expr, out: &mut Vec<Stmt>) -> RewriteResult<Expr> {
        let kind = match &expr.kind {
            ExprKind::Name { id, .. } => return Ok(build::name(id.clone(), expr.loc)),
            ExprKind::Attribute { value, attr, .. } => ExprKind::Attribute {
                value: Box::new(self.stabilize(value, out)?),
                attr: attr.clone(),
                ctx: ExprContext::Load,
            },
            ExprKind::Subscript { value, slice, .. } => {
                let value = self.stabilize(value, out)?;
                let slice = self.rewrite_expr(slice)?;
                let slice = if has_side_effects(&slice) {
                    let normalized = normalize(&mut self.names, self.config, &slice)?;
                    self.hoist(normalized, "index", out)
                } else {
                    slice
                };
                ExprKind::Subscript {
                    value: Box::new(value),
                    slice: Box::new(slice),
                    ctx: ExprContext::Load,
                }
            }
            _ => {
                let root = self.rewrite_expr(expr)?;
                return Ok(self.hoist(root, "subject", out));
            }
        };
        Ok(Expr::new(kind, expr.loc))
    }

    /// Peel `lhs` from the outside in, wrapping `rhs` in one evolve call per
    /// access. Returns the root to assign and the value to assign it.
    pub(crate) fn destructure(&mut self, lhs: &Expr, rhs: Expr) -> RewriteResult<(Expr, Expr)> {
        match &lhs.kind {
            ExprKind::Attribute { value, attr, .. } => {
                let args = vec![value.as_load(), build::string(attr.clone(), lhs.loc), rhs];
                let call = self
                    .names
                    .call_external(&self.config.runtime.set_attr, args, Vec::new(), lhs.loc);
                self.destructure(value, call)
            }
            ExprKind::Subscript { value, slice, .. } => {
                let index = normalize(&mut self.names, self.config, slice)?;
                let args = vec![value.as_load(), index, rhs];
                let call = self.names.call_external(
                    &self.config.runtime.set_subscript,
                    args,
                    Vec::new(),
                    lhs.loc,
                );
                self.destructure(value, call)
            }
            _ => Ok((lhs.as_target(ExprContext::Store), rhs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pyrmute_core::render::to_source;
    use pyrmute_core::{build, Config, Expr, ExprKind, Location, Module, Operator, Stmt, StmtKind};

    use crate::transformer::rewrite;

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn name(id: &str) -> Expr {
        build::name(id, loc())
    }

    fn call(func: &str, args: Vec<Expr>) -> Expr {
        name(func).call(args, Vec::new())
    }

    /// Rewrite with an empty prefix-free config and render without imports.
    fn body_source(stmts: Vec<Stmt>) -> String {
        let out = rewrite(&Module::new(stmts), &Config::default()).unwrap();
        let body: Vec<Stmt> = out
            .body
            .into_iter()
            .filter(|s| !matches!(s.kind, StmtKind::ImportFrom { .. }))
            .collect();
        to_source(&Module::new(body))
    }

    fn assign(targets: Vec<Expr>, value: Expr) -> Stmt {
        build::assign(targets, value, loc())
    }

    #[test]
    fn attribute_chain_evolves_from_root() {
        let stmt = assign(vec![name("a").attr("b").attr("c")], name("v"));
        assert_eq!(
            body_source(vec![stmt]),
            "a = _set_attr_with_fallback(a, 'b', _set_attr_with_fallback(a.b, 'c', v))\n"
        );
    }

    #[test]
    fn subscript_and_slice_targets() {
        let stmt = assign(vec![name("m").index(build::string("c", loc()))], build::string("d", loc()));
        assert_eq!(
            body_source(vec![stmt]),
            "m = _set_subscript_with_fallback(m, 'c', 'd')\n"
        );

        let slice = build::slice(None, Some(build::int(5, loc())), None, loc());
        let stmt = assign(vec![name("x").index(slice)], name("v"));
        assert_eq!(
            body_source(vec![stmt]),
            "x = _set_subscript_with_fallback(x, _slice(None, 5, None), v)\n"
        );
    }

    #[test]
    fn plain_targets_pass_through() {
        let stmt = assign(vec![name("x")], name("y"));
        assert_eq!(body_source(vec![stmt]), "x = y\n");
    }

    #[test]
    fn multiple_targets_share_one_value() {
        let value = build::name("x", loc()).attr("y");
        let stmt = assign(vec![name("a").attr("b"), name("c")], value);
        assert_eq!(
            body_source(vec![stmt]),
            "_value = x.y\n\
             a = _set_attr_with_fallback(a, 'b', _value)\n\
             c = _value\n"
        );
    }

    #[test]
    fn effectful_value_is_evaluated_first() {
        let stmt = assign(vec![name("a").attr("b")], call("f", Vec::new()));
        assert_eq!(
            body_source(vec![stmt]),
            "_value = f()\na = _set_attr_with_fallback(a, 'b', _value)\n"
        );

        // A plain target needs no temporary.
        let stmt = assign(vec![name("a")], call("f", Vec::new()));
        assert_eq!(body_source(vec![stmt]), "a = f()\n");
    }

    #[test]
    fn effectful_root_is_evaluated_once() {
        let target = name("obj").method("compute_and_mutate", Vec::new()).attr("attr");
        let stmt = assign(vec![target], build::int(5, loc()));
        assert_eq!(
            body_source(vec![stmt]),
            "_subject = obj.compute_and_mutate()\n\
             _subject = _set_attr_with_fallback(_subject, 'attr', 5)\n"
        );
    }

    #[test]
    fn effectful_index_is_hoisted() {
        let target = name("a").index(call("i", Vec::new())).attr("b");
        let stmt = assign(vec![target], name("v"));
        assert_eq!(
            body_source(vec![stmt]),
            "_value = v\n\
             _index = i()\n\
             a = _set_subscript_with_fallback(a, _index, _set_attr_with_fallback(a[_index], 'b', _value))\n"
        );
    }

    #[test]
    fn value_is_read_before_effectful_target() {
        let stmt = assign(vec![call("f", Vec::new()).attr("attr")], name("y"));
        assert_eq!(
            body_source(vec![stmt]),
            "_value = y\n\
             _subject = f()\n\
             _subject = _set_attr_with_fallback(_subject, 'attr', _value)\n"
        );
    }

    #[test]
    fn augmented_assignment_degrades() {
        let aug = |target: Expr, value: Expr| {
            Stmt::new(
                StmtKind::AugAssign {
                    target,
                    op: Operator::Add,
                    value,
                },
                loc(),
            )
        };
        assert_eq!(
            body_source(vec![aug(name("x"), build::int(1, loc()))]),
            "x = x + 1\n"
        );
        assert_eq!(
            body_source(vec![aug(name("a").attr("n"), build::int(1, loc()))]),
            "a = _set_attr_with_fallback(a, 'n', a.n + 1)\n"
        );
        assert_eq!(
            body_source(vec![aug(name("a").attr("n"), call("g", Vec::new()))]),
            "_value = a.n + g()\na = _set_attr_with_fallback(a, 'n', _value)\n"
        );
    }

    #[test]
    fn unpacking_into_access_targets() {
        let target = build::tuple(vec![name("a").attr("x"), name("b")], loc());
        let stmt = assign(vec![target], name("pair"));
        assert_eq!(
            body_source(vec![stmt]),
            "(_item, b) = pair\na = _set_attr_with_fallback(a, 'x', _item)\n"
        );
    }

    #[test]
    fn synthesized_nodes_keep_locations() {
        let at = Location::new(9, 4);
        let target = build::name("a", at).attr("b");
        let stmt = build::assign(vec![target], build::int(1, at), at);
        let out = rewrite(&Module::new(vec![stmt]), &Config::default()).unwrap();
        let last = out.body.last().unwrap();
        assert_eq!(last.loc, at);
        match &last.kind {
            StmtKind::Assign { value, .. } => {
                assert_eq!(value.loc, at);
                assert!(matches!(value.kind, ExprKind::Call { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
