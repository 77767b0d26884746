// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Side-effect classification for expressions.

use pyrmute_core::{walk_node, Expr, ExprKind, NodeRef, VisitResult, Visitor};

#[derive(Default)]
struct EffectFinder {
    found: bool,
}

impl<'a> Visitor<'a> for EffectFinder {
    fn visit_expr(&mut self, node: &'a Expr) -> VisitResult {
        match node.kind {
            ExprKind::Call { .. }
            | ExprKind::Await { .. }
            | ExprKind::Yield { .. }
            | ExprKind::YieldFrom { .. }
            | ExprKind::NamedExpr { .. }
            | ExprKind::ListComp { .. }
            | ExprKind::SetComp { .. }
            | ExprKind::DictComp { .. }
            | ExprKind::GeneratorExp { .. } => {
                self.found = true;
                VisitResult::Stop
            }
            _ => VisitResult::Continue,
        }
    }
}

/// True when evaluating `expr` may run user code or rebind a name.
///
/// Attribute and subscript reads count as pure; the rewrite re-reads access
/// paths anyway.
pub fn has_side_effects(expr: &Expr) -> bool {
    let mut finder = EffectFinder::default();
    walk_node(&mut finder, NodeRef::Expr(expr));
    finder.found
}

/// A bare name or constant, safe to repeat verbatim.
pub fn is_trivial(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Name { .. } | ExprKind::Constant { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{build, Location};

    #[test]
    fn classifies_expressions() {
        let loc = Location::new(1, 0);
        assert!(!has_side_effects(&build::name("a", loc).attr("b").index(build::int(0, loc))));
        assert!(!has_side_effects(&build::slice(None, Some(build::int(5, loc)), None, loc)));
        assert!(has_side_effects(&build::name("f", loc).call(Vec::new(), Vec::new())));
        assert!(has_side_effects(
            &build::name("a", loc).index(build::name("f", loc).call(Vec::new(), Vec::new()))
        ));
        assert!(is_trivial(&build::int(3, loc)));
        assert!(!is_trivial(&build::name("a", loc).attr("b")));
    }
}
