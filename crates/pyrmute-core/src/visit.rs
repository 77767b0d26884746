// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only traversal over a tree.
//!
//! Implement [`Visitor`] and override only the hooks you need, then call
//! [`walk_module`] or [`walk_node`]. The walker descends through
//! [`NodeRef::fields`], so every node kind is covered without per-kind walk
//! functions.

use crate::ast::{Alias, Comprehension, ExceptHandler, Expr, Keyword, Module, Param, Stmt};
use crate::node::{FieldRef, NodeRef};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children, then call `leave_*`.
    #[default]
    Continue,
    /// Skip children; `leave_*` is still called.
    SkipChildren,
    /// Stop traversal entirely. No further hooks are called.
    Stop,
}

/// Read-only visitor.
///
/// Each `visit_*` hook runs before the node's children, each `leave_*` hook
/// after. Nodes without a dedicated hook are only seen by
/// [`Visitor::visit_other`].
#[allow(unused_variables)]
pub trait Visitor<'a> {
    fn visit_module(&mut self, node: &'a Module) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_module(&mut self, node: &'a Module) {}

    fn visit_stmt(&mut self, node: &'a Stmt) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_stmt(&mut self, node: &'a Stmt) {}

    fn visit_expr(&mut self, node: &'a Expr) -> VisitResult {
        VisitResult::Continue
    }
    fn leave_expr(&mut self, node: &'a Expr) {}

    fn visit_alias(&mut self, node: &'a Alias) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_param(&mut self, node: &'a Param) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_keyword(&mut self, node: &'a Keyword) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_comprehension(&mut self, node: &'a Comprehension) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_except_handler(&mut self, node: &'a ExceptHandler) -> VisitResult {
        VisitResult::Continue
    }

    /// Called for with-items and dict entries.
    fn visit_other(&mut self, node: NodeRef<'a>) -> VisitResult {
        VisitResult::Continue
    }
}

/// Walk a whole module. Returns `VisitResult::Stop` if the visitor stopped.
pub fn walk_module<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, module: &'a Module) -> VisitResult {
    walk_node(visitor, NodeRef::Module(module))
}

/// Walk one node and its descendants in field order.
pub fn walk_node<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, node: NodeRef<'a>) -> VisitResult {
    let result = match node {
        NodeRef::Module(module) => visitor.visit_module(module),
        NodeRef::Stmt(stmt) => visitor.visit_stmt(stmt),
        NodeRef::Expr(expr) => visitor.visit_expr(expr),
        NodeRef::Alias(alias) => visitor.visit_alias(alias),
        NodeRef::Param(param) => visitor.visit_param(param),
        NodeRef::Keyword(keyword) => visitor.visit_keyword(keyword),
        NodeRef::Comprehension(comp) => visitor.visit_comprehension(comp),
        NodeRef::ExceptHandler(handler) => visitor.visit_except_handler(handler),
        NodeRef::WithItem(_) | NodeRef::DictEntry(_) => visitor.visit_other(node),
    };
    if result == VisitResult::Stop {
        return VisitResult::Stop;
    }

    if result == VisitResult::Continue {
        for (_, field) in node.fields() {
            if walk_field(visitor, field) == VisitResult::Stop {
                return VisitResult::Stop;
            }
        }
    }

    match node {
        NodeRef::Module(module) => visitor.leave_module(module),
        NodeRef::Stmt(stmt) => visitor.leave_stmt(stmt),
        NodeRef::Expr(expr) => visitor.leave_expr(expr),
        _ => {}
    }
    VisitResult::Continue
}

fn walk_field<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, field: FieldRef<'a>) -> VisitResult {
    match field {
        FieldRef::Node(child) => walk_node(visitor, child),
        FieldRef::Seq(seq) => {
            for item in seq.iter() {
                if walk_field(visitor, item) == VisitResult::Stop {
                    return VisitResult::Stop;
                }
            }
            VisitResult::Continue
        }
        FieldRef::Leaf(_) | FieldRef::Absent => VisitResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, Location};
    use crate::build;

    #[derive(Default)]
    struct NameCounter {
        names: Vec<String>,
        left: usize,
    }

    impl<'a> Visitor<'a> for NameCounter {
        fn visit_expr(&mut self, node: &'a Expr) -> VisitResult {
            if let ExprKind::Name { id, .. } = &node.kind {
                self.names.push(id.clone());
            }
            VisitResult::Continue
        }

        fn leave_expr(&mut self, _node: &'a Expr) {
            self.left += 1;
        }
    }

    fn sample() -> Module {
        let loc = Location::new(1, 0);
        Module::new(vec![
            build::assign(
                vec![build::name("a", loc).attr("b").as_target(crate::ast::ExprContext::Store)],
                build::name("c", loc),
                loc,
            ),
            build::expr_stmt(build::name("d", loc).call(Vec::new(), Vec::new()), loc),
        ])
    }

    #[test]
    fn walks_in_field_order() {
        let module = sample();
        let mut counter = NameCounter::default();
        assert_eq!(walk_module(&mut counter, &module), VisitResult::Continue);
        assert_eq!(counter.names, vec!["a", "c", "d"]);
        assert_eq!(counter.left, 5);
    }

    struct StopAtSecond {
        seen: usize,
    }

    impl<'a> Visitor<'a> for StopAtSecond {
        fn visit_expr(&mut self, node: &'a Expr) -> VisitResult {
            if node.as_name().is_some() {
                self.seen += 1;
                if self.seen == 2 {
                    return VisitResult::Stop;
                }
            }
            VisitResult::Continue
        }
    }

    #[test]
    fn stop_halts_traversal() {
        let module = sample();
        let mut visitor = StopAtSecond { seen: 0 };
        assert_eq!(walk_module(&mut visitor, &module), VisitResult::Stop);
        assert_eq!(visitor.seen, 2);
    }

    struct SkipStatements {
        stmts: usize,
        exprs: usize,
    }

    impl<'a> Visitor<'a> for SkipStatements {
        fn visit_stmt(&mut self, _node: &'a Stmt) -> VisitResult {
            VisitResult::SkipChildren
        }

        fn leave_stmt(&mut self, _node: &'a Stmt) {
            self.stmts += 1;
        }

        fn visit_expr(&mut self, _node: &'a Expr) -> VisitResult {
            self.exprs += 1;
            VisitResult::Continue
        }
    }

    #[test]
    fn skip_children_still_leaves() {
        let module = sample();
        let mut visitor = SkipStatements { stmts: 0, exprs: 0 };
        walk_module(&mut visitor, &module);
        assert_eq!(visitor.stmts, 2);
        assert_eq!(visitor.exprs, 0);
    }
}
