// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural pattern matching with captures.
//!
//! A [`Pattern`] mirrors the shape of a tree fragment. Positions holding a
//! [`Pattern::Capture`] match anything and record what they saw; every other
//! position must match exactly:
//!
//! - a node pattern requires the same kind, then matches each named field
//!   (fields the pattern does not name are unconstrained)
//! - a sequence pattern requires a sequence of exactly the same length
//! - a leaf pattern requires an equal leaf value
//!
//! Patterns are compiled into a [`Matcher`] first. Compilation rejects a
//! pattern that reuses a capture name or names a field its node kind lacks,
//! so a successful match always binds every capture exactly once.
//!
//! ```ignore
//! let matcher = Matcher::new(
//!     Pattern::node(NodeKind::Call)
//!         .field("func", Pattern::node(NodeKind::Attribute)
//!             .field("value", Pattern::capture("subject"))
//!             .field("attr", Pattern::capture("method")))
//!         .field("args", Pattern::capture("args")),
//! )?;
//! if let Some(captures) = matcher.match_expr(&expr) { ... }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use pyrmute_core::{
    BoolOperator, CmpOperator, Constant, Expr, ExprContext, FieldRef, Keyword, Leaf, NodeKind,
    NodeRef, Operator, ParamKind, SeqRef, UnaryOperator,
};
use tracing::trace;

use crate::error::PatternError;

// ============================================================================
// Patterns
// ============================================================================

/// An owned leaf value to compare against a [`Leaf`].
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Ident(String),
    Constant(Constant),
    Flag(bool),
    Level(u32),
    Context(ExprContext),
    Operator(Operator),
    BoolOperator(BoolOperator),
    UnaryOperator(UnaryOperator),
    CmpOperator(CmpOperator),
    ParamKind(ParamKind),
}

impl LeafValue {
    fn matches(&self, leaf: &Leaf<'_>) -> bool {
        match (self, leaf) {
            (LeafValue::Ident(a), Leaf::Ident(b)) => a == b,
            (LeafValue::Constant(a), Leaf::Constant(b)) => a == *b,
            (LeafValue::Flag(a), Leaf::Flag(b)) => a == b,
            (LeafValue::Level(a), Leaf::Level(b)) => a == b,
            (LeafValue::Context(a), Leaf::Context(b)) => a == b,
            (LeafValue::Operator(a), Leaf::Operator(b)) => a == b,
            (LeafValue::BoolOperator(a), Leaf::BoolOperator(b)) => a == b,
            (LeafValue::UnaryOperator(a), Leaf::UnaryOperator(b)) => a == b,
            (LeafValue::CmpOperator(a), Leaf::CmpOperator(b)) => a == b,
            (LeafValue::ParamKind(a), Leaf::ParamKind(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Matches anything and binds it to the name.
    Capture(String),
    /// Matches a node of `kind` whose named fields match.
    Node {
        kind: NodeKind,
        fields: Vec<(String, Pattern)>,
    },
    /// Matches a sequence of exactly this length, element-wise.
    Seq(Vec<Pattern>),
    /// Matches an equal leaf value.
    Leaf(LeafValue),
    /// Matches an absent optional field.
    Absent,
}

impl Pattern {
    pub fn capture(name: impl Into<String>) -> Self {
        Pattern::Capture(name.into())
    }

    pub fn node(kind: NodeKind) -> Self {
        Pattern::Node {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn ident(value: impl Into<String>) -> Self {
        Pattern::Leaf(LeafValue::Ident(value.into()))
    }

    /// Constrain one field of a node pattern.
    ///
    /// Only node patterns have fields; calling this on any other pattern is
    /// a construction bug and asserts in debug builds.
    pub fn field(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        let name: String = name.into();
        debug_assert!(
            matches!(self, Pattern::Node { .. }),
            "field '{}' on non-node pattern {:?}",
            name,
            self
        );
        if let Pattern::Node { fields, .. } = &mut self {
            fields.push((name, pattern));
        }
        self
    }

    /// Every capture name in this pattern, in pre-order.
    pub fn capture_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_captures(&mut names);
        names
    }

    fn collect_captures<'p>(&'p self, names: &mut Vec<&'p str>) {
        match self {
            Pattern::Capture(name) => names.push(name),
            Pattern::Node { fields, .. } => {
                for (_, sub) in fields {
                    sub.collect_captures(names);
                }
            }
            Pattern::Seq(items) => {
                for item in items {
                    item.collect_captures(names);
                }
            }
            Pattern::Leaf(_) | Pattern::Absent => {}
        }
    }

    fn validate(&self, seen: &mut BTreeSet<String>) -> Result<(), PatternError> {
        match self {
            Pattern::Capture(name) => {
                if !seen.insert(name.clone()) {
                    return Err(PatternError::DuplicateCapture(name.clone()));
                }
            }
            Pattern::Node { kind, fields } => {
                for (field, sub) in fields {
                    if !kind.has_field(field) {
                        return Err(PatternError::UnknownField {
                            kind: *kind,
                            field: field.clone(),
                        });
                    }
                    sub.validate(seen)?;
                }
            }
            Pattern::Seq(items) => {
                for item in items {
                    item.validate(seen)?;
                }
            }
            Pattern::Leaf(_) | Pattern::Absent => {}
        }
        Ok(())
    }
}

// ============================================================================
// Captures
// ============================================================================

/// What a successful match bound, keyed by capture name.
#[derive(Debug, Clone, Default)]
pub struct Captures<'a> {
    bound: BTreeMap<String, FieldRef<'a>>,
}

impl<'a> Captures<'a> {
    pub fn get(&self, name: &str) -> Option<FieldRef<'a>> {
        self.bound.get(name).copied()
    }

    pub fn expr(&self, name: &str) -> Option<&'a Expr> {
        match self.get(name)? {
            FieldRef::Node(NodeRef::Expr(expr)) => Some(expr),
            _ => None,
        }
    }

    pub fn exprs(&self, name: &str) -> Option<&'a [Expr]> {
        match self.get(name)? {
            FieldRef::Seq(SeqRef::Exprs(items)) => Some(items),
            _ => None,
        }
    }

    pub fn keywords(&self, name: &str) -> Option<&'a [Keyword]> {
        match self.get(name)? {
            FieldRef::Seq(SeqRef::Keywords(items)) => Some(items),
            _ => None,
        }
    }

    pub fn ident(&self, name: &str) -> Option<&'a str> {
        match self.get(name)? {
            FieldRef::Leaf(Leaf::Ident(ident)) => Some(ident),
            _ => None,
        }
    }

    /// Bound capture names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.bound.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// A validated pattern, ready to match.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Pattern,
}

impl Matcher {
    pub fn new(pattern: Pattern) -> Result<Self, PatternError> {
        pattern.validate(&mut BTreeSet::new())?;
        Ok(Matcher { pattern })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn match_expr<'a>(&self, expr: &'a Expr) -> Option<Captures<'a>> {
        self.match_node(NodeRef::Expr(expr))
    }

    pub fn match_node<'a>(&self, node: NodeRef<'a>) -> Option<Captures<'a>> {
        self.match_field(FieldRef::Node(node))
    }

    /// Match any field value. A fresh capture map is built per attempt and
    /// dropped on failure.
    pub fn match_field<'a>(&self, field: FieldRef<'a>) -> Option<Captures<'a>> {
        let mut captures = Captures::default();
        if match_into(&self.pattern, field, &mut captures.bound) {
            trace!(captures = ?captures.names(), "pattern matched");
            Some(captures)
        } else {
            trace!("pattern did not match");
            None
        }
    }
}

fn match_into<'a>(
    pattern: &Pattern,
    field: FieldRef<'a>,
    bound: &mut BTreeMap<String, FieldRef<'a>>,
) -> bool {
    match pattern {
        Pattern::Capture(name) => {
            bound.insert(name.clone(), field);
            true
        }
        Pattern::Node { kind, fields } => match field {
            FieldRef::Node(node) if node.kind() == *kind => fields.iter().all(|(name, sub)| {
                node.field(name)
                    .is_some_and(|child| match_into(sub, child, bound))
            }),
            _ => false,
        },
        Pattern::Seq(items) => match field {
            FieldRef::Seq(seq) if seq.len() == items.len() => {
                items.iter().enumerate().all(|(i, sub)| {
                    seq.get(i)
                        .is_some_and(|child| match_into(sub, child, bound))
                })
            }
            _ => false,
        },
        Pattern::Leaf(value) => match field {
            FieldRef::Leaf(leaf) => value.matches(&leaf),
            _ => false,
        },
        Pattern::Absent => matches!(field, FieldRef::Absent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{build, Location};

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn method_call() -> Pattern {
        Pattern::node(NodeKind::Call)
            .field(
                "func",
                Pattern::node(NodeKind::Attribute)
                    .field("value", Pattern::capture("subject"))
                    .field("attr", Pattern::capture("method")),
            )
            .field("args", Pattern::capture("args"))
            .field("keywords", Pattern::capture("kwargs"))
    }

    #[test]
    fn captures_method_call_parts() {
        let matcher = Matcher::new(method_call()).unwrap();
        let expr = build::name("v", loc()).method("append", vec![build::int(1, loc())]);
        let captures = matcher.match_expr(&expr).unwrap();
        assert_eq!(captures.expr("subject").and_then(Expr::as_name), Some("v"));
        assert_eq!(captures.ident("method"), Some("append"));
        assert_eq!(captures.exprs("args").map(<[Expr]>::len), Some(1));
        assert_eq!(captures.keywords("kwargs").map(<[Keyword]>::len), Some(0));
    }

    #[test]
    fn capture_keys_equal_pattern_captures() {
        let pattern = method_call();
        let matcher = Matcher::new(pattern.clone()).unwrap();
        let expr = build::name("a", loc())
            .attr("b")
            .method("pop", Vec::new());
        let captures = matcher.match_expr(&expr).unwrap();
        let mut expected = pattern.capture_names();
        expected.sort_unstable();
        assert_eq!(captures.names(), expected);
    }

    #[test]
    fn kind_mismatch_fails() {
        let matcher = Matcher::new(method_call()).unwrap();
        let plain_call = build::name("f", loc()).call(Vec::new(), Vec::new());
        assert!(matcher.match_expr(&plain_call).is_none());
        assert!(matcher.match_expr(&build::name("f", loc())).is_none());
    }

    #[test]
    fn sequence_length_must_match() {
        let pattern = Pattern::node(NodeKind::Call).field(
            "args",
            Pattern::Seq(vec![Pattern::capture("first"), Pattern::capture("second")]),
        );
        let matcher = Matcher::new(pattern).unwrap();
        let two = build::name("f", loc()).call(
            vec![build::int(1, loc()), build::int(2, loc())],
            Vec::new(),
        );
        let three = build::name("f", loc()).call(
            vec![build::int(1, loc()), build::int(2, loc()), build::int(3, loc())],
            Vec::new(),
        );
        let captures = matcher.match_expr(&two).unwrap();
        assert_eq!(captures.len(), 2);
        assert!(matcher.match_expr(&three).is_none());
    }

    #[test]
    fn leaf_values_compare_by_value() {
        let pattern = Pattern::node(NodeKind::Attribute)
            .field("attr", Pattern::ident("append"))
            .field("ctx", Pattern::Leaf(LeafValue::Context(ExprContext::Load)));
        let matcher = Matcher::new(pattern).unwrap();
        assert!(matcher.match_expr(&build::name("v", loc()).attr("append")).is_some());
        assert!(matcher.match_expr(&build::name("v", loc()).attr("extend")).is_none());
        let store = build::name("v", loc())
            .attr("append")
            .as_target(ExprContext::Store);
        assert!(matcher.match_expr(&store).is_none());
    }

    #[test]
    fn literal_subpatterns() {
        let pattern = Pattern::node(NodeKind::Subscript).field(
            "slice",
            Pattern::node(NodeKind::Slice)
                .field("lower", Pattern::Absent)
                .field("upper", Pattern::capture("upper")),
        );
        let matcher = Matcher::new(pattern).unwrap();
        let open = build::name("x", loc()).index(build::slice(
            None,
            Some(build::int(5, loc())),
            None,
            loc(),
        ));
        let closed = build::name("x", loc()).index(build::slice(
            Some(build::int(1, loc())),
            Some(build::int(5, loc())),
            None,
            loc(),
        ));
        assert!(matcher.match_expr(&open).is_some());
        assert!(matcher.match_expr(&closed).is_none());
    }

    #[test]
    fn no_partial_captures_on_failure() {
        // `subject` would bind before `attr` fails.
        let pattern = Pattern::node(NodeKind::Attribute)
            .field("value", Pattern::capture("subject"))
            .field("attr", Pattern::ident("never"));
        let matcher = Matcher::new(pattern).unwrap();
        assert!(matcher.match_expr(&build::name("a", loc()).attr("b")).is_none());
    }

    #[test]
    fn rejects_duplicate_capture() {
        let pattern = Pattern::node(NodeKind::BinOp)
            .field("left", Pattern::capture("x"))
            .field("right", Pattern::capture("x"));
        assert_eq!(
            Matcher::new(pattern).unwrap_err(),
            PatternError::DuplicateCapture("x".to_string())
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let pattern = Pattern::node(NodeKind::Name).field("attr", Pattern::capture("x"));
        assert!(matches!(
            Matcher::new(pattern),
            Err(PatternError::UnknownField { kind: NodeKind::Name, .. })
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-node pattern")]
    fn field_on_capture_asserts() {
        let _ = Pattern::capture("x").field("attr", Pattern::capture("y"));
    }
}
