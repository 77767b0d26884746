// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node constructors.
//!
//! Every constructor takes the location of the node being replaced, so
//! synthesized code reports the position of the source it came from.
//! Chaining helpers on [`Expr`] reuse the receiver's location.

use crate::ast::{
    Alias, Constant, DictEntry, Expr, ExprContext, ExprKind, Keyword, Location, Stmt, StmtKind,
};

// ============================================================================
// Expressions
// ============================================================================

pub fn name(id: impl Into<String>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Name {
            id: id.into(),
            ctx: ExprContext::Load,
        },
        loc,
    )
}

pub fn store(id: impl Into<String>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Name {
            id: id.into(),
            ctx: ExprContext::Store,
        },
        loc,
    )
}

pub fn constant(value: Constant, loc: Location) -> Expr {
    Expr::new(ExprKind::Constant { value }, loc)
}

pub fn string(value: impl Into<String>, loc: Location) -> Expr {
    constant(Constant::Str(value.into()), loc)
}

pub fn int(value: i64, loc: Location) -> Expr {
    constant(Constant::Int(value), loc)
}

pub fn none(loc: Location) -> Expr {
    constant(Constant::None, loc)
}

pub fn attribute(value: Expr, attr: impl Into<String>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Attribute {
            value: Box::new(value),
            attr: attr.into(),
            ctx: ExprContext::Load,
        },
        loc,
    )
}

pub fn subscript(value: Expr, index: Expr, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Subscript {
            value: Box::new(value),
            slice: Box::new(index),
            ctx: ExprContext::Load,
        },
        loc,
    )
}

pub fn call(func: Expr, args: Vec<Expr>, keywords: Vec<Keyword>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Call {
            func: Box::new(func),
            args,
            keywords,
        },
        loc,
    )
}

pub fn keyword(arg: Option<&str>, value: Expr, loc: Location) -> Keyword {
    Keyword {
        arg: arg.map(str::to_string),
        value,
        loc,
    }
}

pub fn tuple(elts: Vec<Expr>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::Tuple {
            elts,
            ctx: ExprContext::Load,
        },
        loc,
    )
}

pub fn list(elts: Vec<Expr>, loc: Location) -> Expr {
    Expr::new(
        ExprKind::List {
            elts,
            ctx: ExprContext::Load,
        },
        loc,
    )
}

pub fn set(elts: Vec<Expr>, loc: Location) -> Expr {
    Expr::new(ExprKind::Set { elts }, loc)
}

/// A mapping literal; a `None` key is a `**other` unpack.
pub fn dict(entries: Vec<(Option<Expr>, Expr)>, loc: Location) -> Expr {
    let entries = entries
        .into_iter()
        .map(|(key, value)| DictEntry { key, value })
        .collect();
    Expr::new(ExprKind::Dict { entries }, loc)
}

pub fn slice(
    lower: Option<Expr>,
    upper: Option<Expr>,
    step: Option<Expr>,
    loc: Location,
) -> Expr {
    Expr::new(
        ExprKind::Slice {
            lower: lower.map(Box::new),
            upper: upper.map(Box::new),
            step: step.map(Box::new),
        },
        loc,
    )
}

pub fn ext_slice(dims: Vec<Expr>, loc: Location) -> Expr {
    Expr::new(ExprKind::ExtSlice { dims }, loc)
}

impl Expr {
    /// `self.attr`
    pub fn attr(self, attr: impl Into<String>) -> Expr {
        let loc = self.loc;
        attribute(self, attr, loc)
    }

    /// `self[index]`
    pub fn index(self, index: Expr) -> Expr {
        let loc = self.loc;
        subscript(self, index, loc)
    }

    /// `self(args, keywords)`
    pub fn call(self, args: Vec<Expr>, keywords: Vec<Keyword>) -> Expr {
        let loc = self.loc;
        call(self, args, keywords, loc)
    }

    /// `self.method(args)`
    pub fn method(self, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.attr(method).call(args, Vec::new())
    }
}

// ============================================================================
// Statements
// ============================================================================

/// `t1 = t2 = value`; targets are switched to store context.
pub fn assign(targets: Vec<Expr>, value: Expr, loc: Location) -> Stmt {
    let targets = targets
        .iter()
        .map(|target| target.as_target(ExprContext::Store))
        .collect();
    Stmt::new(StmtKind::Assign { targets, value }, loc)
}

pub fn expr_stmt(value: Expr, loc: Location) -> Stmt {
    Stmt::new(StmtKind::Expr { value }, loc)
}

/// `del t1, t2`; targets are switched to delete context.
pub fn delete(targets: Vec<Expr>, loc: Location) -> Stmt {
    let targets = targets
        .iter()
        .map(|target| target.as_target(ExprContext::Del))
        .collect();
    Stmt::new(StmtKind::Delete { targets }, loc)
}

/// `from module import name as alias, ...`
pub fn import_from(module: &str, names: Vec<(String, Option<String>)>, loc: Location) -> Stmt {
    let names = names
        .into_iter()
        .map(|(name, asname)| Alias { name, asname, loc })
        .collect();
    Stmt::new(
        StmtKind::ImportFrom {
            module: Some(module.to_string()),
            names,
            level: 0,
        },
        loc,
    )
}
