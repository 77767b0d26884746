// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tree node types for a compilation unit.
//!
//! The node set is closed: every statement is a [`Stmt`] carrying a
//! [`StmtKind`], every expression an [`Expr`] carrying an [`ExprKind`]. Each
//! node owns its [`Location`], and synthesized nodes copy the location of the
//! node they replace.
//!
//! The tree serializes to JSON with serde so the external parser and compiler
//! can exchange it with this crate:
//!
//! ```ignore
//! {"kind": "Assign", "targets": [...], "value": {...}, "loc": {"line": 1, "col": 0}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Locations
// ============================================================================

/// Source position of a node (1-based line, 0-based column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl Location {
    /// Location given to synthesized statements that have no source node,
    /// such as injected imports.
    pub const START: Location = Location { line: 1, col: 0 };

    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Whether an expression is read, bound, or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExprContext {
    #[default]
    Load,
    Store,
    Del,
}

/// Literal constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mult => "*",
            Operator::MatMult => "@",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::FloorDiv => "//",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Invert,
    Not,
    UAdd,
    USub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOperator::Eq => "==",
            CmpOperator::NotEq => "!=",
            CmpOperator::Lt => "<",
            CmpOperator::LtE => "<=",
            CmpOperator::Gt => ">",
            CmpOperator::GtE => ">=",
            CmpOperator::Is => "is",
            CmpOperator::IsNot => "is not",
            CmpOperator::In => "in",
            CmpOperator::NotIn => "not in",
        }
    }
}

/// How a parameter binds its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParamKind {
    #[default]
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

// ============================================================================
// Module and statements
// ============================================================================

/// A compilation unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }

    /// Parse a tree produced by the external parser.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    pub loc: Location,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Location) -> Self {
        Self { kind, loc }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StmtKind {
    FunctionDef {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
        #[serde(default)]
        decorators: Vec<Expr>,
        #[serde(default)]
        is_async: bool,
    },
    ClassDef {
        name: String,
        #[serde(default)]
        bases: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
        body: Vec<Stmt>,
        #[serde(default)]
        decorators: Vec<Expr>,
    },
    Return {
        value: Option<Expr>,
    },
    Delete {
        targets: Vec<Expr>,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: Operator,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        is_async: bool,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        #[serde(default)]
        is_async: bool,
    },
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Try {
        body: Vec<Stmt>,
        #[serde(default)]
        handlers: Vec<ExceptHandler>,
        #[serde(default)]
        orelse: Vec<Stmt>,
        #[serde(default)]
        finalbody: Vec<Stmt>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Import {
        names: Vec<Alias>,
    },
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
        #[serde(default)]
        level: u32,
    },
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    Expr {
        value: Expr,
    },
    Pass,
    Break,
    Continue,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExprKind {
    BoolOp {
        op: BoolOperator,
        values: Vec<Expr>,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Dict {
        entries: Vec<DictEntry>,
    },
    Set {
        elts: Vec<Expr>,
    },
    List {
        elts: Vec<Expr>,
        #[serde(default)]
        ctx: ExprContext,
    },
    Tuple {
        elts: Vec<Expr>,
        #[serde(default)]
        ctx: ExprContext,
    },
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    Await {
        value: Box<Expr>,
    },
    Yield {
        value: Option<Box<Expr>>,
    },
    YieldFrom {
        value: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOperator>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        keywords: Vec<Keyword>,
    },
    Constant {
        value: Constant,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        #[serde(default)]
        ctx: ExprContext,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
        #[serde(default)]
        ctx: ExprContext,
    },
    Starred {
        value: Box<Expr>,
        #[serde(default)]
        ctx: ExprContext,
    },
    Name {
        id: String,
        #[serde(default)]
        ctx: ExprContext,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    /// A multi-dimensional subscript such as `x[1:2, 3]`.
    ExtSlice {
        dims: Vec<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    /// A copy of this expression that reads every position it used to bind.
    pub fn as_load(&self) -> Expr {
        self.as_target(ExprContext::Load)
    }

    /// A copy of this expression used as a binding or deletion target.
    ///
    /// The context lands on the outermost node and on the elements of
    /// unpacking targets; the objects an attribute or subscript is taken from
    /// are always read.
    pub fn as_target(&self, ctx: ExprContext) -> Expr {
        let mut expr = self.clone();
        expr.set_context(ctx);
        expr
    }

    fn set_context(&mut self, new_ctx: ExprContext) {
        match &mut self.kind {
            ExprKind::Name { ctx, .. } => *ctx = new_ctx,
            ExprKind::Attribute { value, ctx, .. } | ExprKind::Subscript { value, ctx, .. } => {
                *ctx = new_ctx;
                value.set_context(ExprContext::Load);
            }
            ExprKind::Starred { value, ctx } => {
                *ctx = new_ctx;
                value.set_context(new_ctx);
            }
            ExprKind::List { elts, ctx } | ExprKind::Tuple { elts, ctx } => {
                *ctx = new_ctx;
                for elt in elts {
                    elt.set_context(new_ctx);
                }
            }
            _ => {}
        }
    }

    /// True for `x.attr` and `x[index]`.
    pub fn is_access(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
        )
    }

    /// The identifier of a plain variable reference.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name { id, .. } => Some(id),
            _ => None,
        }
    }
}

// ============================================================================
// Auxiliary nodes
// ============================================================================

/// A keyword argument; `arg` is `None` for a `**mapping` unpack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
    pub loc: Location,
}

/// One name in an import statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
    pub loc: Location,
}

impl Alias {
    /// The local name this alias binds (`import a.b` binds `a`).
    pub fn bound_name(&self) -> &str {
        match &self.asname {
            Some(asname) => asname,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub kind: ParamKind,
    pub default: Option<Expr>,
    pub loc: Location,
}

/// One `for target in iter if cond` clause of a comprehension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    #[serde(default)]
    pub ifs: Vec<Expr>,
    #[serde(default)]
    pub is_async: bool,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithItem {
    pub context_expr: Expr,
    pub optional_vars: Option<Expr>,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    #[serde(rename = "type")]
    pub type_: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub loc: Location,
}

/// One `key: value` item of a mapping literal; `key` is `None` for `**other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub key: Option<Expr>,
    pub value: Expr,
}
