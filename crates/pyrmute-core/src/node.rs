// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Borrowed, field-addressable views over tree nodes.
//!
//! Structural matching and generic traversal need to look at any node as
//! "a kind plus an ordered list of named fields". [`NodeRef`] provides that
//! view without copying: every field is either a child node, an ordered
//! sequence, an opaque [`Leaf`] value, or absent.
//!
//! Field lists are produced by exhaustive matches over the closed node kinds,
//! so adding a node kind fails to compile until its fields are described here.

use std::fmt;

use crate::ast::{
    Alias, BoolOperator, CmpOperator, Comprehension, Constant, DictEntry, ExceptHandler, Expr,
    ExprContext, ExprKind, Keyword, Location, Module, Operator, Param, ParamKind, Stmt, StmtKind,
    UnaryOperator, WithItem,
};

/// Every syntactic kind in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Module,
    // Statements
    FunctionDef,
    ClassDef,
    Return,
    Delete,
    Assign,
    AugAssign,
    AnnAssign,
    For,
    While,
    If,
    With,
    Raise,
    Try,
    Assert,
    Import,
    ImportFrom,
    Global,
    Nonlocal,
    ExprStmt,
    Pass,
    Break,
    Continue,
    // Expressions
    BoolOp,
    NamedExpr,
    BinOp,
    UnaryOp,
    Lambda,
    IfExp,
    Dict,
    Set,
    List,
    Tuple,
    ListComp,
    SetComp,
    DictComp,
    GeneratorExp,
    Await,
    Yield,
    YieldFrom,
    Compare,
    Call,
    Constant,
    Attribute,
    Subscript,
    Starred,
    Name,
    Slice,
    ExtSlice,
    // Auxiliary
    Keyword,
    Alias,
    Param,
    Comprehension,
    WithItem,
    ExceptHandler,
    DictEntry,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::FunctionDef => "FunctionDef",
            NodeKind::ClassDef => "ClassDef",
            NodeKind::Return => "Return",
            NodeKind::Delete => "Delete",
            NodeKind::Assign => "Assign",
            NodeKind::AugAssign => "AugAssign",
            NodeKind::AnnAssign => "AnnAssign",
            NodeKind::For => "For",
            NodeKind::While => "While",
            NodeKind::If => "If",
            NodeKind::With => "With",
            NodeKind::Raise => "Raise",
            NodeKind::Try => "Try",
            NodeKind::Assert => "Assert",
            NodeKind::Import => "Import",
            NodeKind::ImportFrom => "ImportFrom",
            NodeKind::Global => "Global",
            NodeKind::Nonlocal => "Nonlocal",
            NodeKind::ExprStmt => "Expr",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::BoolOp => "BoolOp",
            NodeKind::NamedExpr => "NamedExpr",
            NodeKind::BinOp => "BinOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Lambda => "Lambda",
            NodeKind::IfExp => "IfExp",
            NodeKind::Dict => "Dict",
            NodeKind::Set => "Set",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::ListComp => "ListComp",
            NodeKind::SetComp => "SetComp",
            NodeKind::DictComp => "DictComp",
            NodeKind::GeneratorExp => "GeneratorExp",
            NodeKind::Await => "Await",
            NodeKind::Yield => "Yield",
            NodeKind::YieldFrom => "YieldFrom",
            NodeKind::Compare => "Compare",
            NodeKind::Call => "Call",
            NodeKind::Constant => "Constant",
            NodeKind::Attribute => "Attribute",
            NodeKind::Subscript => "Subscript",
            NodeKind::Starred => "Starred",
            NodeKind::Name => "Name",
            NodeKind::Slice => "Slice",
            NodeKind::ExtSlice => "ExtSlice",
            NodeKind::Keyword => "keyword",
            NodeKind::Alias => "alias",
            NodeKind::Param => "param",
            NodeKind::Comprehension => "comprehension",
            NodeKind::WithItem => "withitem",
            NodeKind::ExceptHandler => "ExceptHandler",
            NodeKind::DictEntry => "DictEntry",
        }
    }

    /// Field names of this kind, in the order [`NodeRef::fields`] yields them.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            NodeKind::Module => &["body"],
            NodeKind::FunctionDef => &["name", "params", "body", "decorators", "is_async"],
            NodeKind::ClassDef => &["name", "bases", "keywords", "body", "decorators"],
            NodeKind::Return => &["value"],
            NodeKind::Delete => &["targets"],
            NodeKind::Assign => &["targets", "value"],
            NodeKind::AugAssign => &["target", "op", "value"],
            NodeKind::AnnAssign => &["target", "annotation", "value"],
            NodeKind::For => &["target", "iter", "body", "orelse", "is_async"],
            NodeKind::While => &["test", "body", "orelse"],
            NodeKind::If => &["test", "body", "orelse"],
            NodeKind::With => &["items", "body", "is_async"],
            NodeKind::Raise => &["exc", "cause"],
            NodeKind::Try => &["body", "handlers", "orelse", "finalbody"],
            NodeKind::Assert => &["test", "msg"],
            NodeKind::Import => &["names"],
            NodeKind::ImportFrom => &["module", "names", "level"],
            NodeKind::Global | NodeKind::Nonlocal => &["names"],
            NodeKind::ExprStmt => &["value"],
            NodeKind::Pass | NodeKind::Break | NodeKind::Continue => &[],
            NodeKind::BoolOp => &["op", "values"],
            NodeKind::NamedExpr => &["target", "value"],
            NodeKind::BinOp => &["left", "op", "right"],
            NodeKind::UnaryOp => &["op", "operand"],
            NodeKind::Lambda => &["params", "body"],
            NodeKind::IfExp => &["test", "body", "orelse"],
            NodeKind::Dict => &["entries"],
            NodeKind::Set => &["elts"],
            NodeKind::List | NodeKind::Tuple => &["elts", "ctx"],
            NodeKind::ListComp | NodeKind::SetComp | NodeKind::GeneratorExp => {
                &["elt", "generators"]
            }
            NodeKind::DictComp => &["key", "value", "generators"],
            NodeKind::Await | NodeKind::Yield | NodeKind::YieldFrom => &["value"],
            NodeKind::Compare => &["left", "ops", "comparators"],
            NodeKind::Call => &["func", "args", "keywords"],
            NodeKind::Constant => &["value"],
            NodeKind::Attribute => &["value", "attr", "ctx"],
            NodeKind::Subscript => &["value", "slice", "ctx"],
            NodeKind::Starred => &["value", "ctx"],
            NodeKind::Name => &["id", "ctx"],
            NodeKind::Slice => &["lower", "upper", "step"],
            NodeKind::ExtSlice => &["dims"],
            NodeKind::Keyword => &["arg", "value"],
            NodeKind::Alias => &["name", "asname"],
            NodeKind::Param => &["name", "kind", "default"],
            NodeKind::Comprehension => &["target", "iter", "ifs", "is_async"],
            NodeKind::WithItem => &["context_expr", "optional_vars"],
            NodeKind::ExceptHandler => &["type", "name", "body"],
            NodeKind::DictEntry => &["key", "value"],
        }
    }

    pub fn has_field(self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ExprKind {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            ExprKind::BoolOp { .. } => NodeKind::BoolOp,
            ExprKind::NamedExpr { .. } => NodeKind::NamedExpr,
            ExprKind::BinOp { .. } => NodeKind::BinOp,
            ExprKind::UnaryOp { .. } => NodeKind::UnaryOp,
            ExprKind::Lambda { .. } => NodeKind::Lambda,
            ExprKind::IfExp { .. } => NodeKind::IfExp,
            ExprKind::Dict { .. } => NodeKind::Dict,
            ExprKind::Set { .. } => NodeKind::Set,
            ExprKind::List { .. } => NodeKind::List,
            ExprKind::Tuple { .. } => NodeKind::Tuple,
            ExprKind::ListComp { .. } => NodeKind::ListComp,
            ExprKind::SetComp { .. } => NodeKind::SetComp,
            ExprKind::DictComp { .. } => NodeKind::DictComp,
            ExprKind::GeneratorExp { .. } => NodeKind::GeneratorExp,
            ExprKind::Await { .. } => NodeKind::Await,
            ExprKind::Yield { .. } => NodeKind::Yield,
            ExprKind::YieldFrom { .. } => NodeKind::YieldFrom,
            ExprKind::Compare { .. } => NodeKind::Compare,
            ExprKind::Call { .. } => NodeKind::Call,
            ExprKind::Constant { .. } => NodeKind::Constant,
            ExprKind::Attribute { .. } => NodeKind::Attribute,
            ExprKind::Subscript { .. } => NodeKind::Subscript,
            ExprKind::Starred { .. } => NodeKind::Starred,
            ExprKind::Name { .. } => NodeKind::Name,
            ExprKind::Slice { .. } => NodeKind::Slice,
            ExprKind::ExtSlice { .. } => NodeKind::ExtSlice,
        }
    }
}

impl StmtKind {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            StmtKind::FunctionDef { .. } => NodeKind::FunctionDef,
            StmtKind::ClassDef { .. } => NodeKind::ClassDef,
            StmtKind::Return { .. } => NodeKind::Return,
            StmtKind::Delete { .. } => NodeKind::Delete,
            StmtKind::Assign { .. } => NodeKind::Assign,
            StmtKind::AugAssign { .. } => NodeKind::AugAssign,
            StmtKind::AnnAssign { .. } => NodeKind::AnnAssign,
            StmtKind::For { .. } => NodeKind::For,
            StmtKind::While { .. } => NodeKind::While,
            StmtKind::If { .. } => NodeKind::If,
            StmtKind::With { .. } => NodeKind::With,
            StmtKind::Raise { .. } => NodeKind::Raise,
            StmtKind::Try { .. } => NodeKind::Try,
            StmtKind::Assert { .. } => NodeKind::Assert,
            StmtKind::Import { .. } => NodeKind::Import,
            StmtKind::ImportFrom { .. } => NodeKind::ImportFrom,
            StmtKind::Global { .. } => NodeKind::Global,
            StmtKind::Nonlocal { .. } => NodeKind::Nonlocal,
            StmtKind::Expr { .. } => NodeKind::ExprStmt,
            StmtKind::Pass => NodeKind::Pass,
            StmtKind::Break => NodeKind::Break,
            StmtKind::Continue => NodeKind::Continue,
        }
    }
}

/// An opaque leaf value stored in a node field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Ident(&'a str),
    Constant(&'a Constant),
    Flag(bool),
    Level(u32),
    Context(ExprContext),
    Operator(Operator),
    BoolOperator(BoolOperator),
    UnaryOperator(UnaryOperator),
    CmpOperator(CmpOperator),
    ParamKind(ParamKind),
}

/// A borrowed view of any tree node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    Keyword(&'a Keyword),
    Alias(&'a Alias),
    Param(&'a Param),
    Comprehension(&'a Comprehension),
    WithItem(&'a WithItem),
    ExceptHandler(&'a ExceptHandler),
    DictEntry(&'a DictEntry),
}

/// A borrowed ordered sequence held in a node field.
#[derive(Debug, Clone, Copy)]
pub enum SeqRef<'a> {
    Stmts(&'a [Stmt]),
    Exprs(&'a [Expr]),
    Keywords(&'a [Keyword]),
    Aliases(&'a [Alias]),
    Params(&'a [Param]),
    Comprehensions(&'a [Comprehension]),
    WithItems(&'a [WithItem]),
    Handlers(&'a [ExceptHandler]),
    Entries(&'a [DictEntry]),
    Idents(&'a [String]),
    CmpOps(&'a [CmpOperator]),
}

/// The content of one node field.
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Node(NodeRef<'a>),
    Seq(SeqRef<'a>),
    Leaf(Leaf<'a>),
    Absent,
}

impl<'a> SeqRef<'a> {
    pub fn len(&self) -> usize {
        match self {
            SeqRef::Stmts(items) => items.len(),
            SeqRef::Exprs(items) => items.len(),
            SeqRef::Keywords(items) => items.len(),
            SeqRef::Aliases(items) => items.len(),
            SeqRef::Params(items) => items.len(),
            SeqRef::Comprehensions(items) => items.len(),
            SeqRef::WithItems(items) => items.len(),
            SeqRef::Handlers(items) => items.len(),
            SeqRef::Entries(items) => items.len(),
            SeqRef::Idents(items) => items.len(),
            SeqRef::CmpOps(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<FieldRef<'a>> {
        let field = match *self {
            SeqRef::Stmts(items) => FieldRef::Node(NodeRef::Stmt(items.get(index)?)),
            SeqRef::Exprs(items) => FieldRef::Node(NodeRef::Expr(items.get(index)?)),
            SeqRef::Keywords(items) => FieldRef::Node(NodeRef::Keyword(items.get(index)?)),
            SeqRef::Aliases(items) => FieldRef::Node(NodeRef::Alias(items.get(index)?)),
            SeqRef::Params(items) => FieldRef::Node(NodeRef::Param(items.get(index)?)),
            SeqRef::Comprehensions(items) => {
                FieldRef::Node(NodeRef::Comprehension(items.get(index)?))
            }
            SeqRef::WithItems(items) => FieldRef::Node(NodeRef::WithItem(items.get(index)?)),
            SeqRef::Handlers(items) => FieldRef::Node(NodeRef::ExceptHandler(items.get(index)?)),
            SeqRef::Entries(items) => FieldRef::Node(NodeRef::DictEntry(items.get(index)?)),
            SeqRef::Idents(items) => FieldRef::Leaf(Leaf::Ident(items.get(index)?)),
            SeqRef::CmpOps(items) => FieldRef::Leaf(Leaf::CmpOperator(*items.get(index)?)),
        };
        Some(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldRef<'a>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

fn node(expr: &Expr) -> FieldRef<'_> {
    FieldRef::Node(NodeRef::Expr(expr))
}

fn opt_node(expr: Option<&Expr>) -> FieldRef<'_> {
    match expr {
        Some(expr) => node(expr),
        None => FieldRef::Absent,
    }
}

fn opt_ident(ident: Option<&String>) -> FieldRef<'_> {
    match ident {
        Some(ident) => FieldRef::Leaf(Leaf::Ident(ident)),
        None => FieldRef::Absent,
    }
}

fn ident(ident: &str) -> FieldRef<'_> {
    FieldRef::Leaf(Leaf::Ident(ident))
}

fn stmts(body: &[Stmt]) -> FieldRef<'_> {
    FieldRef::Seq(SeqRef::Stmts(body))
}

fn exprs(items: &[Expr]) -> FieldRef<'_> {
    FieldRef::Seq(SeqRef::Exprs(items))
}

fn comps(items: &[Comprehension]) -> FieldRef<'_> {
    FieldRef::Seq(SeqRef::Comprehensions(items))
}

fn flag<'a>(value: bool) -> FieldRef<'a> {
    FieldRef::Leaf(Leaf::Flag(value))
}

fn ctx<'a>(value: ExprContext) -> FieldRef<'a> {
    FieldRef::Leaf(Leaf::Context(value))
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Module(_) => NodeKind::Module,
            NodeRef::Stmt(stmt) => stmt.kind.node_kind(),
            NodeRef::Expr(expr) => expr.kind.node_kind(),
            NodeRef::Keyword(_) => NodeKind::Keyword,
            NodeRef::Alias(_) => NodeKind::Alias,
            NodeRef::Param(_) => NodeKind::Param,
            NodeRef::Comprehension(_) => NodeKind::Comprehension,
            NodeRef::WithItem(_) => NodeKind::WithItem,
            NodeRef::ExceptHandler(_) => NodeKind::ExceptHandler,
            NodeRef::DictEntry(_) => NodeKind::DictEntry,
        }
    }

    pub fn loc(&self) -> Location {
        match self {
            NodeRef::Module(_) => Location::START,
            NodeRef::Stmt(stmt) => stmt.loc,
            NodeRef::Expr(expr) => expr.loc,
            NodeRef::Keyword(keyword) => keyword.loc,
            NodeRef::Alias(alias) => alias.loc,
            NodeRef::Param(param) => param.loc,
            NodeRef::Comprehension(comp) => comp.loc,
            NodeRef::WithItem(item) => item.loc,
            NodeRef::ExceptHandler(handler) => handler.loc,
            NodeRef::DictEntry(entry) => entry.value.loc,
        }
    }

    /// Look up a single field by name.
    pub fn field(&self, name: &str) -> Option<FieldRef<'a>> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// All fields of this node, in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, FieldRef<'a>)> {
        match *self {
            NodeRef::Module(module) => vec![("body", FieldRef::Seq(SeqRef::Stmts(&module.body)))],
            NodeRef::Stmt(stmt) => stmt_fields(stmt),
            NodeRef::Expr(expr) => expr_fields(expr),
            NodeRef::Keyword(keyword) => vec![
                ("arg", opt_ident(keyword.arg.as_ref())),
                ("value", node(&keyword.value)),
            ],
            NodeRef::Alias(alias) => vec![
                ("name", ident(&alias.name)),
                ("asname", opt_ident(alias.asname.as_ref())),
            ],
            NodeRef::Param(param) => vec![
                ("name", ident(&param.name)),
                ("kind", FieldRef::Leaf(Leaf::ParamKind(param.kind))),
                ("default", opt_node(param.default.as_ref())),
            ],
            NodeRef::Comprehension(comp) => vec![
                ("target", node(&comp.target)),
                ("iter", node(&comp.iter)),
                ("ifs", FieldRef::Seq(SeqRef::Exprs(&comp.ifs))),
                ("is_async", flag(comp.is_async)),
            ],
            NodeRef::WithItem(item) => vec![
                ("context_expr", node(&item.context_expr)),
                ("optional_vars", opt_node(item.optional_vars.as_ref())),
            ],
            NodeRef::ExceptHandler(handler) => vec![
                ("type", opt_node(handler.type_.as_ref())),
                ("name", opt_ident(handler.name.as_ref())),
                ("body", FieldRef::Seq(SeqRef::Stmts(&handler.body))),
            ],
            NodeRef::DictEntry(entry) => vec![
                ("key", opt_node(entry.key.as_ref())),
                ("value", node(&entry.value)),
            ],
        }
    }
}

fn stmt_fields(stmt: &Stmt) -> Vec<(&'static str, FieldRef<'_>)> {
    match &stmt.kind {
        StmtKind::FunctionDef {
            name,
            params,
            body,
            decorators,
            is_async,
        } => vec![
            ("name", ident(name)),
            ("params", FieldRef::Seq(SeqRef::Params(params))),
            ("body", FieldRef::Seq(SeqRef::Stmts(body))),
            ("decorators", FieldRef::Seq(SeqRef::Exprs(decorators))),
            ("is_async", flag(*is_async)),
        ],
        StmtKind::ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
        } => vec![
            ("name", ident(name)),
            ("bases", FieldRef::Seq(SeqRef::Exprs(bases))),
            ("keywords", FieldRef::Seq(SeqRef::Keywords(keywords))),
            ("body", FieldRef::Seq(SeqRef::Stmts(body))),
            ("decorators", FieldRef::Seq(SeqRef::Exprs(decorators))),
        ],
        StmtKind::Return { value } => vec![("value", opt_node(value.as_ref()))],
        StmtKind::Delete { targets } => vec![("targets", exprs(targets))],
        StmtKind::Assign { targets, value } => {
            vec![("targets", exprs(targets)), ("value", node(value))]
        }
        StmtKind::AugAssign { target, op, value } => vec![
            ("target", node(target)),
            ("op", FieldRef::Leaf(Leaf::Operator(*op))),
            ("value", node(value)),
        ],
        StmtKind::AnnAssign {
            target,
            annotation,
            value,
        } => vec![
            ("target", node(target)),
            ("annotation", node(annotation)),
            ("value", opt_node(value.as_ref())),
        ],
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
            is_async,
        } => vec![
            ("target", node(target)),
            ("iter", node(iter)),
            ("body", stmts(body)),
            ("orelse", stmts(orelse)),
            ("is_async", flag(*is_async)),
        ],
        StmtKind::While { test, body, orelse } | StmtKind::If { test, body, orelse } => vec![
            ("test", node(test)),
            ("body", stmts(body)),
            ("orelse", stmts(orelse)),
        ],
        StmtKind::With {
            items,
            body,
            is_async,
        } => vec![
            ("items", FieldRef::Seq(SeqRef::WithItems(items))),
            ("body", stmts(body)),
            ("is_async", flag(*is_async)),
        ],
        StmtKind::Raise { exc, cause } => vec![
            ("exc", opt_node(exc.as_ref())),
            ("cause", opt_node(cause.as_ref())),
        ],
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => vec![
            ("body", stmts(body)),
            ("handlers", FieldRef::Seq(SeqRef::Handlers(handlers))),
            ("orelse", stmts(orelse)),
            ("finalbody", stmts(finalbody)),
        ],
        StmtKind::Assert { test, msg } => {
            vec![("test", node(test)), ("msg", opt_node(msg.as_ref()))]
        }
        StmtKind::Import { names } => vec![("names", FieldRef::Seq(SeqRef::Aliases(names)))],
        StmtKind::ImportFrom {
            module,
            names,
            level,
        } => vec![
            ("module", opt_ident(module.as_ref())),
            ("names", FieldRef::Seq(SeqRef::Aliases(names))),
            ("level", FieldRef::Leaf(Leaf::Level(*level))),
        ],
        StmtKind::Global { names } | StmtKind::Nonlocal { names } => {
            vec![("names", FieldRef::Seq(SeqRef::Idents(names)))]
        }
        StmtKind::Expr { value } => vec![("value", node(value))],
        StmtKind::Pass | StmtKind::Break | StmtKind::Continue => Vec::new(),
    }
}

fn expr_fields(expr: &Expr) -> Vec<(&'static str, FieldRef<'_>)> {
    match &expr.kind {
        ExprKind::BoolOp { op, values } => vec![
            ("op", FieldRef::Leaf(Leaf::BoolOperator(*op))),
            ("values", exprs(values)),
        ],
        ExprKind::NamedExpr { target, value } => {
            vec![("target", node(target)), ("value", node(value))]
        }
        ExprKind::BinOp { left, op, right } => vec![
            ("left", node(left)),
            ("op", FieldRef::Leaf(Leaf::Operator(*op))),
            ("right", node(right)),
        ],
        ExprKind::UnaryOp { op, operand } => vec![
            ("op", FieldRef::Leaf(Leaf::UnaryOperator(*op))),
            ("operand", node(operand)),
        ],
        ExprKind::Lambda { params, body } => vec![
            ("params", FieldRef::Seq(SeqRef::Params(params))),
            ("body", node(body)),
        ],
        ExprKind::IfExp { test, body, orelse } => vec![
            ("test", node(test)),
            ("body", node(body)),
            ("orelse", node(orelse)),
        ],
        ExprKind::Dict { entries } => vec![("entries", FieldRef::Seq(SeqRef::Entries(entries)))],
        ExprKind::Set { elts } => vec![("elts", exprs(elts))],
        ExprKind::List { elts, ctx: c } | ExprKind::Tuple { elts, ctx: c } => {
            vec![("elts", exprs(elts)), ("ctx", ctx(*c))]
        }
        ExprKind::ListComp { elt, generators }
        | ExprKind::SetComp { elt, generators }
        | ExprKind::GeneratorExp { elt, generators } => {
            vec![("elt", node(elt)), ("generators", comps(generators))]
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => vec![
            ("key", node(key)),
            ("value", node(value)),
            ("generators", comps(generators)),
        ],
        ExprKind::Await { value } | ExprKind::YieldFrom { value } => vec![("value", node(value))],
        ExprKind::Yield { value } => vec![("value", opt_node(value.as_deref()))],
        ExprKind::Compare {
            left,
            ops,
            comparators,
        } => vec![
            ("left", node(left)),
            ("ops", FieldRef::Seq(SeqRef::CmpOps(ops))),
            ("comparators", exprs(comparators)),
        ],
        ExprKind::Call {
            func,
            args,
            keywords,
        } => vec![
            ("func", node(func)),
            ("args", exprs(args)),
            ("keywords", FieldRef::Seq(SeqRef::Keywords(keywords))),
        ],
        ExprKind::Constant { value } => {
            vec![("value", FieldRef::Leaf(Leaf::Constant(value)))]
        }
        ExprKind::Attribute {
            value,
            attr,
            ctx: c,
        } => vec![
            ("value", node(value)),
            ("attr", ident(attr)),
            ("ctx", ctx(*c)),
        ],
        ExprKind::Subscript {
            value,
            slice,
            ctx: c,
        } => vec![
            ("value", node(value)),
            ("slice", node(slice)),
            ("ctx", ctx(*c)),
        ],
        ExprKind::Starred { value, ctx: c } => vec![("value", node(value)), ("ctx", ctx(*c))],
        ExprKind::Name { id, ctx: c } => vec![("id", ident(id)), ("ctx", ctx(*c))],
        ExprKind::Slice { lower, upper, step } => vec![
            ("lower", opt_node(lower.as_deref())),
            ("upper", opt_node(upper.as_deref())),
            ("step", opt_node(step.as_deref())),
        ],
        ExprKind::ExtSlice { dims } => vec![("dims", exprs(dims))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    fn field_names(node: NodeRef<'_>) -> Vec<&'static str> {
        node.fields().into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn view_fields_follow_kind_fields() {
        let loc = Location::new(1, 0);
        let exprs = vec![
            build::name("a", loc).attr("b"),
            build::name("a", loc).index(build::slice(None, Some(build::int(5, loc)), None, loc)),
            build::name("f", loc).call(vec![build::int(1, loc)], Vec::new()),
            build::dict(vec![(Some(build::string("a", loc)), build::int(1, loc))], loc),
            build::list(vec![build::int(1, loc)], loc),
            build::none(loc),
        ];
        for expr in &exprs {
            let view = NodeRef::Expr(expr);
            assert_eq!(field_names(view), view.kind().fields().to_vec());
        }

        let stmts = vec![
            build::assign(vec![build::store("x", loc)], build::int(1, loc), loc),
            build::delete(vec![build::name("x", loc)], loc),
            build::expr_stmt(build::name("x", loc), loc),
            build::import_from("a.b", vec![("c".to_string(), None)], loc),
            Stmt::new(
                StmtKind::If {
                    test: build::name("x", loc),
                    body: vec![build::expr_stmt(build::name("y", loc), loc)],
                    orelse: Vec::new(),
                },
                loc,
            ),
        ];
        for stmt in &stmts {
            let view = NodeRef::Stmt(stmt);
            assert_eq!(field_names(view), view.kind().fields().to_vec());
        }
    }

    #[test]
    fn field_lookup_by_name() {
        let loc = Location::new(2, 3);
        let expr = build::name("obj", loc).attr("method");
        let view = NodeRef::Expr(&expr);
        assert_eq!(view.kind(), NodeKind::Attribute);
        assert_eq!(view.loc(), loc);
        match view.field("attr") {
            Some(FieldRef::Leaf(Leaf::Ident(attr))) => assert_eq!(attr, "method"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(view.field("missing").is_none());
    }

    #[test]
    fn optional_fields_are_absent() {
        let loc = Location::new(1, 0);
        let slice = build::slice(None, Some(build::int(5, loc)), None, loc);
        let view = NodeRef::Expr(&slice);
        assert!(matches!(view.field("lower"), Some(FieldRef::Absent)));
        assert!(matches!(view.field("upper"), Some(FieldRef::Node(_))));
    }

    #[test]
    fn sequence_access() {
        let loc = Location::new(1, 0);
        let stmt = build::delete(vec![build::name("a", loc), build::name("b", loc)], loc);
        let view = NodeRef::Stmt(&stmt);
        match view.field("targets") {
            Some(FieldRef::Seq(seq)) => {
                assert_eq!(seq.len(), 2);
                assert!(seq.get(2).is_none());
                assert_eq!(seq.iter().count(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
