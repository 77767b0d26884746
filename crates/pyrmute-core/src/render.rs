// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Render a tree back to Python source.
//!
//! Output is normalized rather than faithful: 4-space indentation,
//! single-quoted strings, and only the parentheses precedence requires
//! (tuples always carry their own). Useful for debugging dumps and for
//! attaching readable source to a rewritten unit.

use crate::ast::{
    Alias, BoolOperator, Comprehension, Constant, ExceptHandler, Expr, ExprKind, Module, Operator,
    Param, ParamKind, Stmt, StmtKind, UnaryOperator, WithItem,
};

/// Render a whole module.
pub fn to_source(module: &Module) -> String {
    let mut state = RenderState::default();
    for stmt in &module.body {
        state.stmt(stmt);
    }
    state.tokens
}

/// Render a single expression.
pub fn expr_source(expr: &Expr) -> String {
    let mut state = RenderState::default();
    state.expr(expr, prec::TUPLE);
    state.tokens
}

/// Render a single statement (with trailing newline).
pub fn stmt_source(stmt: &Stmt) -> String {
    let mut state = RenderState::default();
    state.stmt(stmt);
    state.tokens
}

mod prec {
    pub const TUPLE: u8 = 0;
    pub const LAMBDA: u8 = 2;
    pub const IFEXP: u8 = 3;
    pub const OR: u8 = 4;
    pub const AND: u8 = 5;
    pub const NOT: u8 = 6;
    pub const CMP: u8 = 7;
    pub const BOR: u8 = 8;
    pub const BXOR: u8 = 9;
    pub const BAND: u8 = 10;
    pub const SHIFT: u8 = 11;
    pub const ARITH: u8 = 12;
    pub const TERM: u8 = 13;
    pub const UNARY: u8 = 14;
    pub const POWER: u8 = 15;
    pub const AWAIT: u8 = 16;
    pub const ATOM: u8 = 17;
}

fn binop_prec(op: Operator) -> u8 {
    match op {
        Operator::BitOr => prec::BOR,
        Operator::BitXor => prec::BXOR,
        Operator::BitAnd => prec::BAND,
        Operator::LShift | Operator::RShift => prec::SHIFT,
        Operator::Add | Operator::Sub => prec::ARITH,
        Operator::Mult | Operator::MatMult | Operator::Div | Operator::Mod | Operator::FloorDiv => {
            prec::TERM
        }
        Operator::Pow => prec::POWER,
    }
}

fn expr_prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Lambda { .. } => prec::LAMBDA,
        ExprKind::IfExp { .. } => prec::IFEXP,
        ExprKind::BoolOp {
            op: BoolOperator::Or,
            ..
        } => prec::OR,
        ExprKind::BoolOp {
            op: BoolOperator::And,
            ..
        } => prec::AND,
        ExprKind::UnaryOp {
            op: UnaryOperator::Not,
            ..
        } => prec::NOT,
        ExprKind::UnaryOp { .. } => prec::UNARY,
        ExprKind::Compare { .. } => prec::CMP,
        ExprKind::BinOp { op, .. } => binop_prec(*op),
        ExprKind::Await { .. } => prec::AWAIT,
        ExprKind::Starred { .. } => prec::BOR,
        ExprKind::Constant {
            value: Constant::Int(n),
        } if *n < 0 => prec::UNARY,
        ExprKind::Constant {
            value: Constant::Float(f),
        } if f.is_sign_negative() => prec::UNARY,
        _ => prec::ATOM,
    }
}

#[derive(Default)]
struct RenderState {
    tokens: String,
    indent: usize,
}

impl RenderState {
    fn add_token(&mut self, token: &str) {
        self.tokens.push_str(token);
    }

    fn add_indent(&mut self) {
        for _ in 0..self.indent {
            self.tokens.push_str("    ");
        }
    }

    fn line(&mut self, f: impl FnOnce(&mut Self)) {
        self.add_indent();
        f(self);
        self.tokens.push('\n');
    }

    fn block(&mut self, body: &[Stmt]) {
        self.indent += 1;
        if body.is_empty() {
            self.line(|s| s.add_token("pass"));
        }
        for stmt in body {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn comma_separated<T>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.add_token(", ");
            }
            f(self, item);
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef {
                name,
                params,
                body,
                decorators,
                is_async,
            } => {
                self.decorators(decorators);
                self.line(|s| {
                    if *is_async {
                        s.add_token("async ");
                    }
                    s.add_token("def ");
                    s.add_token(name);
                    s.add_token("(");
                    s.params(params);
                    s.add_token("):");
                });
                self.block(body);
            }
            StmtKind::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            } => {
                self.decorators(decorators);
                self.line(|s| {
                    s.add_token("class ");
                    s.add_token(name);
                    if !bases.is_empty() || !keywords.is_empty() {
                        s.add_token("(");
                        s.call_args(bases, keywords);
                        s.add_token(")");
                    }
                    s.add_token(":");
                });
                self.block(body);
            }
            StmtKind::Return { value } => self.line(|s| {
                s.add_token("return");
                if let Some(value) = value {
                    s.add_token(" ");
                    s.expr(value, prec::TUPLE);
                }
            }),
            StmtKind::Delete { targets } => self.line(|s| {
                s.add_token("del ");
                s.comma_separated(targets, |s, t| s.expr(t, prec::BOR));
            }),
            StmtKind::Assign { targets, value } => self.line(|s| {
                for target in targets {
                    s.expr(target, prec::TUPLE);
                    s.add_token(" = ");
                }
                s.expr(value, prec::TUPLE);
            }),
            StmtKind::AugAssign { target, op, value } => self.line(|s| {
                s.expr(target, prec::TUPLE);
                s.add_token(" ");
                s.add_token(op.symbol());
                s.add_token("= ");
                s.expr(value, prec::TUPLE);
            }),
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => self.line(|s| {
                s.expr(target, prec::TUPLE);
                s.add_token(": ");
                s.expr(annotation, prec::LAMBDA);
                if let Some(value) = value {
                    s.add_token(" = ");
                    s.expr(value, prec::TUPLE);
                }
            }),
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => {
                self.line(|s| {
                    if *is_async {
                        s.add_token("async ");
                    }
                    s.add_token("for ");
                    s.expr(target, prec::TUPLE);
                    s.add_token(" in ");
                    s.expr(iter, prec::TUPLE);
                    s.add_token(":");
                });
                self.block(body);
                self.else_block(orelse);
            }
            StmtKind::While { test, body, orelse } => {
                self.line(|s| {
                    s.add_token("while ");
                    s.expr(test, prec::LAMBDA);
                    s.add_token(":");
                });
                self.block(body);
                self.else_block(orelse);
            }
            StmtKind::If { test, body, orelse } => self.if_chain("if ", test, body, orelse),
            StmtKind::With {
                items,
                body,
                is_async,
            } => {
                self.line(|s| {
                    if *is_async {
                        s.add_token("async ");
                    }
                    s.add_token("with ");
                    s.comma_separated(items, |s, item| s.with_item(item));
                    s.add_token(":");
                });
                self.block(body);
            }
            StmtKind::Raise { exc, cause } => self.line(|s| {
                s.add_token("raise");
                if let Some(exc) = exc {
                    s.add_token(" ");
                    s.expr(exc, prec::LAMBDA);
                }
                if let Some(cause) = cause {
                    s.add_token(" from ");
                    s.expr(cause, prec::LAMBDA);
                }
            }),
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.line(|s| s.add_token("try:"));
                self.block(body);
                for handler in handlers {
                    self.handler(handler);
                }
                self.else_block(orelse);
                if !finalbody.is_empty() {
                    self.line(|s| s.add_token("finally:"));
                    self.block(finalbody);
                }
            }
            StmtKind::Assert { test, msg } => self.line(|s| {
                s.add_token("assert ");
                s.expr(test, prec::LAMBDA);
                if let Some(msg) = msg {
                    s.add_token(", ");
                    s.expr(msg, prec::LAMBDA);
                }
            }),
            StmtKind::Import { names } => self.line(|s| {
                s.add_token("import ");
                s.aliases(names);
            }),
            StmtKind::ImportFrom {
                module,
                names,
                level,
            } => self.line(|s| {
                s.add_token("from ");
                for _ in 0..*level {
                    s.add_token(".");
                }
                if let Some(module) = module {
                    s.add_token(module);
                }
                s.add_token(" import ");
                s.aliases(names);
            }),
            StmtKind::Global { names } => self.line(|s| {
                s.add_token("global ");
                s.add_token(&names.join(", "));
            }),
            StmtKind::Nonlocal { names } => self.line(|s| {
                s.add_token("nonlocal ");
                s.add_token(&names.join(", "));
            }),
            StmtKind::Expr { value } => self.line(|s| s.expr(value, prec::TUPLE)),
            StmtKind::Pass => self.line(|s| s.add_token("pass")),
            StmtKind::Break => self.line(|s| s.add_token("break")),
            StmtKind::Continue => self.line(|s| s.add_token("continue")),
        }
    }

    fn if_chain(&mut self, keyword: &str, test: &Expr, body: &[Stmt], orelse: &[Stmt]) {
        self.line(|s| {
            s.add_token(keyword);
            s.expr(test, prec::LAMBDA);
            s.add_token(":");
        });
        self.block(body);
        if let [Stmt {
            kind:
                StmtKind::If {
                    test,
                    body,
                    orelse,
                },
            ..
        }] = orelse
        {
            self.if_chain("elif ", test, body, orelse);
        } else {
            self.else_block(orelse);
        }
    }

    fn else_block(&mut self, orelse: &[Stmt]) {
        if !orelse.is_empty() {
            self.line(|s| s.add_token("else:"));
            self.block(orelse);
        }
    }

    fn decorators(&mut self, decorators: &[Expr]) {
        for decorator in decorators {
            self.line(|s| {
                s.add_token("@");
                s.expr(decorator, prec::LAMBDA);
            });
        }
    }

    fn handler(&mut self, handler: &ExceptHandler) {
        self.line(|s| {
            s.add_token("except");
            if let Some(type_) = &handler.type_ {
                s.add_token(" ");
                s.expr(type_, prec::LAMBDA);
                if let Some(name) = &handler.name {
                    s.add_token(" as ");
                    s.add_token(name);
                }
            }
            s.add_token(":");
        });
        self.block(&handler.body);
    }

    fn with_item(&mut self, item: &WithItem) {
        self.expr(&item.context_expr, prec::LAMBDA);
        if let Some(vars) = &item.optional_vars {
            self.add_token(" as ");
            self.expr(vars, prec::BOR);
        }
    }

    fn aliases(&mut self, names: &[Alias]) {
        self.comma_separated(names, |s, alias| {
            s.add_token(&alias.name);
            if let Some(asname) = &alias.asname {
                s.add_token(" as ");
                s.add_token(asname);
            }
        });
    }

    fn params(&mut self, params: &[Param]) {
        let mut star_seen = false;
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.add_token(", ");
            }
            match param.kind {
                ParamKind::Positional => {}
                ParamKind::VarPositional => {
                    star_seen = true;
                    self.add_token("*");
                }
                ParamKind::KeywordOnly => {
                    if !star_seen {
                        star_seen = true;
                        self.add_token("*, ");
                    }
                }
                ParamKind::VarKeyword => self.add_token("**"),
            }
            self.add_token(&param.name);
            if let Some(default) = &param.default {
                self.add_token("=");
                self.expr(default, prec::LAMBDA);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Render `expr`, parenthesized when it binds looser than `min`.
    fn expr(&mut self, expr: &Expr, min: u8) {
        if expr_prec(expr) < min {
            self.add_token("(");
            self.expr_inner(expr);
            self.add_token(")");
        } else {
            self.expr_inner(expr);
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        let own = expr_prec(expr);
        match &expr.kind {
            ExprKind::BoolOp { op, values } => {
                let sep = match op {
                    BoolOperator::And => " and ",
                    BoolOperator::Or => " or ",
                };
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.add_token(sep);
                    }
                    self.expr(value, own + 1);
                }
            }
            ExprKind::NamedExpr { target, value } => {
                self.add_token("(");
                self.expr(target, prec::ATOM);
                self.add_token(" := ");
                self.expr(value, prec::LAMBDA);
                self.add_token(")");
            }
            ExprKind::BinOp { left, op, right } => {
                if *op == Operator::Pow {
                    self.expr(left, prec::AWAIT);
                    self.add_token(" ** ");
                    self.expr(right, prec::UNARY);
                } else {
                    self.expr(left, own);
                    self.add_token(" ");
                    self.add_token(op.symbol());
                    self.add_token(" ");
                    self.expr(right, own + 1);
                }
            }
            ExprKind::UnaryOp { op, operand } => {
                self.add_token(match op {
                    UnaryOperator::Not => "not ",
                    UnaryOperator::Invert => "~",
                    UnaryOperator::UAdd => "+",
                    UnaryOperator::USub => "-",
                });
                self.expr(operand, own);
            }
            ExprKind::Lambda { params, body } => {
                self.add_token("lambda");
                if !params.is_empty() {
                    self.add_token(" ");
                    self.params(params);
                }
                self.add_token(": ");
                self.expr(body, prec::LAMBDA);
            }
            ExprKind::IfExp { test, body, orelse } => {
                self.expr(body, prec::OR);
                self.add_token(" if ");
                self.expr(test, prec::OR);
                self.add_token(" else ");
                self.expr(orelse, prec::IFEXP);
            }
            ExprKind::Dict { entries } => {
                self.add_token("{");
                self.comma_separated(entries, |s, entry| match &entry.key {
                    Some(key) => {
                        s.expr(key, prec::LAMBDA);
                        s.add_token(": ");
                        s.expr(&entry.value, prec::LAMBDA);
                    }
                    None => {
                        s.add_token("**");
                        s.expr(&entry.value, prec::BOR);
                    }
                });
                self.add_token("}");
            }
            ExprKind::Set { elts } => {
                if elts.is_empty() {
                    self.add_token("set()");
                } else {
                    self.add_token("{");
                    self.comma_separated(elts, |s, e| s.expr(e, prec::LAMBDA));
                    self.add_token("}");
                }
            }
            ExprKind::List { elts, .. } => {
                self.add_token("[");
                self.comma_separated(elts, |s, e| s.expr(e, prec::LAMBDA));
                self.add_token("]");
            }
            ExprKind::Tuple { elts, .. } => {
                self.add_token("(");
                self.comma_separated(elts, |s, e| s.expr(e, prec::LAMBDA));
                if elts.len() == 1 {
                    self.add_token(",");
                }
                self.add_token(")");
            }
            ExprKind::ListComp { elt, generators } => {
                self.add_token("[");
                self.expr(elt, prec::LAMBDA);
                self.generators(generators);
                self.add_token("]");
            }
            ExprKind::SetComp { elt, generators } => {
                self.add_token("{");
                self.expr(elt, prec::LAMBDA);
                self.generators(generators);
                self.add_token("}");
            }
            ExprKind::GeneratorExp { elt, generators } => {
                self.add_token("(");
                self.expr(elt, prec::LAMBDA);
                self.generators(generators);
                self.add_token(")");
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                self.add_token("{");
                self.expr(key, prec::LAMBDA);
                self.add_token(": ");
                self.expr(value, prec::LAMBDA);
                self.generators(generators);
                self.add_token("}");
            }
            ExprKind::Await { value } => {
                self.add_token("await ");
                self.expr(value, prec::ATOM);
            }
            ExprKind::Yield { value } => {
                self.add_token("(yield");
                if let Some(value) = value {
                    self.add_token(" ");
                    self.expr(value, prec::TUPLE);
                }
                self.add_token(")");
            }
            ExprKind::YieldFrom { value } => {
                self.add_token("(yield from ");
                self.expr(value, prec::LAMBDA);
                self.add_token(")");
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                self.expr(left, own + 1);
                for (op, right) in ops.iter().zip(comparators) {
                    self.add_token(" ");
                    self.add_token(op.symbol());
                    self.add_token(" ");
                    self.expr(right, own + 1);
                }
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(func, prec::ATOM);
                self.add_token("(");
                self.call_args(args, keywords);
                self.add_token(")");
            }
            ExprKind::Constant { value } => self.constant(value),
            ExprKind::Attribute { value, attr, .. } => {
                let int_receiver = matches!(
                    value.kind,
                    ExprKind::Constant {
                        value: Constant::Int(_)
                    }
                );
                if int_receiver {
                    self.add_token("(");
                    self.expr_inner(value);
                    self.add_token(")");
                } else {
                    self.expr(value, prec::ATOM);
                }
                self.add_token(".");
                self.add_token(attr);
            }
            ExprKind::Subscript { value, slice, .. } => {
                self.expr(value, prec::ATOM);
                self.add_token("[");
                self.expr(slice, prec::TUPLE);
                self.add_token("]");
            }
            ExprKind::Starred { value, .. } => {
                self.add_token("*");
                self.expr(value, prec::BOR);
            }
            ExprKind::Name { id, .. } => self.add_token(id),
            ExprKind::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.expr(lower, prec::LAMBDA);
                }
                self.add_token(":");
                if let Some(upper) = upper {
                    self.expr(upper, prec::LAMBDA);
                }
                if let Some(step) = step {
                    self.add_token(":");
                    self.expr(step, prec::LAMBDA);
                }
            }
            ExprKind::ExtSlice { dims } => {
                self.comma_separated(dims, |s, d| s.expr(d, prec::LAMBDA));
            }
        }
    }

    fn call_args(&mut self, args: &[Expr], keywords: &[crate::ast::Keyword]) {
        self.comma_separated(args, |s, arg| s.expr(arg, prec::LAMBDA));
        if !args.is_empty() && !keywords.is_empty() {
            self.add_token(", ");
        }
        self.comma_separated(keywords, |s, keyword| {
            match &keyword.arg {
                Some(arg) => {
                    s.add_token(arg);
                    s.add_token("=");
                }
                None => s.add_token("**"),
            }
            s.expr(&keyword.value, prec::LAMBDA);
        });
    }

    fn generators(&mut self, generators: &[Comprehension]) {
        for comp in generators {
            self.add_token(if comp.is_async { " async for " } else { " for " });
            self.expr(&comp.target, prec::TUPLE);
            self.add_token(" in ");
            self.expr(&comp.iter, prec::OR);
            for cond in &comp.ifs {
                self.add_token(" if ");
                self.expr(cond, prec::OR);
            }
        }
    }

    fn constant(&mut self, value: &Constant) {
        match value {
            Constant::None => self.add_token("None"),
            Constant::Bool(true) => self.add_token("True"),
            Constant::Bool(false) => self.add_token("False"),
            Constant::Int(n) => self.add_token(&n.to_string()),
            Constant::Float(f) => self.add_token(&format!("{:?}", f)),
            Constant::Str(s) => self.add_token(&quote(s)),
            Constant::Bytes(bytes) => {
                self.add_token("b'");
                for &byte in bytes {
                    match byte {
                        b'\\' => self.add_token("\\\\"),
                        b'\'' => self.add_token("\\'"),
                        b'\n' => self.add_token("\\n"),
                        0x20..=0x7e => self.tokens.push(char::from(byte)),
                        _ => self.add_token(&format!("\\x{:02x}", byte)),
                    }
                }
                self.add_token("'");
            }
            Constant::Ellipsis => self.add_token("..."),
        }
    }
}

/// Quote a string literal with single quotes.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprContext, Location};
    use crate::build;

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn binop(left: Expr, op: Operator, right: Expr) -> Expr {
        Expr::new(
            ExprKind::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            loc(),
        )
    }

    #[test]
    fn renders_assignment_chain() {
        let value = build::name("set_attr", loc()).call(
            vec![
                build::name("a", loc()),
                build::string("b", loc()),
                build::int(5, loc()),
            ],
            Vec::new(),
        );
        let stmt = build::assign(vec![build::name("a", loc())], value, loc());
        assert_eq!(stmt_source(&stmt), "a = set_attr(a, 'b', 5)\n");
    }

    #[test]
    fn precedence_adds_needed_parens() {
        let sum = binop(build::name("a", loc()), Operator::Add, build::name("b", loc()));
        let product = binop(sum.clone(), Operator::Mult, build::name("c", loc()));
        assert_eq!(expr_source(&product), "(a + b) * c");

        let right_nested = binop(build::name("a", loc()), Operator::Sub, sum);
        assert_eq!(expr_source(&right_nested), "a - (a + b)");

        let pow = binop(
            build::name("a", loc()),
            Operator::Pow,
            binop(build::name("b", loc()), Operator::Pow, build::name("c", loc())),
        );
        assert_eq!(expr_source(&pow), "a ** b ** c");
    }

    #[test]
    fn renders_slices_and_tuples() {
        let slice = build::slice(None, Some(build::int(5, loc())), Some(build::int(2, loc())), loc());
        let expr = build::name("x", loc()).index(slice);
        assert_eq!(expr_source(&expr), "x[:5:2]");

        let single = build::tuple(vec![build::int(1, loc())], loc());
        assert_eq!(expr_source(&single), "(1,)");
    }

    #[test]
    fn renders_imports_and_blocks() {
        let import = build::import_from(
            "pyrsistent",
            vec![("pmap".to_string(), Some("_pmap".to_string()))],
            Location::START,
        );
        let body = vec![build::assign(
            vec![build::name("x", loc())],
            build::dict(
                vec![(Some(build::string("a", loc())), build::string("b", loc()))],
                loc(),
            ),
            loc(),
        )];
        let func = Stmt::new(
            StmtKind::FunctionDef {
                name: "f".to_string(),
                params: vec![Param {
                    name: "p".to_string(),
                    kind: ParamKind::Positional,
                    default: None,
                    loc: loc(),
                }],
                body,
                decorators: Vec::new(),
                is_async: false,
            },
            loc(),
        );
        let empty_class = Stmt::new(
            StmtKind::ClassDef {
                name: "C".to_string(),
                bases: Vec::new(),
                keywords: Vec::new(),
                body: Vec::new(),
                decorators: Vec::new(),
            },
            loc(),
        );
        let module = Module::new(vec![import, func, empty_class]);
        assert_eq!(
            to_source(&module),
            "from pyrsistent import pmap as _pmap\n\
             def f(p):\n    x = {'a': 'b'}\n\
             class C:\n    pass\n"
        );
    }

    #[test]
    fn quotes_strings() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\nb"), "'a\\nb'");
    }

    #[test]
    fn folds_elif() {
        let inner = Stmt::new(
            StmtKind::If {
                test: build::name("b", loc()),
                body: vec![Stmt::new(StmtKind::Pass, loc())],
                orelse: vec![Stmt::new(StmtKind::Break, loc())],
            },
            loc(),
        );
        let outer = Stmt::new(
            StmtKind::If {
                test: build::name("a", loc()),
                body: vec![Stmt::new(StmtKind::Pass, loc())],
                orelse: vec![inner],
            },
            loc(),
        );
        assert_eq!(
            stmt_source(&outer),
            "if a:\n    pass\nelif b:\n    pass\nelse:\n    break\n"
        );
    }

    #[test]
    fn renders_delete_targets() {
        let stmt = build::delete(
            vec![
                build::name("a", loc()),
                build::name("z", loc()).index(build::int(0, loc())),
            ],
            loc(),
        );
        assert_eq!(stmt_source(&stmt), "del a, z[0]\n");
        assert!(matches!(
            &stmt.kind,
            StmtKind::Delete { targets } if matches!(targets[0].kind, ExprKind::Name { ctx: ExprContext::Del, .. })
        ));
    }
}
