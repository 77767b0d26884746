// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The rewrite driver.
//!
//! [`Rewriter`] walks a unit once, in statement order, producing a new tree.
//! Statement rewrites return a `Vec<Stmt>` that is spliced in place of the
//! original statement; expression rewrites return one replacement node.
//!
//! Both walks are exhaustive matches over the node kinds. The mutation
//! shaped cases are delegated to:
//! - [`crate::assign`] for assignment and augmented assignment
//! - [`crate::method_call`] for `subject.method(...)` statements
//! - [`crate::delete`] for `del`
//! - [`crate::literal`] for composite literals
//!
//! Everything else is copied with its children rewritten.

use pyrmute_core::{
    Comprehension, Config, DictEntry, ExceptHandler, Expr, ExprKind, Keyword, Module, Param, Stmt,
    StmtKind, WithItem,
};
use tracing::debug;

use crate::error::RewriteResult;
use crate::method_call::method_call_matcher;
use crate::names::Names;
use crate::pattern::Matcher;

/// Result of rewriting one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutput {
    pub module: Module,
    /// Number of import statements prepended.
    pub imports: usize,
}

/// Rewrite a unit, returning the new tree.
pub fn rewrite(module: &Module, config: &Config) -> RewriteResult<Module> {
    Ok(rewrite_module(module, config)?.module)
}

/// Rewrite a unit, returning the new tree and the number of imports added.
///
/// Either the whole unit rewrites or an error is returned; the input is
/// never modified.
pub fn rewrite_module(module: &Module, config: &Config) -> RewriteResult<RewriteOutput> {
    let names = Names::open(module, &config.rewrite.prefix);
    let mut rewriter = Rewriter::new(names, config)?;
    let body = rewriter.rewrite_body(&module.body)?;

    let mut output = Module::new(body);
    let imports = rewriter.names.close(&mut output);
    debug!(statements = output.body.len(), imports, "rewrote unit");
    Ok(RewriteOutput {
        module: output,
        imports,
    })
}

/// Rewriting state for one unit.
pub struct Rewriter<'c> {
    pub(crate) names: Names,
    pub(crate) config: &'c Config,
    pub(crate) method_call: Matcher,
}

impl<'c> Rewriter<'c> {
    pub fn new(names: Names, config: &'c Config) -> RewriteResult<Self> {
        Ok(Rewriter {
            names,
            config,
            method_call: method_call_matcher()?,
        })
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn into_names(self) -> Names {
        self.names
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn rewrite_body(&mut self, body: &[Stmt]) -> RewriteResult<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            out.extend(self.rewrite_stmt(stmt)?);
        }
        Ok(out)
    }

    /// Rewrite one statement into the statements that replace it, in order.
    pub fn rewrite_stmt(&mut self, stmt: &Stmt) -> RewriteResult<Vec<Stmt>> {
        let loc = stmt.loc;
        let kind = match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                return self.rewrite_assign(targets, value, loc);
            }
            StmtKind::AugAssign { target, op, value } => {
                return self.rewrite_aug_assign(target, *op, value, loc);
            }
            StmtKind::AnnAssign {
                target,
                value: Some(value),
                ..
            } if target.is_access() => {
                debug!(%loc, "annotated access assignment rewritten without annotation");
                return self.rewrite_assign(std::slice::from_ref(target), value, loc);
            }
            StmtKind::Delete { targets } => return self.rewrite_delete(targets, loc),
            StmtKind::Expr { value } => return self.rewrite_expr_stmt(value, loc),

            StmtKind::FunctionDef {
                name,
                params,
                body,
                decorators,
                is_async,
            } => StmtKind::FunctionDef {
                name: name.clone(),
                params: self.rewrite_params(params)?,
                body: self.rewrite_body(body)?,
                decorators: self.rewrite_exprs(decorators)?,
                is_async: *is_async,
            },
            StmtKind::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            } => StmtKind::ClassDef {
                name: name.clone(),
                bases: self.rewrite_exprs(bases)?,
                keywords: self.rewrite_keywords(keywords)?,
                body: self.rewrite_body(body)?,
                decorators: self.rewrite_exprs(decorators)?,
            },
            StmtKind::Return { value } => StmtKind::Return {
                value: self.rewrite_opt(value.as_ref())?,
            },
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => StmtKind::AnnAssign {
                target: target.clone(),
                annotation: self.rewrite_expr(annotation)?,
                value: self.rewrite_opt(value.as_ref())?,
            },
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => StmtKind::For {
                target: target.clone(),
                iter: self.rewrite_expr(iter)?,
                body: self.rewrite_body(body)?,
                orelse: self.rewrite_body(orelse)?,
                is_async: *is_async,
            },
            StmtKind::While { test, body, orelse } => StmtKind::While {
                test: self.rewrite_expr(test)?,
                body: self.rewrite_body(body)?,
                orelse: self.rewrite_body(orelse)?,
            },
            StmtKind::If { test, body, orelse } => StmtKind::If {
                test: self.rewrite_expr(test)?,
                body: self.rewrite_body(body)?,
                orelse: self.rewrite_body(orelse)?,
            },
            StmtKind::With {
                items,
                body,
                is_async,
            } => StmtKind::With {
                items: items
                    .iter()
                    .map(|item| {
                        Ok(WithItem {
                            context_expr: self.rewrite_expr(&item.context_expr)?,
                            optional_vars: item.optional_vars.clone(),
                            loc: item.loc,
                        })
                    })
                    .collect::<RewriteResult<_>>()?,
                body: self.rewrite_body(body)?,
                is_async: *is_async,
            },
            StmtKind::Raise { exc, cause } => StmtKind::Raise {
                exc: self.rewrite_opt(exc.as_ref())?,
                cause: self.rewrite_opt(cause.as_ref())?,
            },
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => StmtKind::Try {
                body: self.rewrite_body(body)?,
                handlers: handlers
                    .iter()
                    .map(|handler| {
                        Ok(ExceptHandler {
                            type_: self.rewrite_opt(handler.type_.as_ref())?,
                            name: handler.name.clone(),
                            body: self.rewrite_body(&handler.body)?,
                            loc: handler.loc,
                        })
                    })
                    .collect::<RewriteResult<_>>()?,
                orelse: self.rewrite_body(orelse)?,
                finalbody: self.rewrite_body(finalbody)?,
            },
            StmtKind::Assert { test, msg } => StmtKind::Assert {
                test: self.rewrite_expr(test)?,
                msg: self.rewrite_opt(msg.as_ref())?,
            },
            StmtKind::Import { .. }
            | StmtKind::ImportFrom { .. }
            | StmtKind::Global { .. }
            | StmtKind::Nonlocal { .. }
            | StmtKind::Pass
            | StmtKind::Break
            | StmtKind::Continue => stmt.kind.clone(),
        };
        Ok(vec![Stmt::new(kind, loc)])
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Rewrite an expression; composite literals are wrapped.
    pub fn rewrite_expr(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        let inner = self.rewrite_children(expr)?;
        self.wrap_literal(inner)
    }

    pub(crate) fn rewrite_exprs(&mut self, exprs: &[Expr]) -> RewriteResult<Vec<Expr>> {
        exprs.iter().map(|e| self.rewrite_expr(e)).collect()
    }

    fn rewrite_opt(&mut self, expr: Option<&Expr>) -> RewriteResult<Option<Expr>> {
        expr.map(|e| self.rewrite_expr(e)).transpose()
    }

    fn rewrite_boxed(&mut self, expr: &Expr) -> RewriteResult<Box<Expr>> {
        Ok(Box::new(self.rewrite_expr(expr)?))
    }

    fn rewrite_opt_boxed(&mut self, expr: Option<&Expr>) -> RewriteResult<Option<Box<Expr>>> {
        Ok(self.rewrite_opt(expr)?.map(Box::new))
    }

    fn rewrite_params(&mut self, params: &[Param]) -> RewriteResult<Vec<Param>> {
        params
            .iter()
            .map(|param| {
                Ok(Param {
                    name: param.name.clone(),
                    kind: param.kind,
                    default: self.rewrite_opt(param.default.as_ref())?,
                    loc: param.loc,
                })
            })
            .collect()
    }

    pub(crate) fn rewrite_keywords(&mut self, keywords: &[Keyword]) -> RewriteResult<Vec<Keyword>> {
        keywords.iter().map(|k| self.rewrite_keyword(k)).collect()
    }

    fn rewrite_generators(
        &mut self,
        generators: &[Comprehension],
    ) -> RewriteResult<Vec<Comprehension>> {
        generators
            .iter()
            .map(|comp| {
                Ok(Comprehension {
                    target: comp.target.clone(),
                    iter: self.rewrite_expr(&comp.iter)?,
                    ifs: self.rewrite_exprs(&comp.ifs)?,
                    is_async: comp.is_async,
                    loc: comp.loc,
                })
            })
            .collect()
    }

    /// Copy `expr` with every child rewritten; the node itself is kept.
    pub(crate) fn rewrite_children(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        let kind = match &expr.kind {
            ExprKind::BoolOp { op, values } => ExprKind::BoolOp {
                op: *op,
                values: self.rewrite_exprs(values)?,
            },
            ExprKind::NamedExpr { target, value } => ExprKind::NamedExpr {
                target: target.clone(),
                value: self.rewrite_boxed(value)?,
            },
            ExprKind::BinOp { left, op, right } => ExprKind::BinOp {
                left: self.rewrite_boxed(left)?,
                op: *op,
                right: self.rewrite_boxed(right)?,
            },
            ExprKind::UnaryOp { op, operand } => ExprKind::UnaryOp {
                op: *op,
                operand: self.rewrite_boxed(operand)?,
            },
            ExprKind::Lambda { params, body } => ExprKind::Lambda {
                params: self.rewrite_params(params)?,
                body: self.rewrite_boxed(body)?,
            },
            ExprKind::IfExp { test, body, orelse } => ExprKind::IfExp {
                test: self.rewrite_boxed(test)?,
                body: self.rewrite_boxed(body)?,
                orelse: self.rewrite_boxed(orelse)?,
            },
            ExprKind::Dict { entries } => ExprKind::Dict {
                entries: entries
                    .iter()
                    .map(|entry| {
                        Ok(DictEntry {
                            key: self.rewrite_opt(entry.key.as_ref())?,
                            value: self.rewrite_expr(&entry.value)?,
                        })
                    })
                    .collect::<RewriteResult<_>>()?,
            },
            ExprKind::Set { elts } => ExprKind::Set {
                elts: self.rewrite_exprs(elts)?,
            },
            ExprKind::List { elts, ctx } => ExprKind::List {
                elts: self.rewrite_exprs(elts)?,
                ctx: *ctx,
            },
            ExprKind::Tuple { elts, ctx } => ExprKind::Tuple {
                elts: self.rewrite_exprs(elts)?,
                ctx: *ctx,
            },
            ExprKind::ListComp { elt, generators } => ExprKind::ListComp {
                elt: self.rewrite_boxed(elt)?,
                generators: self.rewrite_generators(generators)?,
            },
            ExprKind::SetComp { elt, generators } => ExprKind::SetComp {
                elt: self.rewrite_boxed(elt)?,
                generators: self.rewrite_generators(generators)?,
            },
            ExprKind::GeneratorExp { elt, generators } => ExprKind::GeneratorExp {
                elt: self.rewrite_boxed(elt)?,
                generators: self.rewrite_generators(generators)?,
            },
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => ExprKind::DictComp {
                key: self.rewrite_boxed(key)?,
                value: self.rewrite_boxed(value)?,
                generators: self.rewrite_generators(generators)?,
            },
            ExprKind::Await { value } => ExprKind::Await {
                value: self.rewrite_boxed(value)?,
            },
            ExprKind::Yield { value } => ExprKind::Yield {
                value: self.rewrite_opt_boxed(value.as_deref())?,
            },
            ExprKind::YieldFrom { value } => ExprKind::YieldFrom {
                value: self.rewrite_boxed(value)?,
            },
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => ExprKind::Compare {
                left: self.rewrite_boxed(left)?,
                ops: ops.clone(),
                comparators: self.rewrite_exprs(comparators)?,
            },
            ExprKind::Call {
                func,
                args,
                keywords,
            } => ExprKind::Call {
                func: self.rewrite_boxed(func)?,
                args: self.rewrite_exprs(args)?,
                keywords: self.rewrite_keywords(keywords)?,
            },
            ExprKind::Attribute { value, attr, ctx } => ExprKind::Attribute {
                value: self.rewrite_boxed(value)?,
                attr: attr.clone(),
                ctx: *ctx,
            },
            ExprKind::Subscript { value, slice, ctx } => ExprKind::Subscript {
                value: self.rewrite_boxed(value)?,
                slice: self.rewrite_boxed(slice)?,
                ctx: *ctx,
            },
            ExprKind::Starred { value, ctx } => ExprKind::Starred {
                value: self.rewrite_boxed(value)?,
                ctx: *ctx,
            },
            ExprKind::Slice { lower, upper, step } => ExprKind::Slice {
                lower: self.rewrite_opt_boxed(lower.as_deref())?,
                upper: self.rewrite_opt_boxed(upper.as_deref())?,
                step: self.rewrite_opt_boxed(step.as_deref())?,
            },
            ExprKind::ExtSlice { dims } => ExprKind::ExtSlice {
                dims: self.rewrite_exprs(dims)?,
            },
            ExprKind::Constant { .. } | ExprKind::Name { .. } => expr.kind.clone(),
        };
        Ok(Expr::new(kind, expr.loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::render::to_source;
    use pyrmute_core::{build, Location};

    fn loc() -> Location {
        Location::new(1, 0)
    }

    #[test]
    fn untouched_unit_gets_no_imports() {
        let module = Module::new(vec![
            build::assign(vec![build::name("x", loc())], build::int(1, loc()), loc()),
            Stmt::new(StmtKind::Pass, loc()),
        ]);
        let output = rewrite_module(&module, &Config::default()).unwrap();
        assert_eq!(output.imports, 0);
        assert_eq!(output.module, module);
    }

    #[test]
    fn nested_bodies_are_rewritten() {
        let body = vec![build::assign(
            vec![build::name("a", loc()).attr("b")],
            build::int(1, loc()),
            loc(),
        )];
        let module = Module::new(vec![Stmt::new(
            StmtKind::If {
                test: build::name("cond", loc()),
                body,
                orelse: Vec::new(),
            },
            loc(),
        )]);
        let out = rewrite(&module, &Config::default()).unwrap();
        assert_eq!(
            to_source(&out),
            "from pyrmute.runtime import set_attr_with_fallback as _set_attr_with_fallback\n\
             if cond:\n    a = _set_attr_with_fallback(a, 'b', 1)\n"
        );
    }

    #[test]
    fn input_is_not_modified() {
        let module = Module::new(vec![build::expr_stmt(
            build::name("v", loc()).method("append", vec![build::int(1, loc())]),
            loc(),
        )]);
        let before = module.clone();
        rewrite(&module, &Config::default()).unwrap();
        assert_eq!(module, before);
    }
}
