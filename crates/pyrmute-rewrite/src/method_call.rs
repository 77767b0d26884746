// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Method-call normalization.
//!
//! An expression statement `subject.method(args)` becomes
//! `subject = invoke(subject, 'method', args)`. The runtime's `invoke`
//! returns the evolved value for methods known to return one and the
//! subject itself otherwise, so the rebinding is always safe.
//!
//! A subject that is not a plain name is evaluated once into a temporary.
//! When it is an access chain the temporary is written back through the
//! chain afterwards, so `v.items.append(x)` evolves `v`.

use pyrmute_core::{build, Expr, Location, NodeKind, Stmt};
use tracing::debug;

use crate::error::{PatternError, RewriteResult};
use crate::pattern::{Matcher, Pattern};
use crate::transformer::Rewriter;

/// `Call(func=Attribute(value=subject, attr=method), args=args, keywords=kwargs)`
pub fn method_call_pattern() -> Pattern {
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

pub(crate) fn method_call_matcher() -> Result<Matcher, PatternError> {
    Matcher::new(method_call_pattern())
}

impl Rewriter<'_> {
    pub(crate) fn rewrite_expr_stmt(
        &mut self,
        value: &Expr,
        loc: Location,
    ) -> RewriteResult<Vec<Stmt>> {
        let Some(captures) = self.method_call.match_expr(value) else {
            let value = self.rewrite_expr(value)?;
            return Ok(vec![build::expr_stmt(value, loc)]);
        };
        let (Some(subject), Some(method), Some(args), Some(kwargs)) = (
            captures.expr("subject"),
            captures.ident("method"),
            captures.exprs("args"),
            captures.keywords("kwargs"),
        ) else {
            let value = self.rewrite_expr(value)?;
            return Ok(vec![build::expr_stmt(value, loc)]);
        };

        let mut out = Vec::new();
        // Subject first, then arguments: the order Python evaluates them in.
        let (subject, write_back) = match subject.as_name() {
            Some(id) => (build::name(id, subject.loc), None),
            None if subject.is_access() => {
                let chain = self.stabilize(subject, &mut out)?;
                let temp = self.hoist(chain.clone(), "subject", &mut out);
                (temp, Some(chain))
            }
            None => {
                let subject = self.rewrite_expr(subject)?;
                (self.hoist(subject, "subject", &mut out), None)
            }
        };
        let args = self.rewrite_exprs(args)?;
        let kwargs = self.rewrite_keywords(kwargs)?;

        debug!(%loc, method, "normalizing method call");
        let mut invoke_args = vec![subject.clone(), build::string(method, value.loc)];
        invoke_args.extend(args);
        let invoke = self.names.call_external(
            &self.config.runtime.invoke,
            invoke_args,
            kwargs,
            value.loc,
        );
        self.assign_target(&subject, invoke, loc, &mut out)?;

        if let Some(chain) = write_back {
            self.assign_target(&chain, subject, loc, &mut out)?;
        }
        Ok(out)
    }
}
