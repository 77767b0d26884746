// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Deletion decomposition.
//!
//! `del t1, ..., tn` is split per target. Access targets become evolve
//! calls rebinding their owner; every contiguous run of other targets stays
//! together in one `del`, flushed just before the next access target and
//! once more at the end.

use pyrmute_core::{build, Expr, ExprKind, Location, Stmt};
use tracing::debug;

use crate::effects::has_side_effects;
use crate::error::RewriteResult;
use crate::subscript::normalize;
use crate::transformer::Rewriter;

impl Rewriter<'_> {
    pub(crate) fn rewrite_delete(
        &mut self,
        targets: &[Expr],
        loc: Location,
    ) -> RewriteResult<Vec<Stmt>> {
        let mut out = Vec::new();
        let mut pending: Vec<Expr> = Vec::new();

        for target in targets {
            match &target.kind {
                ExprKind::Attribute { value, attr, .. } => {
                    flush(&mut pending, loc, &mut out);
                    let owner = self.stabilize(value, &mut out)?;
                    debug!(%loc, attr = attr.as_str(), "decomposing attribute deletion");
                    let args = vec![owner.as_load(), build::string(attr.clone(), target.loc)];
                    let call = self.names.call_external(
                        &self.config.runtime.del_attr,
                        args,
                        Vec::new(),
                        target.loc,
                    );
                    let (lhs, rhs) = self.destructure(&owner, call)?;
                    out.push(build::assign(vec![lhs], rhs, loc));
                }
                ExprKind::Subscript { value, slice, .. } => {
                    flush(&mut pending, loc, &mut out);
                    let owner = self.stabilize(value, &mut out)?;
                    let slice = self.rewrite_expr(slice)?;
                    let index = normalize(&mut self.names, self.config, &slice)?;
                    let index = if has_side_effects(&slice) {
                        self.hoist(index, "index", &mut out)
                    } else {
                        index
                    };
                    debug!(%loc, "decomposing subscript deletion");
                    let call = self.names.call_external(
                        &self.config.runtime.del_subscript,
                        vec![owner.as_load(), index],
                        Vec::new(),
                        target.loc,
                    );
                    let (lhs, rhs) = self.destructure(&owner, call)?;
                    out.push(build::assign(vec![lhs], rhs, loc));
                }
                _ => pending.push(target.clone()),
            }
        }
        flush(&mut pending, loc, &mut out);
        Ok(out)
    }
}

fn flush(pending: &mut Vec<Expr>, loc: Location, out: &mut Vec<Stmt>) {
    if !pending.is_empty() {
        out.push(build::delete(std::mem::take(pending), loc));
    }
}
