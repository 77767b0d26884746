// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Subscript normalization.
//!
//! Turns the index of `x[...]` into the value the container's indexing
//! protocol receives, so it can be passed as an ordinary argument:
//!
//! | index        | normalized                         |
//! |--------------|------------------------------------|
//! | `i`          | `i`                                |
//! | `a:b:c`      | `_slice(a, b, c)`                  |
//! | `:5`         | `_slice(None, 5, None)`            |
//! | `0:1, 2`     | `(_slice(0, 1, None), 2)`          |
//!
//! `_slice` is the configured slice constructor, bound through name hygiene.
//! Synthesized nodes take the location of the slice they replace.

use pyrmute_core::{build, Config, Expr, ExprKind, Location};

use crate::error::{RewriteError, RewriteResult};
use crate::names::Names;

/// Normalize a subscript index.
pub fn normalize(names: &mut Names, config: &Config, index: &Expr) -> RewriteResult<Expr> {
    match &index.kind {
        ExprKind::Slice { .. } => slice_call(names, config, index),
        ExprKind::ExtSlice { dims } => {
            if dims.is_empty() {
                return Err(RewriteError::unexpected(
                    index.kind.node_kind(),
                    index.loc,
                    "an empty extended slice",
                ));
            }
            dimensions(names, config, dims, index.loc)
        }
        // `x[1:2, 3]` may also arrive as a tuple of slices.
        ExprKind::Tuple { elts, .. }
            if elts.iter().any(|e| matches!(e.kind, ExprKind::Slice { .. })) =>
        {
            dimensions(names, config, elts, index.loc)
        }
        _ => Ok(index.clone()),
    }
}

fn dimensions(
    names: &mut Names,
    config: &Config,
    dims: &[Expr],
    loc: Location,
) -> RewriteResult<Expr> {
    let elts = dims
        .iter()
        .map(|dim| match &dim.kind {
            ExprKind::Slice { .. } => slice_call(names, config, dim),
            ExprKind::ExtSlice { .. } => Err(RewriteError::unexpected(
                dim.kind.node_kind(),
                dim.loc,
                "an extended slice dimension",
            )),
            _ => Ok(dim.clone()),
        })
        .collect::<RewriteResult<Vec<_>>>()?;
    Ok(build::tuple(elts, loc))
}

fn slice_call(names: &mut Names, config: &Config, slice: &Expr) -> RewriteResult<Expr> {
    let ExprKind::Slice { lower, upper, step } = &slice.kind else {
        return Err(RewriteError::unexpected(
            slice.kind.node_kind(),
            slice.loc,
            "a slice",
        ));
    };
    let loc = slice.loc;
    let bound = |b: &Option<Box<Expr>>| match b {
        Some(expr) => (**expr).clone(),
        None => build::none(loc),
    };
    let args = vec![bound(lower), bound(upper), bound(step)];
    Ok(names.call_external(&config.constructors.slice, args, Vec::new(), loc))
}
