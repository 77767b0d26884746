// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime support for pyrmute.
//!
//! - Values, plain and persistent ([`value`])
//! - Fallback update functions and the evolved-method table ([`support`])
//! - An evaluator for module-level code ([`interp`])

pub mod error;
pub mod interp;
pub mod support;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use interp::Interpreter;
pub use support::{
    call_method, construct_mapping, construct_sequence, construct_set, construct_slice,
    del_attr_with_fallback, del_subscript_with_fallback, invoke, set_attr_with_fallback,
    set_subscript_with_fallback, Capability, EvolvedMethodTable, Evolver, TypeTag,
};
pub use value::{Builtin, Key, Object, Record, SliceValue, Value};
