// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime values.
//!
//! Plain mutable containers are shared through `Rc<RefCell<_>>`, so an
//! in-place update is visible through every alias. Persistent containers
//! are rpds structures: every update returns a new value sharing structure
//! with the old one, and the old one is never changed.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use rpds::{RedBlackTreeMap, RedBlackTreeSet, Vector};

use crate::error::{RuntimeError, RuntimeResult};

// ============================================================================
// Keys
// ============================================================================

/// A hashable value, usable as a mapping key or set member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Tuple(Vec<Key>),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::None => Value::None,
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(s.clone()),
            Key::Tuple(items) => Value::Tuple(items.iter().map(Key::to_value).collect()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

// ============================================================================
// Values
// ============================================================================

/// Bounds of a slice; `None` is an omitted bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceValue {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
    pub step: Option<i64>,
}

/// A plain mutable attribute bag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub class: String,
    pub fields: BTreeMap<String, Value>,
}

/// A persistent attribute record. Like a persistent map keyed by field
/// name, it also answers subscripts.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class: String,
    pub fields: RedBlackTreeMap<String, Value>,
}

/// Functions provided by the runtime and the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    SetAttr,
    SetSubscript,
    DelAttr,
    DelSubscript,
    Invoke,
    PMap,
    PVector,
    PSet,
    Slice,
    Object,
    Record,
    Len,
    Trace,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::SetAttr => "set_attr_with_fallback",
            Builtin::SetSubscript => "set_subscript_with_fallback",
            Builtin::DelAttr => "del_attr_with_fallback",
            Builtin::DelSubscript => "del_subscript_with_fallback",
            Builtin::Invoke => "invoke",
            Builtin::PMap => "pmap",
            Builtin::PVector => "pvector",
            Builtin::PSet => "pset",
            Builtin::Slice => "slice",
            Builtin::Object => "Object",
            Builtin::Record => "Record",
            Builtin::Len => "len",
            Builtin::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    Slice(SliceValue),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<BTreeMap<Key, Value>>>),
    Set(Rc<RefCell<BTreeSet<Key>>>),
    Object(Rc<RefCell<Object>>),
    PVector(Vector<Value>),
    PMap(RedBlackTreeMap<Key, Value>),
    PSet(RedBlackTreeSet<Key>),
    Record(Record),
    Builtin(Builtin),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn dict(entries: impl IntoIterator<Item = (Key, Value)>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    pub fn object(class: &str, fields: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Object(Rc::new(RefCell::new(Object {
            class: class.to_string(),
            fields: fields.into_iter().collect(),
        })))
    }

    pub fn pvector(items: impl IntoIterator<Item = Value>) -> Value {
        Value::PVector(items.into_iter().collect())
    }

    pub fn pmap(entries: impl IntoIterator<Item = (Key, Value)>) -> Value {
        Value::PMap(entries.into_iter().collect())
    }

    pub fn pset(items: impl IntoIterator<Item = Key>) -> Value {
        Value::PSet(items.into_iter().collect())
    }

    pub fn record(class: &str, fields: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Record(Record {
            class: class.to_string(),
            fields: fields.into_iter().collect(),
        })
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Slice(_) => "slice".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Object(obj) => obj.borrow().class.clone(),
            Value::PVector(_) => "PVector".to_string(),
            Value::PMap(_) => "PMap".to_string(),
            Value::PSet(_) => "PSet".to_string(),
            Value::Record(record) => record.class.clone(),
            Value::Builtin(_) => "builtin_function".to_string(),
        }
    }

    pub fn to_key(&self) -> RuntimeResult<Key> {
        match self {
            Value::None => Ok(Key::None),
            Value::Bool(b) => Ok(Key::Bool(*b)),
            Value::Int(i) => Ok(Key::Int(*i)),
            Value::Str(s) => Ok(Key::Str(s.clone())),
            Value::Tuple(items) => Ok(Key::Tuple(
                items.iter().map(Value::to_key).collect::<RuntimeResult<_>>()?,
            )),
            other => Err(RuntimeError::type_error(format!(
                "unhashable type: '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn as_int(&self) -> RuntimeResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(RuntimeError::type_error(format!(
                "expected an integer, got '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn as_str(&self) -> RuntimeResult<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::type_error(format!(
                "expected a string, got '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::Set(items) => !items.borrow().is_empty(),
            Value::PVector(v) => !v.is_empty(),
            Value::PMap(m) => !m.is_empty(),
            Value::PSet(s) => !s.is_empty(),
            Value::Slice(_) | Value::Object(_) | Value::Record(_) | Value::Builtin(_) => true,
        }
    }

    /// The items produced by iterating the value; mappings yield keys.
    pub fn iterate(&self) -> RuntimeResult<Vec<Value>> {
        Ok(match self {
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            Value::Tuple(items) => items.clone(),
            Value::List(items) => items.borrow().clone(),
            Value::Dict(entries) => entries.borrow().keys().map(Key::to_value).collect(),
            Value::Set(items) => items.borrow().iter().map(Key::to_value).collect(),
            Value::PVector(v) => v.iter().cloned().collect(),
            Value::PMap(m) => m.keys().map(Key::to_value).collect(),
            Value::PSet(s) => s.iter().map(Key::to_value).collect(),
            Value::Record(r) => r.fields.keys().map(|k| Value::Str(k.clone())).collect(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
        })
    }

    /// Key/value pairs of a mapping value.
    pub fn entries(&self) -> RuntimeResult<Vec<(Key, Value)>> {
        Ok(match self {
            Value::Dict(entries) => entries
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Value::PMap(m) => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Value::Record(r) => r
                .fields
                .iter()
                .map(|(k, v)| (Key::Str(k.clone()), v.clone()))
                .collect(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object is not a mapping",
                    other.type_name()
                )))
            }
        })
    }

    pub fn length(&self) -> RuntimeResult<usize> {
        Ok(match self {
            Value::Str(s) => s.chars().count(),
            Value::Tuple(items) => items.len(),
            Value::List(items) => items.borrow().len(),
            Value::Dict(entries) => entries.borrow().len(),
            Value::Set(items) => items.borrow().len(),
            Value::PVector(v) => v.len(),
            Value::PMap(m) => m.size(),
            Value::PSet(s) => s.size(),
            Value::Record(r) => r.fields.size(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "object of type '{}' has no len()",
                    other.type_name()
                )))
            }
        })
    }

    /// True when both values are the same object: identical plain
    /// containers, or equal immutable values.
    pub fn is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

// ============================================================================
// Indexing
// ============================================================================

/// Resolve a possibly negative index against a length.
pub(crate) fn resolve_index(index: i64, len: usize) -> RuntimeResult<usize> {
    let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { index + signed_len } else { index };
    if resolved < 0 || resolved >= signed_len {
        return Err(RuntimeError::Index { index, len });
    }
    usize::try_from(resolved).map_err(|_| RuntimeError::Index { index, len })
}

/// The positions a slice selects from a sequence of `len` items, in order.
pub(crate) fn slice_positions(slice: &SliceValue, len: usize) -> RuntimeResult<Vec<usize>> {
    let step = slice.step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::type_error("slice step cannot be zero"));
    }
    let n = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + n } else { bound };
        bound.clamp(low, high)
    };
    let mut positions = Vec::new();
    if step > 0 {
        let start = slice.lower.map_or(0, |b| clamp(b, 0, n));
        let stop = slice.upper.map_or(n, |b| clamp(b, 0, n));
        let mut i = start;
        while i < stop {
            positions.push(i);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let start = slice.lower.map_or(n - 1, |b| clamp(b, -1, n - 1));
        let stop = slice.upper.map_or(-1, |b| clamp(b, -1, n - 1));
        let mut i = start;
        while i > stop {
            positions.push(i);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    Ok(positions
        .into_iter()
        .filter_map(|i| usize::try_from(i).ok())
        .collect())
}

// ============================================================================
// Display
// ============================================================================

fn join<T>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    each: impl Fn(&mut fmt::Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_value().fmt(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Tuple(items) => {
                f.write_str("(")?;
                join(f, items, |f, v| write!(f, "{}", v))?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Slice(s) => {
                let bound = |b: Option<i64>| b.map_or("None".to_string(), |b| b.to_string());
                write!(f, "slice({}, {}, {})", bound(s.lower), bound(s.upper), bound(s.step))
            }
            Value::List(items) => {
                f.write_str("[")?;
                join(f, items.borrow().iter(), |f, v| write!(f, "{}", v))?;
                f.write_str("]")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                join(f, entries.borrow().iter(), |f, (k, v)| write!(f, "{}: {}", k, v))?;
                f.write_str("}")
            }
            Value::Set(items) => {
                if items.borrow().is_empty() {
                    return f.write_str("set()");
                }
                f.write_str("{")?;
                join(f, items.borrow().iter(), |f, k| write!(f, "{}", k))?;
                f.write_str("}")
            }
            Value::Object(obj) => {
                let obj = obj.borrow();
                write!(f, "{}(", obj.class)?;
                join(f, obj.fields.iter(), |f, (k, v)| write!(f, "{}={}", k, v))?;
                f.write_str(")")
            }
            Value::PVector(v) => {
                f.write_str("pvector([")?;
                join(f, v.iter(), |f, item| write!(f, "{}", item))?;
                f.write_str("])")
            }
            Value::PMap(m) => {
                f.write_str("pmap({")?;
                join(f, m.iter(), |f, (k, v)| write!(f, "{}: {}", k, v))?;
                f.write_str("})")
            }
            Value::PSet(s) => {
                f.write_str("pset([")?;
                join(f, s.iter(), |f, k| write!(f, "{}", k))?;
                f.write_str("])")
            }
            Value::Record(r) => {
                write!(f, "{}(", r.class)?;
                join(f, r.fields.iter(), |f, (k, v)| write!(f, "{}={}", k, v))?;
                f.write_str(")")
            }
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_containers_share_updates() {
        let list = Value::list([Value::Int(1)]);
        let alias = list.clone();
        if let Value::List(items) = &list {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(alias.length().unwrap(), 2);
        assert!(list.is(&alias));
    }

    #[test]
    fn persistent_updates_leave_original() {
        let Value::PVector(v) = Value::pvector([Value::Int(1)]) else {
            panic!("not a vector");
        };
        let grown = v.push_back(Value::Int(2));
        assert_eq!(v.len(), 1);
        assert_eq!(grown.len(), 2);
    }

    #[test]
    fn slice_positions_follow_python() {
        let s = |lower, upper, step| SliceValue { lower, upper, step };
        assert_eq!(slice_positions(&s(None, Some(5), Some(2)), 10).unwrap(), vec![0, 2, 4]);
        assert_eq!(slice_positions(&s(Some(-2), None, None), 4).unwrap(), vec![2, 3]);
        assert_eq!(slice_positions(&s(None, None, Some(-1)), 3).unwrap(), vec![2, 1, 0]);
        assert!(slice_positions(&s(None, None, Some(0)), 3).is_err());
        assert_eq!(slice_positions(&s(Some(1), Some(5), Some(i64::MAX)), 10).unwrap(), vec![1]);
        assert_eq!(slice_positions(&s(Some(2), None, Some(i64::MIN)), 10).unwrap(), vec![2]);
    }

    #[test]
    fn negative_indices_resolve() {
        assert_eq!(resolve_index(-1, 3).unwrap(), 2);
        assert!(matches!(resolve_index(3, 3), Err(RuntimeError::Index { .. })));
    }

    #[test]
    fn display_is_python_like() {
        let record = Value::record("Simple", [("attr".to_string(), Value::pvector([Value::Int(1)]))]);
        assert_eq!(record.to_string(), "Simple(attr=pvector([1]))");
        assert_eq!(Value::pmap([(Key::from("a"), Value::str("b"))]).to_string(), "pmap({'a': 'b'})");
        assert_eq!(Value::Tuple(vec![Value::None]).to_string(), "(None,)");
    }

    #[test]
    fn unhashable_values_are_rejected() {
        assert!(Value::list(Vec::new()).to_key().is_err());
        assert_eq!(
            Value::Tuple(vec![Value::Int(1), Value::str("a")]).to_key().unwrap(),
            Key::Tuple(vec![Key::Int(1), Key::from("a")])
        );
    }
}
