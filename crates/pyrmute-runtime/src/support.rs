// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The functions rewritten code calls.
//!
//! Each update function evolves its target when the value supports
//! evolution and mutates it in place otherwise, returning the value the
//! caller must rebind. `invoke` calls a method and returns either the
//! method's result or the receiver, as decided by an [`EvolvedMethodTable`].

use std::collections::BTreeMap;

use rpds::{RedBlackTreeMap, RedBlackTreeSet, Vector};
use tracing::trace;

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{resolve_index, slice_positions, Key, Record, SliceValue, Value};

// ============================================================================
// Capabilities
// ============================================================================

/// How a value accepts updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Updates go through an [`Evolver`] and produce a new value.
    SupportsEvolution,
    /// Updates happen in place, or fail for immutable values.
    PlainMutable,
}

impl Value {
    pub fn capability(&self) -> Capability {
        match self {
            Value::PVector(_) | Value::PMap(_) | Value::PSet(_) | Value::Record(_) => {
                Capability::SupportsEvolution
            }
            _ => Capability::PlainMutable,
        }
    }
}

// ============================================================================
// Evolver
// ============================================================================

#[derive(Debug, Clone)]
enum Staged {
    Vector(Vector<Value>),
    Map(RedBlackTreeMap<Key, Value>),
    Set(RedBlackTreeSet<Key>),
    Record(Record),
}

/// Stages updates to a persistent value; [`Evolver::persistent`] commits
/// them into one new value. The value the evolver was made from is
/// never changed.
#[derive(Debug, Clone)]
pub struct Evolver {
    staged: Staged,
}

impl Evolver {
    pub fn new(value: &Value) -> RuntimeResult<Evolver> {
        let staged = match value {
            Value::PVector(v) => Staged::Vector(v.clone()),
            Value::PMap(m) => Staged::Map(m.clone()),
            Value::PSet(s) => Staged::Set(s.clone()),
            Value::Record(r) => Staged::Record(r.clone()),
            other => {
                return Err(RuntimeError::attribute(other.type_name(), "evolver"));
            }
        };
        Ok(Evolver { staged })
    }

    fn type_name(&self) -> &'static str {
        match &self.staged {
            Staged::Vector(_) => "PVector",
            Staged::Map(_) => "PMap",
            Staged::Set(_) => "PSet",
            Staged::Record(_) => "PRecord",
        }
    }

    /// `value.set(name, item)`: records and maps take the name as a key.
    pub fn set_field(&mut self, name: &str, item: Value) -> RuntimeResult<()> {
        match &mut self.staged {
            Staged::Record(r) => r.fields = r.fields.insert(name.to_string(), item),
            Staged::Map(m) => *m = m.insert(Key::from(name), item),
            Staged::Vector(_) => {
                return Err(RuntimeError::type_error(
                    "PVector indices must be integers, not str",
                ))
            }
            Staged::Set(_) => return Err(RuntimeError::attribute("PSet", "set")),
        }
        Ok(())
    }

    pub fn del_field(&mut self, name: &str) -> RuntimeResult<()> {
        let type_name = self.type_name();
        match &mut self.staged {
            Staged::Record(r) if r.fields.contains_key(name) => {
                r.fields = r.fields.remove(name);
            }
            Staged::Map(m) if m.contains_key(&Key::from(name)) => {
                *m = m.remove(&Key::from(name));
            }
            _ => return Err(RuntimeError::attribute(type_name, name)),
        }
        Ok(())
    }

    pub fn set_item(&mut self, index: &Value, item: Value) -> RuntimeResult<()> {
        match &mut self.staged {
            Staged::Vector(v) => {
                let Value::Int(i) = index else {
                    return Err(RuntimeError::type_error(format!(
                        "PVector indices must be integers, not {}",
                        index.type_name()
                    )));
                };
                let pos = resolve_index(*i, v.len())?;
                *v = v.set(pos, item).ok_or(RuntimeError::Index {
                    index: *i,
                    len: v.len(),
                })?;
            }
            Staged::Map(m) => *m = m.insert(index.to_key()?, item),
            Staged::Record(r) => {
                let name = index.as_str()?.to_string();
                r.fields = r.fields.insert(name, item);
            }
            Staged::Set(_) => {
                return Err(RuntimeError::type_error(
                    "'PSet' object does not support item assignment",
                ))
            }
        }
        Ok(())
    }

    pub fn del_item(&mut self, index: &Value) -> RuntimeResult<()> {
        match &mut self.staged {
            Staged::Vector(v) => {
                let drop = match index {
                    Value::Int(i) => vec![resolve_index(*i, v.len())?],
                    Value::Slice(s) => slice_positions(s, v.len())?,
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "PVector indices must be integers or slices, not {}",
                            other.type_name()
                        )))
                    }
                };
                *v = v
                    .iter()
                    .enumerate()
                    .filter(|(pos, _)| !drop.contains(pos))
                    .map(|(_, item)| item.clone())
                    .collect();
            }
            Staged::Map(m) => {
                let key = index.to_key()?;
                if !m.contains_key(&key) {
                    return Err(RuntimeError::Key(key.to_string()));
                }
                *m = m.remove(&key);
            }
            Staged::Record(r) => {
                let name = index.as_str()?;
                if !r.fields.contains_key(name) {
                    return Err(RuntimeError::Key(index.to_string()));
                }
                r.fields = r.fields.remove(name);
            }
            Staged::Set(_) => {
                return Err(RuntimeError::type_error(
                    "'PSet' object does not support item deletion",
                ))
            }
        }
        Ok(())
    }

    pub fn persistent(self) -> Value {
        match self.staged {
            Staged::Vector(v) => Value::PVector(v),
            Staged::Map(m) => Value::PMap(m),
            Staged::Set(s) => Value::PSet(s),
            Staged::Record(r) => Value::Record(r),
        }
    }
}

// ============================================================================
// In-place updates
// ============================================================================

pub(crate) fn plain_set_attr(obj: &Value, name: &str, item: Value) -> RuntimeResult<()> {
    match obj {
        Value::Object(o) => {
            o.borrow_mut().fields.insert(name.to_string(), item);
            Ok(())
        }
        other => Err(RuntimeError::attribute(other.type_name(), name)),
    }
}

pub(crate) fn plain_del_attr(obj: &Value, name: &str) -> RuntimeResult<()> {
    match obj {
        Value::Object(o) if o.borrow_mut().fields.remove(name).is_some() => Ok(()),
        other => Err(RuntimeError::attribute(other.type_name(), name)),
    }
}

pub(crate) fn plain_set_item(obj: &Value, index: &Value, item: Value) -> RuntimeResult<()> {
    match (obj, index) {
        (Value::List(items), Value::Slice(s)) => {
            let replacement = item.iterate()?;
            let mut items = items.borrow_mut();
            if s.step.unwrap_or(1) == 1 {
                let n = i64::try_from(items.len()).unwrap_or(i64::MAX);
                let bound = |b: Option<i64>, default: i64| {
                    let b = b.map_or(default, |b| if b < 0 { b + n } else { b });
                    usize::try_from(b.clamp(0, n)).unwrap_or(0)
                };
                let start = bound(s.lower, 0);
                let stop = bound(s.upper, n).max(start);
                items.splice(start..stop, replacement);
                return Ok(());
            }
            let positions = slice_positions(s, items.len())?;
            if positions.len() != replacement.len() {
                return Err(RuntimeError::type_error(format!(
                    "attempt to assign sequence of size {} to extended slice of size {}",
                    replacement.len(),
                    positions.len()
                )));
            }
            for (pos, value) in positions.into_iter().zip(replacement) {
                items[pos] = value;
            }
            Ok(())
        }
        (Value::List(items), _) => {
            let mut items = items.borrow_mut();
            let pos = resolve_index(index.as_int()?, items.len())?;
            items[pos] = item;
            Ok(())
        }
        (Value::Dict(entries), _) => {
            entries.borrow_mut().insert(index.to_key()?, item);
            Ok(())
        }
        (other, _) => Err(RuntimeError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

pub(crate) fn plain_del_item(obj: &Value, index: &Value) -> RuntimeResult<()> {
    match (obj, index) {
        (Value::List(items), Value::Slice(s)) => {
            let mut items = items.borrow_mut();
            let drop = slice_positions(s, items.len())?;
            let mut pos = 0;
            items.retain(|_| {
                let keep = !drop.contains(&pos);
                pos += 1;
                keep
            });
            Ok(())
        }
        (Value::List(items), _) => {
            let mut items = items.borrow_mut();
            let pos = resolve_index(index.as_int()?, items.len())?;
            items.remove(pos);
            Ok(())
        }
        (Value::Dict(entries), _) => {
            let key = index.to_key()?;
            match entries.borrow_mut().remove(&key) {
                Some(_) => Ok(()),
                None => Err(RuntimeError::Key(key.to_string())),
            }
        }
        (other, _) => Err(RuntimeError::type_error(format!(
            "'{}' object does not support item deletion",
            other.type_name()
        ))),
    }
}

// ============================================================================
// Fallback functions
// ============================================================================

/// `obj.name = item`, returning the value to rebind `obj` to.
pub fn set_attr_with_fallback(obj: Value, name: &str, item: Value) -> RuntimeResult<Value> {
    match obj.capability() {
        Capability::SupportsEvolution => {
            let mut evolver = Evolver::new(&obj)?;
            evolver.set_field(name, item)?;
            Ok(evolver.persistent())
        }
        Capability::PlainMutable => {
            plain_set_attr(&obj, name, item)?;
            Ok(obj)
        }
    }
}

/// `obj[index] = item`, returning the value to rebind `obj` to.
pub fn set_subscript_with_fallback(obj: Value, index: &Value, item: Value) -> RuntimeResult<Value> {
    match obj.capability() {
        Capability::SupportsEvolution => {
            let mut evolver = Evolver::new(&obj)?;
            evolver.set_item(index, item)?;
            Ok(evolver.persistent())
        }
        Capability::PlainMutable => {
            plain_set_item(&obj, index, item)?;
            Ok(obj)
        }
    }
}

/// `del obj.name`, returning the value to rebind `obj` to.
pub fn del_attr_with_fallback(obj: Value, name: &str) -> RuntimeResult<Value> {
    match obj.capability() {
        Capability::SupportsEvolution => {
            let mut evolver = Evolver::new(&obj)?;
            evolver.del_field(name)?;
            Ok(evolver.persistent())
        }
        Capability::PlainMutable => {
            plain_del_attr(&obj, name)?;
            Ok(obj)
        }
    }
}

/// `del obj[index]`, returning the value to rebind `obj` to.
pub fn del_subscript_with_fallback(obj: Value, index: &Value) -> RuntimeResult<Value> {
    match obj.capability() {
        Capability::SupportsEvolution => {
            let mut evolver = Evolver::new(&obj)?;
            evolver.del_item(index)?;
            Ok(evolver.persistent())
        }
        Capability::PlainMutable => {
            plain_del_item(&obj, index)?;
            Ok(obj)
        }
    }
}

// ============================================================================
// Method table and invoke
// ============================================================================

/// Persistent type families a method may evolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    Bag,
    Class,
    Deque,
    List,
    Map,
    Set,
    Vector,
}

impl Value {
    /// The type families this value belongs to. A record is also a map.
    pub fn type_tags(&self) -> &'static [TypeTag] {
        match self {
            Value::PVector(_) => &[TypeTag::Vector],
            Value::PMap(_) | Value::Record(_) => &[TypeTag::Map],
            Value::PSet(_) => &[TypeTag::Set],
            _ => &[],
        }
    }
}

/// Which (method, type) pairs return the evolved receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolvedMethodTable {
    entries: BTreeMap<String, Vec<TypeTag>>,
}

impl Default for EvolvedMethodTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl EvolvedMethodTable {
    pub fn empty() -> Self {
        EvolvedMethodTable {
            entries: BTreeMap::new(),
        }
    }

    /// The table for the persistent collection family.
    pub fn standard() -> Self {
        use TypeTag as T;
        Self::empty()
            .with("add", &[T::Bag, T::Set])
            .with("append", &[T::Deque, T::Vector])
            .with("appendleft", &[T::Deque])
            .with("cons", &[T::List])
            .with("delete", &[T::Vector])
            .with("difference", &[T::Set])
            .with("discard", &[T::Map, T::Set])
            .with("extend", &[T::Deque, T::Vector])
            .with("extendleft", &[T::Deque])
            .with("intersection", &[T::Set])
            .with("mcons", &[T::List])
            .with("mset", &[T::Vector])
            .with("pop", &[T::Deque])
            .with("popleft", &[T::Deque])
            .with(
                "remove",
                &[T::Bag, T::Class, T::Deque, T::List, T::Map, T::Set, T::Vector],
            )
            .with("reverse", &[T::Deque, T::List])
            .with("rotate", &[T::Deque])
            .with("set", &[T::Class, T::Map, T::Vector])
            .with("symmetric_difference", &[T::Set])
            .with("transform", &[T::Class, T::Map, T::Vector])
            .with("union", &[T::Set])
            .with("update", &[T::Bag, T::Map, T::Set])
            .with("update_with", &[T::Map])
    }

    pub fn with(mut self, method: &str, tags: &[TypeTag]) -> Self {
        self.entries.insert(method.to_string(), tags.to_vec());
        self
    }

    pub fn tags(&self, method: &str) -> &[TypeTag] {
        self.entries.get(method).map_or(&[], Vec::as_slice)
    }

    pub fn returns_evolved(&self, method: &str, receiver: &Value) -> bool {
        let tags = self.tags(method);
        receiver.type_tags().iter().any(|tag| tags.contains(tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Call `obj.method(*args, **kwargs)`; return the result when the table
/// says it is the evolved receiver, and `obj` otherwise.
pub fn invoke(
    table: &EvolvedMethodTable,
    obj: Value,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    let result = call_method(&obj, method, args, kwargs)?;
    if table.returns_evolved(method, &obj) {
        trace!(method, receiver = %obj.type_name(), "invoke returned evolved value");
        Ok(result)
    } else {
        Ok(obj)
    }
}

// ============================================================================
// Methods
// ============================================================================

fn arg_count(
    obj: &Value,
    method: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> RuntimeResult<()> {
    if args.len() < min || args.len() > max {
        return Err(RuntimeError::type_error(format!(
            "{}.{}() takes {} to {} arguments ({} given)",
            obj.type_name(),
            method,
            min,
            max,
            args.len()
        )));
    }
    Ok(())
}

fn no_keywords(obj: &Value, method: &str, kwargs: &[(String, Value)]) -> RuntimeResult<()> {
    match kwargs.first() {
        Some((name, _)) => Err(RuntimeError::type_error(format!(
            "{}.{}() got an unexpected keyword argument '{}'",
            obj.type_name(),
            method,
            name
        ))),
        None => Ok(()),
    }
}

/// Entries for `update(mapping, **kwargs)`.
fn update_entries(args: &[Value], kwargs: Vec<(String, Value)>) -> RuntimeResult<Vec<(Key, Value)>> {
    let mut entries = Vec::new();
    for arg in args {
        entries.extend(arg.entries()?);
    }
    entries.extend(kwargs.into_iter().map(|(k, v)| (Key::Str(k), v)));
    Ok(entries)
}

/// Call a method on a runtime value and return its result.
pub fn call_method(
    obj: &Value,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    match obj {
        Value::PVector(v) => vector_method(obj, v, method, args, kwargs),
        Value::PMap(m) => map_method(obj, m, method, args, kwargs),
        Value::Record(r) => record_method(obj, r, method, args, kwargs),
        Value::PSet(s) => set_method(obj, s, method, args, kwargs),
        Value::List(_) | Value::Dict(_) | Value::Set(_) => plain_method(obj, method, args, kwargs),
        other => Err(RuntimeError::attribute(other.type_name(), method)),
    }
}

fn vector_method(
    obj: &Value,
    v: &Vector<Value>,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    no_keywords(obj, method, &kwargs)?;
    match method {
        "append" => {
            arg_count(obj, method, &args, 1, 1)?;
            Ok(Value::PVector(v.push_back(args[0].clone())))
        }
        "extend" => {
            arg_count(obj, method, &args, 1, 1)?;
            let items = args[0].iterate()?;
            Ok(Value::PVector(
                items.into_iter().fold(v.clone(), |acc, item| acc.push_back(item)),
            ))
        }
        "set" => {
            arg_count(obj, method, &args, 2, 2)?;
            let mut evolver = Evolver::new(obj)?;
            evolver.set_item(&args[0], args[1].clone())?;
            Ok(evolver.persistent())
        }
        "delete" => {
            arg_count(obj, method, &args, 1, 1)?;
            let mut evolver = Evolver::new(obj)?;
            evolver.del_item(&args[0])?;
            Ok(evolver.persistent())
        }
        "remove" => {
            arg_count(obj, method, &args, 1, 1)?;
            let pos = v
                .iter()
                .position(|item| *item == args[0])
                .ok_or_else(|| RuntimeError::Key(args[0].to_string()))?;
            Ok(Value::PVector(
                v.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != pos)
                    .map(|(_, item)| item.clone())
                    .collect(),
            ))
        }
        "index" => {
            arg_count(obj, method, &args, 1, 1)?;
            let pos = v
                .iter()
                .position(|item| *item == args[0])
                .ok_or_else(|| RuntimeError::Key(args[0].to_string()))?;
            Ok(Value::Int(i64::try_from(pos).unwrap_or(i64::MAX)))
        }
        "count" => {
            arg_count(obj, method, &args, 1, 1)?;
            let count = v.iter().filter(|item| **item == args[0]).count();
            Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
        }
        _ => Err(RuntimeError::attribute("PVector", method)),
    }
}

fn map_method(
    obj: &Value,
    m: &RedBlackTreeMap<Key, Value>,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    match method {
        "set" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 2, 2)?;
            Ok(Value::PMap(m.insert(args[0].to_key()?, args[1].clone())))
        }
        "remove" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 1, 1)?;
            let mut evolver = Evolver::new(obj)?;
            evolver.del_item(&args[0])?;
            Ok(evolver.persistent())
        }
        "discard" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 1, 1)?;
            Ok(Value::PMap(m.remove(&args[0].to_key()?)))
        }
        "update" => {
            let entries = update_entries(&args, kwargs)?;
            Ok(Value::PMap(
                entries.into_iter().fold(m.clone(), |acc, (k, v)| acc.insert(k, v)),
            ))
        }
        "get" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 1, 2)?;
            let found = m.get(&args[0].to_key()?).cloned();
            Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
        }
        _ => Err(RuntimeError::attribute("PMap", method)),
    }
}

fn record_method(
    obj: &Value,
    r: &Record,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    match method {
        // `set(name, value)` or `set(name=value, ...)`
        "set" | "update" => {
            let mut evolver = Evolver::new(obj)?;
            if method == "set" && !args.is_empty() {
                arg_count(obj, method, &args, 2, 2)?;
                evolver.set_item(&args[0], args[1].clone())?;
            } else {
                for (key, item) in update_entries(&args, Vec::new())? {
                    evolver.set_item(&key.to_value(), item)?;
                }
            }
            for (name, item) in kwargs {
                evolver.set_field(&name, item)?;
            }
            Ok(evolver.persistent())
        }
        "remove" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 1, 1)?;
            let mut evolver = Evolver::new(obj)?;
            evolver.del_item(&args[0])?;
            Ok(evolver.persistent())
        }
        "get" => {
            no_keywords(obj, method, &kwargs)?;
            arg_count(obj, method, &args, 1, 2)?;
            let found = r.fields.get(args[0].as_str()?).cloned();
            Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
        }
        _ => Err(RuntimeError::attribute(r.class.as_str(), method)),
    }
}

fn set_method(
    obj: &Value,
    s: &RedBlackTreeSet<Key>,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    no_keywords(obj, method, &kwargs)?;
    let keys = |value: &Value| -> RuntimeResult<Vec<Key>> {
        value.iterate()?.iter().map(Value::to_key).collect()
    };
    match method {
        "add" => {
            arg_count(obj, method, &args, 1, 1)?;
            Ok(Value::PSet(s.insert(args[0].to_key()?)))
        }
        "remove" => {
            arg_count(obj, method, &args, 1, 1)?;
            let key = args[0].to_key()?;
            if !s.contains(&key) {
                return Err(RuntimeError::Key(key.to_string()));
            }
            Ok(Value::PSet(s.remove(&key)))
        }
        "discard" => {
            arg_count(obj, method, &args, 1, 1)?;
            Ok(Value::PSet(s.remove(&args[0].to_key()?)))
        }
        "union" | "update" => {
            let mut out = s.clone();
            for arg in &args {
                for key in keys(arg)? {
                    out = out.insert(key);
                }
            }
            Ok(Value::PSet(out))
        }
        "difference" => {
            let mut out = s.clone();
            for arg in &args {
                for key in keys(arg)? {
                    out = out.remove(&key);
                }
            }
            Ok(Value::PSet(out))
        }
        "intersection" => {
            arg_count(obj, method, &args, 1, 1)?;
            let other = keys(&args[0])?;
            Ok(Value::PSet(
                s.iter().filter(|k| other.contains(k)).cloned().collect(),
            ))
        }
        "symmetric_difference" => {
            arg_count(obj, method, &args, 1, 1)?;
            let mut out = s.clone();
            for key in keys(&args[0])? {
                out = if s.contains(&key) {
                    out.remove(&key)
                } else {
                    out.insert(key)
                };
            }
            Ok(Value::PSet(out))
        }
        _ => Err(RuntimeError::attribute("PSet", method)),
    }
}

fn plain_method(
    obj: &Value,
    method: &str,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Value> {
    if method != "update" {
        no_keywords(obj, method, &kwargs)?;
    }
    match (obj, method) {
        (Value::List(items), "append") => {
            arg_count(obj, method, &args, 1, 1)?;
            items.borrow_mut().push(args[0].clone());
            Ok(Value::None)
        }
        (Value::List(items), "extend") => {
            arg_count(obj, method, &args, 1, 1)?;
            let extra = args[0].iterate()?;
            items.borrow_mut().extend(extra);
            Ok(Value::None)
        }
        (Value::List(items), "insert") => {
            arg_count(obj, method, &args, 2, 2)?;
            let mut items = items.borrow_mut();
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let at = args[0].as_int()?;
            let at = if at < 0 { (at + len).max(0) } else { at.min(len) };
            items.insert(usize::try_from(at).unwrap_or(0), args[1].clone());
            Ok(Value::None)
        }
        (Value::List(items), "pop") => {
            arg_count(obj, method, &args, 0, 1)?;
            let mut items = items.borrow_mut();
            let at = match args.first() {
                Some(index) => index.as_int()?,
                None => -1,
            };
            let pos = resolve_index(at, items.len())?;
            Ok(items.remove(pos))
        }
        (Value::List(items), "remove") => {
            arg_count(obj, method, &args, 1, 1)?;
            let mut items = items.borrow_mut();
            let pos = items
                .iter()
                .position(|item| *item == args[0])
                .ok_or_else(|| RuntimeError::Key(args[0].to_string()))?;
            items.remove(pos);
            Ok(Value::None)
        }
        (Value::List(items), "reverse") => {
            arg_count(obj, method, &args, 0, 0)?;
            items.borrow_mut().reverse();
            Ok(Value::None)
        }
        (Value::Dict(entries), "update") => {
            let extra = update_entries(&args, kwargs)?;
            entries.borrow_mut().extend(extra);
            Ok(Value::None)
        }
        (Value::Dict(entries), "get") => {
            arg_count(obj, method, &args, 1, 2)?;
            let found = entries.borrow().get(&args[0].to_key()?).cloned();
            Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::None)))
        }
        (Value::Dict(entries), "pop") => {
            arg_count(obj, method, &args, 1, 2)?;
            let key = args[0].to_key()?;
            let removed = entries.borrow_mut().remove(&key);
            match (removed, args.get(1)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(RuntimeError::Key(key.to_string())),
            }
        }
        (Value::Set(items), "add") => {
            arg_count(obj, method, &args, 1, 1)?;
            items.borrow_mut().insert(args[0].to_key()?);
            Ok(Value::None)
        }
        (Value::Set(items), "discard") => {
            arg_count(obj, method, &args, 1, 1)?;
            items.borrow_mut().remove(&args[0].to_key()?);
            Ok(Value::None)
        }
        (Value::Set(items), "remove") => {
            arg_count(obj, method, &args, 1, 1)?;
            let key = args[0].to_key()?;
            if !items.borrow_mut().remove(&key) {
                return Err(RuntimeError::Key(key.to_string()));
            }
            Ok(Value::None)
        }
        (other, _) => Err(RuntimeError::attribute(other.type_name(), method)),
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// `pmap(mapping)`; with no argument, an empty map.
pub fn construct_mapping(arg: Option<&Value>) -> RuntimeResult<Value> {
    match arg {
        Some(mapping) => Ok(Value::pmap(mapping.entries()?)),
        None => Ok(Value::pmap(Vec::new())),
    }
}

/// `pvector(iterable)`.
pub fn construct_sequence(arg: Option<&Value>) -> RuntimeResult<Value> {
    match arg {
        Some(items) => Ok(Value::pvector(items.iterate()?)),
        None => Ok(Value::pvector(Vec::new())),
    }
}

/// `pset(iterable)`.
pub fn construct_set(arg: Option<&Value>) -> RuntimeResult<Value> {
    let keys = match arg {
        Some(items) => items
            .iterate()?
            .iter()
            .map(Value::to_key)
            .collect::<RuntimeResult<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Value::pset(keys))
}

/// `slice(upper)` or `slice(lower, upper[, step])`.
pub fn construct_slice(args: &[Value]) -> RuntimeResult<Value> {
    let bound = |value: &Value| match value {
        Value::None => Ok(None),
        other => other.as_int().map(Some),
    };
    let slice = match args {
        [upper] => SliceValue {
            upper: bound(upper)?,
            ..SliceValue::default()
        },
        [lower, upper] => SliceValue {
            lower: bound(lower)?,
            upper: bound(upper)?,
            step: None,
        },
        [lower, upper, step] => SliceValue {
            lower: bound(lower)?,
            upper: bound(upper)?,
            step: bound(step)?,
        },
        _ => {
            return Err(RuntimeError::type_error(format!(
                "slice expected 1 to 3 arguments, got {}",
                args.len()
            )))
        }
    };
    Ok(Value::Slice(slice))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(items: &[i64]) -> Value {
        Value::pvector(items.iter().map(|i| Value::Int(*i)))
    }

    #[test]
    fn persistent_set_attr_evolves() {
        let record = Value::record("Simple", [("attr".to_string(), Value::Int(10))]);
        let evolved = set_attr_with_fallback(record.clone(), "attr", Value::Int(5)).unwrap();
        assert_eq!(evolved, Value::record("Simple", [("attr".to_string(), Value::Int(5))]));
        assert_eq!(record, Value::record("Simple", [("attr".to_string(), Value::Int(10))]));
    }

    #[test]
    fn plain_set_attr_mutates_in_place() {
        let obj = Value::object("Object", [("x".to_string(), Value::Int(1))]);
        let out = set_attr_with_fallback(obj.clone(), "x", Value::Int(2)).unwrap();
        assert!(out.is(&obj));
        assert_eq!(obj, Value::object("Object", [("x".to_string(), Value::Int(2))]));
    }

    #[test]
    fn immutable_values_surface_the_error() {
        let err = set_attr_with_fallback(Value::Int(3), "x", Value::None).unwrap_err();
        assert!(matches!(err, RuntimeError::Attribute { .. }));
        let err = set_subscript_with_fallback(Value::str("ab"), &Value::Int(0), Value::None)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)));
    }

    #[test]
    fn subscript_updates_on_both_paths() {
        let map = Value::pmap([(Key::from("a"), Value::str("b"))]);
        let map = set_subscript_with_fallback(map, &Value::str("c"), Value::str("d")).unwrap();
        let map = del_subscript_with_fallback(map, &Value::str("a")).unwrap();
        assert_eq!(map, Value::pmap([(Key::from("c"), Value::str("d"))]));

        let list = Value::list([Value::Int(0), Value::Int(1), Value::Int(2)]);
        let out = del_subscript_with_fallback(list.clone(), &Value::Int(1)).unwrap();
        assert!(out.is(&list));
        assert_eq!(list, Value::list([Value::Int(0), Value::Int(2)]));
    }

    #[test]
    fn vector_slice_deletion() {
        let slice = Value::Slice(SliceValue {
            lower: Some(1),
            upper: Some(3),
            step: None,
        });
        let out = del_subscript_with_fallback(ints(&[0, 1, 2, 3]), &slice).unwrap();
        assert_eq!(out, ints(&[0, 3]));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = del_subscript_with_fallback(Value::pmap(Vec::new()), &Value::str("x")).unwrap_err();
        assert!(matches!(err, RuntimeError::Key(_)));
        let err = del_attr_with_fallback(Value::record("R", Vec::new()), "x").unwrap_err();
        assert!(matches!(err, RuntimeError::Attribute { .. }));
    }

    #[test]
    fn invoke_follows_the_table() {
        let table = EvolvedMethodTable::standard();
        let v = ints(&[1]);
        assert_eq!(
            invoke(&table, v.clone(), "append", vec![Value::Int(2)], Vec::new()).unwrap(),
            ints(&[1, 2])
        );
        // `index` is not an evolving method: the receiver comes back.
        assert_eq!(
            invoke(&table, v.clone(), "index", vec![Value::Int(1)], Vec::new()).unwrap(),
            v
        );
        // Plain lists mutate and are returned as themselves.
        let list = Value::list([Value::Int(1)]);
        let out = invoke(&table, list.clone(), "append", vec![Value::Int(2)], Vec::new()).unwrap();
        assert!(out.is(&list));
        assert_eq!(list.length().unwrap(), 2);
    }

    #[test]
    fn table_is_explicit() {
        let table = EvolvedMethodTable::standard();
        assert_eq!(table.len(), 23);
        assert!(table.returns_evolved("set", &Value::record("R", Vec::new())));
        assert!(!table.returns_evolved("append", &Value::pmap(Vec::new())));

        let empty = EvolvedMethodTable::empty();
        let v = ints(&[1]);
        assert_eq!(
            invoke(&empty, v.clone(), "append", vec![Value::Int(2)], Vec::new()).unwrap(),
            v
        );
    }

    #[test]
    fn set_methods() {
        let s = construct_set(Some(&Value::list([Value::Int(1), Value::Int(2)]))).unwrap();
        let u = call_method(&s, "union", vec![Value::list([Value::Int(3)])], Vec::new()).unwrap();
        assert_eq!(u, Value::pset([Key::Int(1), Key::Int(2), Key::Int(3)]));
        let other = Value::list([Value::Int(1), Value::Int(4)]);
        let d = call_method(&u, "symmetric_difference", vec![other], Vec::new()).unwrap();
        assert_eq!(d, Value::pset([Key::Int(2), Key::Int(3), Key::Int(4)]));
    }

    #[test]
    fn constructors() {
        let dict = Value::dict([(Key::from("a"), Value::Int(1))]);
        assert_eq!(
            construct_mapping(Some(&dict)).unwrap(),
            Value::pmap([(Key::from("a"), Value::Int(1))])
        );
        assert_eq!(construct_sequence(None).unwrap(), Value::pvector(Vec::new()));
        assert_eq!(
            construct_slice(&[Value::None, Value::Int(5), Value::Int(2)]).unwrap(),
            Value::Slice(SliceValue {
                lower: None,
                upper: Some(5),
                step: Some(2)
            })
        );
        assert!(construct_slice(&[]).is_err());
    }
}
