// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A small evaluator for module-level code.
//!
//! Executes both the trees handed to the rewrite and the trees it produces,
//! so a rewrite can be checked by running the two and comparing results.
//! Direct mutation (`a.b = v`, `m[k] = v`) follows in-place semantics and
//! fails on persistent values, as it would in the source language.
//!
//! Imports resolve through a registry of dotted paths taken from the
//! rewrite [`Config`], so a rewritten unit's synthesized imports bind the
//! runtime functions defined in [`crate::support`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use pyrmute_core::{
    BoolOperator, CmpOperator, Comprehension, Config, Constant, Expr, ExprKind, Keyword, Module,
    Operator, Stmt, StmtKind, UnaryOperator,
};
use tracing::{debug, trace};

use crate::error::{RuntimeError, RuntimeResult};
use crate::support::{
    call_method, construct_mapping, construct_sequence, construct_set, construct_slice,
    del_attr_with_fallback, del_subscript_with_fallback, invoke, plain_del_attr, plain_del_item,
    plain_set_attr, plain_set_item, set_attr_with_fallback, set_subscript_with_fallback,
    EvolvedMethodTable,
};
use crate::value::{resolve_index, slice_positions, Builtin, Key, SliceValue, Value};

/// Names bound before any code runs.
const PRELUDE: [Builtin; 5] = [
    Builtin::Object,
    Builtin::Record,
    Builtin::Len,
    Builtin::Trace,
    Builtin::Slice,
];

enum Flow {
    Normal,
    Break,
    Continue,
}

pub struct Interpreter {
    globals: BTreeMap<String, Value>,
    registry: BTreeMap<String, Builtin>,
    table: EvolvedMethodTable,
    traced: Vec<Value>,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        let mut registry = BTreeMap::new();
        for (role, path) in config.symbols() {
            let builtin = match role {
                "set_attr" => Builtin::SetAttr,
                "set_subscript" => Builtin::SetSubscript,
                "del_attr" => Builtin::DelAttr,
                "del_subscript" => Builtin::DelSubscript,
                "invoke" => Builtin::Invoke,
                "mapping" => Builtin::PMap,
                "sequence" => Builtin::PVector,
                "set" => Builtin::PSet,
                "slice" => Builtin::Slice,
                _ => continue,
            };
            registry.insert(path.to_string(), builtin);
        }
        let globals = PRELUDE
            .iter()
            .map(|b| (b.name().to_string(), Value::Builtin(*b)))
            .collect();
        Interpreter {
            globals,
            registry,
            table: EvolvedMethodTable::standard(),
            traced: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: EvolvedMethodTable) -> Self {
        self.table = table;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    /// Bound names in order, skipping builtin functions and imported helpers.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.globals
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Builtin(_)))
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Every value passed to `trace`, in evaluation order.
    pub fn traced(&self) -> &[Value] {
        &self.traced
    }

    pub fn run(&mut self, module: &Module) -> RuntimeResult<()> {
        debug!(statements = module.body.len(), "running unit");
        match self.exec_body(&module.body)? {
            Flow::Normal => Ok(()),
            Flow::Break | Flow::Continue => Err(RuntimeError::type_error(
                "'break' or 'continue' outside loop",
            )),
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec_body(&mut self, body: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in body {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        trace!(loc = %stmt.loc, "exec");
        match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }
            StmtKind::AnnAssign {
                target,
                value: Some(value),
                ..
            } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
            }
            StmtKind::AugAssign { target, op, value } => self.aug_assign(target, *op, value)?,
            StmtKind::Delete { targets } => {
                for target in targets {
                    self.delete(target)?;
                }
            }
            StmtKind::Expr { value } => {
                self.eval(value)?;
            }
            StmtKind::If { test, body, orelse } => {
                let branch = if self.eval(test)?.truthy() { body } else { orelse };
                return self.exec_body(branch);
            }
            StmtKind::While { test, body, orelse } => {
                while self.eval(test)?.truthy() {
                    match self.exec_body(body)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                return self.exec_body(orelse);
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async: false,
            } => {
                for item in self.eval(iter)?.iterate()? {
                    self.assign(target, item)?;
                    match self.exec_body(body)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                return self.exec_body(orelse);
            }
            StmtKind::ImportFrom {
                module: Some(module),
                names,
                level: 0,
            } => {
                for alias in names {
                    let path = format!("{}.{}", module, alias.name);
                    let builtin = self
                        .registry
                        .get(&path)
                        .copied()
                        .ok_or(RuntimeError::Import(path))?;
                    self.set(alias.bound_name(), Value::Builtin(builtin));
                }
            }
            StmtKind::Pass => {}
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            other => {
                return Err(RuntimeError::Unsupported(format!(
                    "{} statement",
                    other.node_kind()
                )))
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Expr, value: Value) -> RuntimeResult<()> {
        match &target.kind {
            ExprKind::Name { id, .. } => self.set(id, value),
            ExprKind::Tuple { elts, .. } | ExprKind::List { elts, .. } => {
                let items = value.iterate()?;
                if items.len() != elts.len() {
                    return Err(RuntimeError::type_error(format!(
                        "expected {} values to unpack, got {}",
                        elts.len(),
                        items.len()
                    )));
                }
                for (elt, item) in elts.iter().zip(items) {
                    self.assign(elt, item)?;
                }
            }
            ExprKind::Attribute { value: obj, attr, .. } => {
                let obj = self.eval(obj)?;
                plain_set_attr(&obj, attr, value)?;
            }
            ExprKind::Subscript { value: obj, slice, .. } => {
                let obj = self.eval(obj)?;
                let index = self.eval(slice)?;
                plain_set_item(&obj, &index, value)?;
            }
            other => {
                return Err(RuntimeError::Unsupported(format!(
                    "assignment to {}",
                    other.node_kind()
                )))
            }
        }
        Ok(())
    }

    /// The target is evaluated once; its value is read, combined and stored.
    fn aug_assign(&mut self, target: &Expr, op: Operator, value: &Expr) -> RuntimeResult<()> {
        match &target.kind {
            ExprKind::Name { id, .. } => {
                let current = self.lookup(id)?;
                let rhs = self.eval(value)?;
                let combined = binop(op, &current, &rhs)?;
                self.set(id, combined);
            }
            ExprKind::Attribute { value: obj, attr, .. } => {
                let obj = self.eval(obj)?;
                let current = get_attr(&obj, attr)?;
                let rhs = self.eval(value)?;
                plain_set_attr(&obj, attr, binop(op, &current, &rhs)?)?;
            }
            ExprKind::Subscript { value: obj, slice, .. } => {
                let obj = self.eval(obj)?;
                let index = self.eval(slice)?;
                let current = get_item(&obj, &index)?;
                let rhs = self.eval(value)?;
                plain_set_item(&obj, &index, binop(op, &current, &rhs)?)?;
            }
            other => {
                return Err(RuntimeError::Unsupported(format!(
                    "augmented assignment to {}",
                    other.node_kind()
                )))
            }
        }
        Ok(())
    }

    fn delete(&mut self, target: &Expr) -> RuntimeResult<()> {
        match &target.kind {
            ExprKind::Name { id, .. } => {
                self.globals
                    .remove(id)
                    .ok_or_else(|| RuntimeError::UndefinedName(id.clone()))?;
            }
            ExprKind::Tuple { elts, .. } | ExprKind::List { elts, .. } => {
                for elt in elts {
                    self.delete(elt)?;
                }
            }
            ExprKind::Attribute { value, attr, .. } => {
                let obj = self.eval(value)?;
                plain_del_attr(&obj, attr)?;
            }
            ExprKind::Subscript { value, slice, .. } => {
                let obj = self.eval(value)?;
                let index = self.eval(slice)?;
                plain_del_item(&obj, &index)?;
            }
            other => {
                return Err(RuntimeError::Unsupported(format!(
                    "deletion of {}",
                    other.node_kind()
                )))
            }
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn lookup(&self, name: &str) -> RuntimeResult<Value> {
        self.globals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedName(name.to_string()))
    }

    pub fn eval(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::Constant { value } => constant(value),
            ExprKind::Name { id, .. } => self.lookup(id),
            ExprKind::Attribute { value, attr, .. } => {
                let obj = self.eval(value)?;
                get_attr(&obj, attr)
            }
            ExprKind::Subscript { value, slice, .. } => {
                let obj = self.eval(value)?;
                let index = self.eval(slice)?;
                get_item(&obj, &index)
            }
            ExprKind::Slice { lower, upper, step } => {
                let mut bound = |b: &Option<Box<Expr>>| -> RuntimeResult<Option<i64>> {
                    match b {
                        Some(e) => match self.eval(e)? {
                            Value::None => Ok(None),
                            other => other.as_int().map(Some),
                        },
                        None => Ok(None),
                    }
                };
                Ok(Value::Slice(SliceValue {
                    lower: bound(lower)?,
                    upper: bound(upper)?,
                    step: bound(step)?,
                }))
            }
            ExprKind::ExtSlice { dims } => Ok(Value::Tuple(self.eval_all(dims)?)),
            ExprKind::Call {
                func,
                args,
                keywords,
            } => self.call(func, args, keywords),
            ExprKind::BinOp { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binop(*op, &left, &right)
            }
            ExprKind::UnaryOp { op, operand } => {
                let operand = self.eval(operand)?;
                unary(*op, &operand)
            }
            ExprKind::BoolOp { op, values } => {
                let mut result = Value::Bool(matches!(op, BoolOperator::And));
                for value in values {
                    result = self.eval(value)?;
                    let settled = match op {
                        BoolOperator::And => !result.truthy(),
                        BoolOperator::Or => result.truthy(),
                    };
                    if settled {
                        break;
                    }
                }
                Ok(result)
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut left = self.eval(left)?;
                for (op, right) in ops.iter().zip(comparators) {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::IfExp { test, body, orelse } => {
                if self.eval(test)?.truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
            ExprKind::NamedExpr { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value.clone())?;
                Ok(value)
            }
            ExprKind::Dict { entries } => {
                let mut out = Vec::new();
                for entry in entries {
                    let value = self.eval(&entry.value)?;
                    match &entry.key {
                        Some(key) => out.push((self.eval(key)?.to_key()?, value)),
                        None => out.extend(value.entries()?),
                    }
                }
                Ok(Value::dict(out))
            }
            ExprKind::List { elts, .. } => Ok(Value::list(self.eval_items(elts)?)),
            ExprKind::Tuple { elts, .. } => Ok(Value::Tuple(self.eval_items(elts)?)),
            ExprKind::Set { elts } => {
                let keys = self
                    .eval_items(elts)?
                    .iter()
                    .map(Value::to_key)
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Ok(Value::Set(Rc::new(RefCell::new(
                    keys.into_iter().collect(),
                ))))
            }
            ExprKind::ListComp { elt, generators } | ExprKind::GeneratorExp { elt, generators } => {
                let mut out = Vec::new();
                self.comprehend(generators, &mut |interp| {
                    out.push(interp.eval(elt)?);
                    Ok(())
                })?;
                Ok(Value::list(out))
            }
            ExprKind::SetComp { elt, generators } => {
                let mut out = Vec::new();
                self.comprehend(generators, &mut |interp| {
                    out.push(interp.eval(elt)?.to_key()?);
                    Ok(())
                })?;
                Ok(Value::Set(Rc::new(RefCell::new(
                    out.into_iter().collect(),
                ))))
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                let mut out = Vec::new();
                self.comprehend(generators, &mut |interp| {
                    let k = interp.eval(key)?.to_key()?;
                    out.push((k, interp.eval(value)?));
                    Ok(())
                })?;
                Ok(Value::dict(out))
            }
            other => Err(RuntimeError::Unsupported(format!(
                "{} expression",
                other.node_kind()
            ))),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> RuntimeResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    /// Evaluate display elements, expanding `*iterable`.
    fn eval_items(&mut self, elts: &[Expr]) -> RuntimeResult<Vec<Value>> {
        let mut out = Vec::with_capacity(elts.len());
        for elt in elts {
            match &elt.kind {
                ExprKind::Starred { value, .. } => out.extend(self.eval(value)?.iterate()?),
                _ => out.push(self.eval(elt)?),
            }
        }
        Ok(out)
    }

    fn comprehend(
        &mut self,
        generators: &[Comprehension],
        each: &mut dyn FnMut(&mut Self) -> RuntimeResult<()>,
    ) -> RuntimeResult<()> {
        let Some((first, rest)) = generators.split_first() else {
            return each(self);
        };
        for item in self.eval(&first.iter)?.iterate()? {
            self.assign(&first.target, item)?;
            let mut keep = true;
            for cond in &first.ifs {
                if !self.eval(cond)?.truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.comprehend(rest, each)?;
            }
        }
        Ok(())
    }

    fn call(&mut self, func: &Expr, args: &[Expr], keywords: &[Keyword]) -> RuntimeResult<Value> {
        if let ExprKind::Attribute { value, attr, .. } = &func.kind {
            let receiver = self.eval(value)?;
            let args = self.eval_items(args)?;
            let kwargs = self.eval_keywords(keywords)?;
            return call_method(&receiver, attr, args, kwargs);
        }
        let callee = self.eval(func)?;
        let args = self.eval_items(args)?;
        let kwargs = self.eval_keywords(keywords)?;
        match callee {
            Value::Builtin(builtin) => self.call_builtin(builtin, args, kwargs),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn eval_keywords(&mut self, keywords: &[Keyword]) -> RuntimeResult<Vec<(String, Value)>> {
        let mut out = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let value = self.eval(&keyword.value)?;
            match &keyword.arg {
                Some(name) => out.push((name.clone(), value)),
                None => {
                    for (key, item) in value.entries()? {
                        let Key::Str(name) = key else {
                            return Err(RuntimeError::type_error("keywords must be strings"));
                        };
                        out.push((name, item));
                    }
                }
            }
        }
        Ok(out)
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> RuntimeResult<Value> {
        trace!(function = builtin.name(), args = args.len(), "call");
        let name = builtin.name();
        if !kwargs.is_empty() && !matches!(builtin, Builtin::Invoke | Builtin::Object | Builtin::Record)
        {
            return Err(RuntimeError::type_error(format!(
                "{}() takes no keyword arguments",
                name
            )));
        }
        match builtin {
            Builtin::SetAttr => {
                let [obj, attr, value] = exact(name, args)?;
                set_attr_with_fallback(obj, attr.as_str()?, value)
            }
            Builtin::SetSubscript => {
                let [obj, index, value] = exact(name, args)?;
                set_subscript_with_fallback(obj, &index, value)
            }
            Builtin::DelAttr => {
                let [obj, attr] = exact(name, args)?;
                del_attr_with_fallback(obj, attr.as_str()?)
            }
            Builtin::DelSubscript => {
                let [obj, index] = exact(name, args)?;
                del_subscript_with_fallback(obj, &index)
            }
            Builtin::Invoke => {
                let mut args = args.into_iter();
                let (Some(obj), Some(method)) = (args.next(), args.next()) else {
                    return Err(RuntimeError::type_error(
                        "invoke() needs an object and a method name",
                    ));
                };
                invoke(&self.table, obj, method.as_str()?, args.collect(), kwargs)
            }
            Builtin::PMap => construct_mapping(optional(name, &args)?),
            Builtin::PVector => construct_sequence(optional(name, &args)?),
            Builtin::PSet => construct_set(optional(name, &args)?),
            Builtin::Slice => construct_slice(&args),
            Builtin::Object | Builtin::Record => {
                if !args.is_empty() {
                    return Err(RuntimeError::type_error(format!(
                        "{}() takes keyword arguments only",
                        name
                    )));
                }
                Ok(match builtin {
                    Builtin::Object => Value::object(name, kwargs),
                    _ => Value::record(name, kwargs),
                })
            }
            Builtin::Len => {
                let [value] = exact(name, args)?;
                let len = value.length()?;
                Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
            }
            Builtin::Trace => {
                let [value] = exact(name, args)?;
                self.traced.push(value.clone());
                Ok(value)
            }
        }
    }
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> RuntimeResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| {
        RuntimeError::type_error(format!(
            "{}() takes exactly {} arguments ({} given)",
            name, N, given
        ))
    })
}

fn optional<'a>(name: &str, args: &'a [Value]) -> RuntimeResult<Option<&'a Value>> {
    match args {
        [] => Ok(None),
        [arg] => Ok(Some(arg)),
        _ => Err(RuntimeError::type_error(format!(
            "{}() takes at most 1 argument ({} given)",
            name,
            args.len()
        ))),
    }
}

// ============================================================================
// Operations
// ============================================================================

fn constant(value: &Constant) -> RuntimeResult<Value> {
    Ok(match value {
        Constant::None => Value::None,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(i) => Value::Int(*i),
        Constant::Float(x) => Value::Float(*x),
        Constant::Str(s) => Value::Str(s.clone()),
        Constant::Bytes(_) | Constant::Ellipsis => {
            return Err(RuntimeError::Unsupported(format!("constant {:?}", value)))
        }
    })
}

fn get_attr(obj: &Value, name: &str) -> RuntimeResult<Value> {
    let found = match obj {
        Value::Object(o) => o.borrow().fields.get(name).cloned(),
        Value::Record(r) => r.fields.get(name).cloned(),
        Value::PMap(m) => m.get(&Key::from(name)).cloned(),
        _ => None,
    };
    found.ok_or_else(|| RuntimeError::attribute(obj.type_name(), name))
}

fn get_item(obj: &Value, index: &Value) -> RuntimeResult<Value> {
    let select = |items: &[Value]| -> RuntimeResult<Result<Value, Vec<Value>>> {
        match index {
            Value::Slice(s) => Ok(Err(slice_positions(s, items.len())?
                .into_iter()
                .map(|pos| items[pos].clone())
                .collect())),
            _ => {
                let pos = resolve_index(index.as_int()?, items.len())?;
                Ok(Ok(items[pos].clone()))
            }
        }
    };
    match obj {
        Value::List(items) => {
            let items = items.borrow();
            Ok(select(&items)?.unwrap_or_else(Value::list))
        }
        Value::Tuple(items) => Ok(select(items)?.unwrap_or_else(Value::Tuple)),
        Value::PVector(v) => {
            let items: Vec<Value> = v.iter().cloned().collect();
            Ok(select(&items)?.unwrap_or_else(Value::pvector))
        }
        Value::Str(s) => {
            let chars: Vec<Value> = s.chars().map(|c| Value::Str(c.to_string())).collect();
            Ok(select(&chars)?.unwrap_or_else(|parts| {
                Value::Str(
                    parts
                        .iter()
                        .filter_map(|p| p.as_str().ok())
                        .collect::<String>(),
                )
            }))
        }
        Value::Dict(entries) => {
            let key = index.to_key()?;
            let found = entries.borrow().get(&key).cloned();
            found.ok_or_else(|| RuntimeError::Key(key.to_string()))
        }
        Value::PMap(m) => {
            let key = index.to_key()?;
            m.get(&key)
                .cloned()
                .ok_or_else(|| RuntimeError::Key(key.to_string()))
        }
        Value::Record(r) => r
            .fields
            .get(index.as_str()?)
            .cloned()
            .ok_or_else(|| RuntimeError::Key(index.to_string())),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn overflow() -> RuntimeError {
    RuntimeError::type_error("integer overflow")
}

fn int_op(op: Operator, a: i64, b: i64) -> RuntimeResult<Value> {
    let zero = || RuntimeError::type_error("division by zero");
    let value = match op {
        Operator::Add => a.checked_add(b).ok_or_else(overflow)?,
        Operator::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        Operator::Mult => a.checked_mul(b).ok_or_else(overflow)?,
        Operator::FloorDiv => {
            if b == 0 {
                return Err(zero());
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        Operator::Mod => {
            if b == 0 {
                return Err(zero());
            }
            a.checked_rem(b)
                .map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
                .ok_or_else(overflow)?
        }
        Operator::Div => {
            if b == 0 {
                return Err(zero());
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        Operator::Pow => {
            let exp = u32::try_from(b)
                .map_err(|_| RuntimeError::Unsupported("negative or huge exponent".into()))?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
        Operator::LShift => {
            let shift = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_shl(shift).ok_or_else(overflow)?
        }
        Operator::RShift => {
            let shift = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_shr(shift).ok_or_else(overflow)?
        }
        Operator::BitAnd => a & b,
        Operator::BitOr => a | b,
        Operator::BitXor => a ^ b,
        Operator::MatMult => return Err(RuntimeError::Unsupported("matrix multiply".into())),
    };
    Ok(Value::Int(value))
}

fn binop(op: Operator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    match (op, left, right) {
        (_, Value::Int(a), Value::Int(b)) => int_op(op, *a, *b),
        (Operator::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Operator::Mult, Value::Str(s), Value::Int(n)) => {
            Ok(Value::Str(s.repeat(usize::try_from(*n).unwrap_or(0))))
        }
        (Operator::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (Operator::Add, Value::List(a), Value::List(b)) => {
            let joined: Vec<Value> = a.borrow().iter().chain(b.borrow().iter()).cloned().collect();
            Ok(Value::list(joined))
        }
        (Operator::Add, Value::PVector(v), other) => Ok(Value::PVector(
            other
                .iterate()?
                .into_iter()
                .fold(v.clone(), |acc, item| acc.push_back(item)),
        )),
        (Operator::BitOr, Value::PSet(_), _) => call_method(left, "union", vec![right.clone()], Vec::new()),
        (Operator::Sub, Value::PSet(_), _) => {
            call_method(left, "difference", vec![right.clone()], Vec::new())
        }
        (Operator::BitAnd, Value::PSet(_), _) => {
            call_method(left, "intersection", vec![right.clone()], Vec::new())
        }
        (Operator::BitOr, Value::PMap(_), _) => {
            call_method(left, "update", vec![right.clone()], Vec::new())
        }
        _ => Err(RuntimeError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn unary(op: UnaryOperator, operand: &Value) -> RuntimeResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, value) => Ok(Value::Bool(!value.truthy())),
        (UnaryOperator::USub, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOperator::USub, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOperator::UAdd, Value::Int(_) | Value::Float(_)) => Ok(operand.clone()),
        (UnaryOperator::Invert, Value::Int(i)) => Ok(Value::Int(!i)),
        (_, other) => Err(RuntimeError::type_error(format!(
            "bad operand type for unary operator: '{}'",
            other.type_name()
        ))),
    }
}

fn contains(container: &Value, item: &Value) -> RuntimeResult<bool> {
    Ok(match container {
        Value::Str(s) => s.contains(item.as_str()?),
        Value::Dict(entries) => entries.borrow().contains_key(&item.to_key()?),
        Value::Set(keys) => keys.borrow().contains(&item.to_key()?),
        Value::PMap(m) => m.contains_key(&item.to_key()?),
        Value::PSet(s) => s.contains(&item.to_key()?),
        Value::Record(r) => r.fields.contains_key(item.as_str()?),
        other => other.iterate()?.iter().any(|v| v == item),
    })
}

fn compare(op: CmpOperator, left: &Value, right: &Value) -> RuntimeResult<bool> {
    use std::cmp::Ordering;

    let order = || -> RuntimeResult<Ordering> {
        let ordering = match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        };
        ordering.ok_or_else(|| {
            RuntimeError::type_error(format!(
                "'{}' not supported between '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ))
        })
    };
    Ok(match op {
        CmpOperator::Eq => left == right,
        CmpOperator::NotEq => left != right,
        CmpOperator::Lt => order()? == Ordering::Less,
        CmpOperator::LtE => order()? != Ordering::Greater,
        CmpOperator::Gt => order()? == Ordering::Greater,
        CmpOperator::GtE => order()? != Ordering::Less,
        CmpOperator::Is => left.is(right),
        CmpOperator::IsNot => !left.is(right),
        CmpOperator::In => contains(right, left)?,
        CmpOperator::NotIn => !contains(right, left)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{build, Location};

    fn loc() -> Location {
        Location::new(1, 0)
    }

    fn name(id: &str) -> Expr {
        build::name(id, loc())
    }

    fn run(stmts: Vec<Stmt>) -> Interpreter {
        let mut interp = Interpreter::new(&Config::default());
        interp.run(&Module::new(stmts)).unwrap();
        interp
    }

    #[test]
    fn direct_mutation_of_plain_values() {
        let interp = run(vec![
            build::assign(vec![name("v")], build::list(vec![build::int(1, loc())], loc()), loc()),
            build::expr_stmt(name("v").method("append", vec![build::int(2, loc())]), loc()),
            build::assign(vec![name("v").index(build::int(0, loc()))], build::int(9, loc()), loc()),
        ]);
        assert_eq!(
            interp.get("v"),
            Some(&Value::list([Value::Int(9), Value::Int(2)]))
        );
    }

    #[test]
    fn direct_mutation_of_persistent_values_fails() {
        let mut interp = Interpreter::new(&Config::default());
        interp.set("m", Value::pmap(Vec::new()));
        let stmt = build::assign(
            vec![name("m").index(build::string("k", loc()))],
            build::int(1, loc()),
            loc(),
        );
        let err = interp.run(&Module::new(vec![stmt])).unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)));
    }

    #[test]
    fn imports_resolve_through_the_registry() {
        let import = build::import_from(
            "pyrmute.runtime",
            vec![("set_attr_with_fallback".to_string(), Some("_set".to_string()))],
            loc(),
        );
        let interp = run(vec![import]);
        assert_eq!(interp.get("_set"), Some(&Value::Builtin(Builtin::SetAttr)));

        let mut interp = Interpreter::new(&Config::default());
        let bad = build::import_from("os", vec![("path".to_string(), None)], loc());
        let err = interp.run(&Module::new(vec![bad])).unwrap_err();
        assert_eq!(err, RuntimeError::Import("os.path".to_string()));
    }

    #[test]
    fn trace_records_each_evaluation() {
        let call = name("trace").call(vec![build::int(3, loc())], Vec::new());
        let interp = run(vec![
            build::expr_stmt(call.clone(), loc()),
            build::expr_stmt(call, loc()),
        ]);
        assert_eq!(interp.traced(), &[Value::Int(3), Value::Int(3)]);
    }

    #[test]
    fn slices_and_arithmetic() {
        let values: Vec<Expr> = (0..6).map(|i| build::int(i, loc())).collect();
        let slice = build::slice(None, Some(build::int(5, loc())), Some(build::int(2, loc())), loc());
        let interp = run(vec![
            build::assign(vec![name("x")], build::list(values, loc()), loc()),
            build::assign(vec![name("y")], name("x").index(slice), loc()),
            build::assign(vec![name("n")], build::int(-7, loc()), loc()),
            Stmt::new(
                StmtKind::AugAssign {
                    target: name("n"),
                    op: Operator::FloorDiv,
                    value: build::int(2, loc()),
                },
                loc(),
            ),
        ]);
        assert_eq!(
            interp.get("y"),
            Some(&Value::list([Value::Int(0), Value::Int(2), Value::Int(4)]))
        );
        assert_eq!(interp.get("n"), Some(&Value::Int(-4)));
        assert_eq!(int_op(Operator::Mod, -7, 2).unwrap(), Value::Int(1));
        assert_eq!(int_op(Operator::Mod, 7, -2).unwrap(), Value::Int(-1));
    }

    #[test]
    fn unsupported_constructs_are_reported() {
        let mut interp = Interpreter::new(&Config::default());
        let stmt = Stmt::new(StmtKind::Return { value: None }, loc());
        let err = interp.run(&Module::new(vec![stmt])).unwrap_err();
        assert!(matches!(err, RuntimeError::Unsupported(_)));
    }
}
