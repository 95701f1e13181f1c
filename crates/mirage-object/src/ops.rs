//! Protocol operations: the type-level dispatch path
//!
//! Every operation here resolves its special method on the receiver's
//! class only (see [`lookup_special`]). Instance attributes and the
//! `__getattr__` fallback are never consulted, so an object that merely
//! *forwards* attribute reads does not thereby become iterable, comparable
//! or callable.

use crate::attr;
use crate::error::{ObjResult, ObjectError};
use crate::function::Args;
use crate::iter::{ObjectIterator, SequenceIterator, ValueIter};
use crate::value::Value;

/// Resolve a special method on the type of `value`
pub fn lookup_special(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Object(obj) => obj.class().lookup(name),
        _ => None,
    }
}

/// Call special method `name` on `receiver`'s type, if it defines one
fn call_special(receiver: &Value, name: &str, args: Vec<Value>) -> Option<ObjResult<Value>> {
    lookup_special(receiver, name)
        .map(|method| call(&method, Args::from(args).prepend(receiver.clone())))
}

// ============================================================================
// Calls
// ============================================================================

/// Call `callee` with `args`
pub fn call(callee: &Value, args: Args) -> ObjResult<Value> {
    match callee {
        Value::Function(function) => function.call(args),
        Value::BoundMethod(bound) => bound.call(args),
        Value::Class(class) => class.instantiate(args),
        Value::Object(_) => match lookup_special(callee, "__call__") {
            Some(method) => call(&method, args.prepend(callee.clone())),
            None => Err(not_callable(callee)),
        },
        other => Err(not_callable(other)),
    }
}

/// Whether `value` can be called
pub fn is_callable(value: &Value) -> bool {
    match value {
        Value::Function(_) | Value::BoundMethod(_) | Value::Class(_) => true,
        Value::Object(_) => lookup_special(value, "__call__").is_some(),
        _ => false,
    }
}

/// Read `name` from `receiver` (through its attribute hooks) and call it
pub fn call_method(receiver: &Value, name: &str, args: Args) -> ObjResult<Value> {
    let method = attr::get_attr(receiver, name)?;
    call(&method, args)
}

fn not_callable(value: &Value) -> ObjectError {
    ObjectError::TypeError(format!("'{}' object is not callable", value.type_name()))
}

// ============================================================================
// Representation and conversion
// ============================================================================

/// `repr(value)`
pub fn repr(value: &Value) -> ObjResult<String> {
    if let Some(result) = call_special(value, "__repr__", Vec::new()) {
        return expect_string(result?, "__repr__");
    }
    Ok(match value {
        Value::Str(s) => format!("'{}'", s),
        other => other.to_string(),
    })
}

/// `str(value)`
pub fn to_str(value: &Value) -> ObjResult<String> {
    if let Some(result) = call_special(value, "__str__", Vec::new()) {
        return expect_string(result?, "__str__");
    }
    match value {
        Value::Object(_) => repr(value),
        other => Ok(other.to_string()),
    }
}

fn expect_string(result: Value, method: &str) -> ObjResult<String> {
    match result {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(ObjectError::TypeError(format!(
            "{} returned non-string (type {})",
            method,
            other.type_name()
        ))),
    }
}

/// `bool(value)`: `__bool__`, then `__len__`, then true
pub fn truthy(value: &Value) -> ObjResult<bool> {
    match value {
        Value::None | Value::NotImplemented => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(x) => Ok(*x != 0.0),
        Value::Str(s) => Ok(!s.is_empty()),
        Value::List(list) => Ok(!list.is_empty()),
        Value::Tuple(items) => Ok(!items.is_empty()),
        Value::Object(_) => {
            if let Some(result) = call_special(value, "__bool__", Vec::new()) {
                return match result? {
                    Value::Bool(b) => Ok(b),
                    other => Err(ObjectError::TypeError(format!(
                        "__bool__ should return bool, returned {}",
                        other.type_name()
                    ))),
                };
            }
            if lookup_special(value, "__len__").is_some() {
                return Ok(len(value)? != 0);
            }
            Ok(true)
        }
        _ => Ok(true),
    }
}

// ============================================================================
// Containers
// ============================================================================

/// `len(value)`
pub fn len(value: &Value) -> ObjResult<usize> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(list) => Ok(list.len()),
        Value::Tuple(items) => Ok(items.len()),
        _ => match call_special(value, "__len__", Vec::new()) {
            Some(result) => match result? {
                Value::Int(n) if n >= 0 => Ok(n as usize),
                Value::Int(_) => Err(ObjectError::ValueError(
                    "__len__() should return >= 0".to_string(),
                )),
                other => Err(ObjectError::TypeError(format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                ))),
            },
            None => Err(ObjectError::TypeError(format!(
                "object of type '{}' has no len()",
                value.type_name()
            ))),
        },
    }
}

/// `container[key]`
pub fn get_item(container: &Value, key: &Value) -> ObjResult<Value> {
    match container {
        Value::List(list) => {
            let index = sequence_index(key, list.len(), "list")?;
            list.get(index)
                .ok_or_else(|| ObjectError::IndexError("list index out of range".to_string()))
        }
        Value::Tuple(items) => {
            let index = sequence_index(key, items.len(), "tuple")?;
            Ok(items[index].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let index = sequence_index(key, chars.len(), "string")?;
            Ok(Value::from(chars[index].to_string()))
        }
        _ => call_special(container, "__getitem__", vec![key.clone()]).unwrap_or_else(|| {
            Err(ObjectError::TypeError(format!(
                "'{}' object is not subscriptable",
                container.type_name()
            )))
        }),
    }
}

/// `container[key] = value`
pub fn set_item(container: &Value, key: &Value, value: Value) -> ObjResult<()> {
    match container {
        Value::List(list) => {
            let index = sequence_index(key, list.len(), "list assignment")?;
            if list.set(index, value) {
                Ok(())
            } else {
                Err(ObjectError::IndexError("list assignment index out of range".to_string()))
            }
        }
        _ => match call_special(container, "__setitem__", vec![key.clone(), value]) {
            Some(result) => result.map(|_| ()),
            None => Err(ObjectError::TypeError(format!(
                "'{}' object does not support item assignment",
                container.type_name()
            ))),
        },
    }
}

/// `del container[key]`
pub fn del_item(container: &Value, key: &Value) -> ObjResult<()> {
    match container {
        Value::List(list) => {
            let index = sequence_index(key, list.len(), "list assignment")?;
            list.remove(index)
                .map(|_| ())
                .ok_or_else(|| ObjectError::IndexError("list assignment index out of range".to_string()))
        }
        _ => match call_special(container, "__delitem__", vec![key.clone()]) {
            Some(result) => result.map(|_| ()),
            None => Err(ObjectError::TypeError(format!(
                "'{}' object doesn't support item deletion",
                container.type_name()
            ))),
        },
    }
}

/// `item in container`: `__contains__`, else a scan of `iter(container)`
pub fn contains(container: &Value, item: &Value) -> ObjResult<bool> {
    if let Some(result) = call_special(container, "__contains__", vec![item.clone()]) {
        return truthy(&result?);
    }
    if let (Value::Str(haystack), Value::Str(needle)) = (container, item) {
        return Ok(haystack.contains(needle.as_ref()));
    }
    for element in iter(container)? {
        if eq(&element?, item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn sequence_index(key: &Value, len: usize, kind: &str) -> ObjResult<usize> {
    let Some(raw) = key.as_int() else {
        return Err(ObjectError::TypeError(format!(
            "{} indices must be integers, not {}",
            kind,
            key.type_name()
        )));
    };
    let index = if raw < 0 { raw + len as i64 } else { raw };
    if index < 0 || index >= len as i64 {
        return Err(ObjectError::IndexError(format!("{} index out of range", kind)));
    }
    Ok(index as usize)
}

// ============================================================================
// Iteration
// ============================================================================

/// `iter(value)`: `__iter__`, else the `__getitem__` sequence protocol
pub fn iter(value: &Value) -> ObjResult<ValueIter> {
    match value {
        Value::List(list) => Ok(ValueIter::from_values(list.snapshot())),
        Value::Tuple(items) => Ok(ValueIter::from_values(items.to_vec())),
        Value::Str(s) => Ok(ValueIter::from_values(
            s.chars().map(|c| Value::from(c.to_string())).collect::<Vec<_>>(),
        )),
        Value::Iterator(it) => Ok(it.clone()),
        Value::Object(_) => {
            if let Some(result) = call_special(value, "__iter__", Vec::new()) {
                return into_iterator(result?);
            }
            if lookup_special(value, "__getitem__").is_some() {
                return Ok(ValueIter::new(SequenceIterator::new(value.clone())));
            }
            Err(not_iterable(value))
        }
        other => Err(not_iterable(other)),
    }
}

fn into_iterator(result: Value) -> ObjResult<ValueIter> {
    match result {
        Value::Iterator(it) => Ok(it),
        Value::Object(_) if lookup_special(&result, "__next__").is_some() => {
            Ok(ValueIter::new(ObjectIterator::new(result)))
        }
        other => Err(ObjectError::TypeError(format!(
            "iter() returned non-iterator of type '{}'",
            other.type_name()
        ))),
    }
}

fn not_iterable(value: &Value) -> ObjectError {
    ObjectError::TypeError(format!("'{}' object is not iterable", value.type_name()))
}

/// `next(iterator)`; exhaustion is reported as `StopIteration`
pub fn next(iterator: &Value) -> ObjResult<Value> {
    match iterator {
        Value::Iterator(it) => it.clone().next().unwrap_or(Err(ObjectError::StopIteration)),
        _ => call_special(iterator, "__next__", Vec::new()).unwrap_or_else(|| {
            Err(ObjectError::TypeError(format!(
                "'{}' object is not an iterator",
                iterator.type_name()
            )))
        }),
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Rich comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Special method implementing the operator
    pub fn dunder(self) -> &'static str {
        match self {
            CompareOp::Eq => "__eq__",
            CompareOp::Ne => "__ne__",
            CompareOp::Lt => "__lt__",
            CompareOp::Le => "__le__",
            CompareOp::Gt => "__gt__",
            CompareOp::Ge => "__ge__",
        }
    }

    /// Operator tried on the right operand with swapped arguments
    pub fn reflected(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }

    /// Source symbol
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Rich comparison: `lhs.__op__(rhs)`, then the reflected operator on
/// `rhs`, then the built-in comparison (identity for `==` / `!=`)
pub fn compare(lhs: &Value, rhs: &Value, op: CompareOp) -> ObjResult<Value> {
    if let Some(result) = call_special(lhs, op.dunder(), vec![rhs.clone()]) {
        let result = result?;
        if !matches!(result, Value::NotImplemented) {
            return Ok(result);
        }
    }
    if let Some(result) = call_special(rhs, op.reflected().dunder(), vec![lhs.clone()]) {
        let result = result?;
        if !matches!(result, Value::NotImplemented) {
            return Ok(result);
        }
    }
    builtin_compare(lhs, rhs, op).map(Value::Bool)
}

/// `lhs == rhs` as a boolean
pub fn eq(lhs: &Value, rhs: &Value) -> ObjResult<bool> {
    truthy(&compare(lhs, rhs, CompareOp::Eq)?)
}

fn builtin_compare(lhs: &Value, rhs: &Value, op: CompareOp) -> ObjResult<bool> {
    use std::cmp::Ordering;

    match op {
        CompareOp::Eq => return Ok(lhs == rhs),
        CompareOp::Ne => return Ok(lhs != rhs),
        _ => {}
    }

    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(ObjectError::TypeError(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    lhs.type_name(),
                    rhs.type_name()
                )))
            }
        },
    };

    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    TrueDiv,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
}

impl BinaryOp {
    /// Special method tried on the left operand
    pub fn dunder(self) -> &'static str {
        match self {
            BinaryOp::Add => "__add__",
            BinaryOp::Sub => "__sub__",
            BinaryOp::Mul => "__mul__",
            BinaryOp::TrueDiv => "__truediv__",
            BinaryOp::FloorDiv => "__floordiv__",
            BinaryOp::Mod => "__mod__",
        }
    }

    /// Special method tried on the right operand
    pub fn reflected_dunder(self) -> &'static str {
        match self {
            BinaryOp::Add => "__radd__",
            BinaryOp::Sub => "__rsub__",
            BinaryOp::Mul => "__rmul__",
            BinaryOp::TrueDiv => "__rtruediv__",
            BinaryOp::FloorDiv => "__rfloordiv__",
            BinaryOp::Mod => "__rmod__",
        }
    }

    /// Source symbol
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::TrueDiv => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }
}

/// `lhs <op> rhs` with reflected fallback
pub fn binary_op(lhs: &Value, rhs: &Value, op: BinaryOp) -> ObjResult<Value> {
    if let Some(result) = call_special(lhs, op.dunder(), vec![rhs.clone()]) {
        let result = result?;
        if !matches!(result, Value::NotImplemented) {
            return Ok(result);
        }
    }
    if let Some(result) = call_special(rhs, op.reflected_dunder(), vec![lhs.clone()]) {
        let result = result?;
        if !matches!(result, Value::NotImplemented) {
            return Ok(result);
        }
    }
    builtin_arith(lhs, rhs, op)
}

fn builtin_arith(lhs: &Value, rhs: &Value, op: BinaryOp) -> ObjResult<Value> {
    match (lhs, rhs, op) {
        (Value::Str(a), Value::Str(b), BinaryOp::Add) => Ok(Value::from(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b), BinaryOp::Add) => {
            let mut items = a.snapshot();
            items.extend(b.snapshot());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b), BinaryOp::Add) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Str(s), Value::Int(n), BinaryOp::Mul) => {
            Ok(Value::from(s.repeat((*n).max(0) as usize)))
        }
        _ => match (lhs.as_int(), rhs.as_int()) {
            (Some(a), Some(b)) if op != BinaryOp::TrueDiv => int_arith(a, b, op),
            _ => match (lhs.as_float(), rhs.as_float()) {
                (Some(a), Some(b)) => float_arith(a, b, op),
                _ => Err(ObjectError::TypeError(format!(
                    "unsupported operand type(s) for {}: '{}' and '{}'",
                    op.symbol(),
                    lhs.type_name(),
                    rhs.type_name()
                ))),
            },
        },
    }
}

fn int_arith(a: i64, b: i64, op: BinaryOp) -> ObjResult<Value> {
    let overflow = || ObjectError::ValueError("integer overflow".to_string());
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if b == 0 {
                return Err(ObjectError::ZeroDivision);
            }
            let quotient = a.checked_div(b).ok_or_else(overflow)?;
            let floored = if a % b != 0 && ((a < 0) != (b < 0)) {
                quotient - 1
            } else {
                quotient
            };
            if op == BinaryOp::FloorDiv {
                floored
            } else {
                a - b * floored
            }
        }
        BinaryOp::TrueDiv => return float_arith(a as f64, b as f64, op),
    };
    Ok(Value::Int(result))
}

fn float_arith(a: f64, b: f64, op: BinaryOp) -> ObjResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::TrueDiv | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(ObjectError::ZeroDivision)
        }
        BinaryOp::TrueDiv => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
    };
    Ok(Value::Float(result))
}

// ============================================================================
// Context management
// ============================================================================

/// Run `body` inside `manager`'s `__enter__` / `__exit__` pair
///
/// `body` receives the value returned by `__enter__`. When `body` fails,
/// `__exit__` receives the failure's kind and message and may suppress it
/// by returning a truthy value, in which case the result is `None`.
pub fn with_context<F>(manager: &Value, body: F) -> ObjResult<Value>
where
    F: FnOnce(Value) -> ObjResult<Value>,
{
    let (Some(enter), Some(exit)) = (
        lookup_special(manager, "__enter__"),
        lookup_special(manager, "__exit__"),
    ) else {
        return Err(ObjectError::TypeError(format!(
            "'{}' object does not support the context manager protocol",
            manager.type_name()
        )));
    };

    let entered = call(&enter, Args::from(vec![manager.clone()]))?;
    match body(entered) {
        Ok(value) => {
            let args = vec![manager.clone(), Value::None, Value::None, Value::None];
            call(&exit, Args::from(args))?;
            Ok(value)
        }
        Err(err) => {
            let args = vec![
                manager.clone(),
                Value::str(err.kind_name()),
                Value::from(err.to_string()),
                Value::None,
            ];
            if truthy(&call(&exit, Args::from(args))?)? {
                Ok(Value::None)
            } else {
                Err(err)
            }
        }
    }
}
