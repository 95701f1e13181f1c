//! Runtime values

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::Class;
use crate::function::{BoundMethod, Function};
use crate::iter::ValueIter;
use crate::object::Object;

/// A runtime value
///
/// Scalars are stored inline; lists, objects, classes and callables are
/// shared handles, so cloning a `Value` never copies object state.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value
    None,
    /// Returned by comparison and arithmetic hooks that decline an operand
    NotImplemented,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Shared mutable list
    List(List),
    /// Immutable tuple
    Tuple(Arc<[Value]>),
    /// Class instance
    Object(Object),
    /// Class (type) object
    Class(Class),
    /// Native function
    Function(Function),
    /// Function bound to a receiver
    BoundMethod(BoundMethod),
    /// Live iterator
    Iterator(ValueIter),
}

impl Value {
    /// Build a string value
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Build a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(List::new(items))
    }

    /// Build a tuple value
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Arc::from(items))
    }

    /// Host-visible type name
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::NotImplemented => "NotImplementedType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Object(obj) => obj.class().name().to_string(),
            Value::Class(_) => "type".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::BoundMethod(_) => "method".to_string(),
            Value::Iterator(_) => "iterator".to_string(),
        }
    }

    /// Whether this is `None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Numeric payload widened to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Class payload
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Identity comparison (`is`)
    ///
    /// Reference values compare by handle, scalars by value.
    pub fn identical(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::None, Value::None) => true,
            (Value::NotImplemented, Value::NotImplemented) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
            (Value::Str(x), Value::Str(y)) => Arc::ptr_eq(x, y),
            (Value::List(x), Value::List(y)) => x.ptr_eq(y),
            (Value::Tuple(x), Value::Tuple(y)) => Arc::ptr_eq(x, y),
            (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
            (Value::Class(x), Value::Class(y)) => x.ptr_eq(y),
            (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
            (Value::BoundMethod(x), Value::BoundMethod(y)) => {
                x.function.ptr_eq(&y.function) && Value::identical(&x.receiver, &y.receiver)
            }
            (Value::Iterator(x), Value::Iterator(y)) => x.ptr_eq(y),
            _ => false,
        }
    }
}

/// Structural equality for scalars, strings and containers; identity for
/// objects, classes and callables. Rich comparison hooks live in
/// [`crate::ops::compare`].
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Int(_) | Value::Float(_) | Value::Bool(_), Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
                match (self.as_int(), other.as_int()) {
                    (Some(x), Some(y)) => x == y,
                    _ => self.as_float() == other.as_float(),
                }
            }
            (Value::Tuple(x), Value::Tuple(y)) => x[..] == y[..],
            (Value::List(x), Value::List(y)) => x.ptr_eq(y) || x.snapshot() == y.snapshot(),
            _ => Value::identical(self, other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::NotImplemented => write!(f, "NotImplemented"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(list) => write_seq(f, "[", &list.snapshot(), "]"),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
            Value::Object(obj) => write!(f, "<{} object #{}>", obj.class().name(), obj.id()),
            Value::Class(class) => write!(f, "<class '{}'>", class.qualname()),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::BoundMethod(bound) => write!(f, "<bound method {}>", bound.function.name()),
            Value::Iterator(_) => write!(f, "<iterator>"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match item {
            Value::Str(s) => write!(f, "'{}'", s)?,
            other => write!(f, "{}", other)?,
        }
    }
    write!(f, "{}", close)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Value::Class(class)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

// ============================================================================
// List
// ============================================================================

/// Shared, mutable list storage
#[derive(Debug, Clone, Default)]
pub struct List {
    items: Arc<RwLock<Vec<Value>>>,
}

impl List {
    /// Create a list holding `items`
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Copy of the current elements
    pub fn snapshot(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Element at a normalized index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Replace the element at a normalized index
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Remove the element at a normalized index
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.items.write();
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    /// Append an element
    pub fn push(&self, value: Value) {
        self.items.write().push(value);
    }

    /// Whether two handles share storage
    pub fn ptr_eq(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}
