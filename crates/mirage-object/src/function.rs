//! Callables: argument packs, native functions and bound methods

use std::fmt;
use std::sync::Arc;

use crate::error::{ObjResult, ObjectError};
use crate::value::Value;

/// Signature of every native callable
pub type NativeFn = dyn Fn(Args) -> ObjResult<Value> + Send + Sync;

/// Positional and keyword arguments of a call, in call order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Positional arguments (the receiver first for method calls)
    pub positional: Vec<Value>,
    /// Keyword arguments in the order they were given
    pub keywords: Vec<(Arc<str>, Value)>,
}

impl Args {
    /// Empty argument pack
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword argument
    pub fn with_keyword(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.keywords.push((Arc::from(name), value.into()));
        self
    }

    /// Insert a receiver before the positional arguments
    pub fn prepend(mut self, receiver: Value) -> Self {
        self.positional.insert(0, receiver);
        self
    }

    /// Split off the receiver, leaving the remaining arguments untouched
    pub fn split_receiver(mut self) -> ObjResult<(Value, Args)> {
        if self.positional.is_empty() {
            return Err(ObjectError::TypeError(
                "method called without a receiver".to_string(),
            ));
        }
        let receiver = self.positional.remove(0);
        Ok((receiver, self))
    }

    /// The receiver of a method call
    pub fn receiver(&self) -> ObjResult<&Value> {
        self.positional.first().ok_or_else(|| {
            ObjectError::TypeError("method called without a receiver".to_string())
        })
    }

    /// Positional argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Positional argument at `index`, failing with a `TypeError` naming `name`
    pub fn arg(&self, index: usize, name: &str) -> ObjResult<&Value> {
        self.positional.get(index).ok_or_else(|| {
            ObjectError::TypeError(format!("missing required argument: '{}'", name))
        })
    }

    /// String positional argument at `index`
    pub fn str_arg(&self, index: usize, name: &str) -> ObjResult<Arc<str>> {
        match self.arg(index, name)? {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ObjectError::TypeError(format!(
                "argument '{}' must be str, not {}",
                name,
                other.type_name()
            ))),
        }
    }

    /// Keyword argument by name
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value)
    }

    /// Number of positional arguments
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Whether there are no positional and no keyword arguments
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }
}

impl From<Vec<Value>> for Args {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: Vec::new(),
        }
    }
}

/// A named native callable
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    doc: Option<Arc<str>>,
    func: Arc<NativeFn>,
}

impl Function {
    /// Wrap a closure as a function named `name`
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(Args) -> ObjResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            func: Arc::new(func),
        }
    }

    /// Attach a documentation string
    pub fn with_doc(mut self, doc: impl Into<Arc<str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Function name
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Documentation string, if any
    pub fn doc(&self) -> Option<&Arc<str>> {
        self.doc.as_ref()
    }

    /// Invoke the function
    pub fn call(&self, args: Args) -> ObjResult<Value> {
        (self.func)(args)
    }

    /// Whether two handles share the same callable
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// A function bound to a receiver
#[derive(Debug, Clone)]
pub struct BoundMethod {
    /// The receiver passed as the first positional argument
    pub receiver: Box<Value>,
    /// The underlying function
    pub function: Function,
}

impl BoundMethod {
    /// Bind `function` to `receiver`
    pub fn new(receiver: Value, function: Function) -> Self {
        Self {
            receiver: Box::new(receiver),
            function,
        }
    }

    /// Call with the receiver prepended
    pub fn call(&self, args: Args) -> ObjResult<Value> {
        self.function.call(args.prepend((*self.receiver).clone()))
    }
}
