//! Iterators over runtime values

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ObjResult, ObjectError};
use crate::ops;
use crate::value::Value;

type DynIter = Box<dyn Iterator<Item = ObjResult<Value>> + Send>;

/// A shared, live iterator
///
/// Clones advance the same underlying iterator. Each item is a
/// `Result` so failures raised mid-iteration reach the consumer unchanged.
///
/// The iterator is taken out of its slot while it advances, so user code
/// driving it never runs under the lock. Advancing it again from inside
/// that code yields a `ValueError`.
#[derive(Clone)]
pub struct ValueIter {
    inner: Arc<Mutex<Option<DynIter>>>,
}

impl ValueIter {
    /// Wrap a fallible iterator
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = ObjResult<Value>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::new(iter)))),
        }
    }

    /// Wrap an infallible sequence of values
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::new(values.into_iter().map(Ok))
    }

    /// Whether two handles share the same iterator
    pub fn ptr_eq(&self, other: &ValueIter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Iterator for ValueIter {
    type Item = ObjResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(mut iter) = self.inner.lock().take() else {
            return Some(Err(ObjectError::ValueError(
                "generator already executing".to_string(),
            )));
        };
        let item = iter.next();
        *self.inner.lock() = Some(iter);
        item
    }
}

impl fmt::Debug for ValueIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<iterator>")
    }
}

/// Drives an object implementing `__next__` until `StopIteration`
pub(crate) struct ObjectIterator {
    iterator: Value,
    done: bool,
}

impl ObjectIterator {
    pub(crate) fn new(iterator: Value) -> Self {
        Self {
            iterator,
            done: false,
        }
    }
}

impl Iterator for ObjectIterator {
    type Item = ObjResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match ops::next(&self.iterator) {
            Ok(value) => Some(Ok(value)),
            Err(ObjectError::StopIteration) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Legacy sequence protocol: `__getitem__(0)`, `__getitem__(1)`, ... until
/// `IndexError` or `StopIteration`
pub(crate) struct SequenceIterator {
    sequence: Value,
    index: i64,
    done: bool,
}

impl SequenceIterator {
    pub(crate) fn new(sequence: Value) -> Self {
        Self {
            sequence,
            index: 0,
            done: false,
        }
    }
}

impl Iterator for SequenceIterator {
    type Item = ObjResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match ops::get_item(&self.sequence, &Value::Int(self.index)) {
            Ok(value) => {
                self.index += 1;
                Some(Ok(value))
            }
            Err(ObjectError::IndexError(_)) | Err(ObjectError::StopIteration) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
