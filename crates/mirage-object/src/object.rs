//! Object instances and weak handles

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::Class;
use crate::error::{ObjResult, ObjectError};
use crate::value::Value;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

struct ObjectInner {
    /// Unique object ID (assigned on creation)
    id: u64,
    class: Class,
    /// Per-instance attributes
    attributes: RwLock<FxHashMap<Arc<str>, Value>>,
    /// Opaque data attached by native code
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

/// Shared handle to a class instance
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    pub(crate) fn new(class: Class, payload: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: generate_object_id(),
                class,
                attributes: RwLock::new(FxHashMap::default()),
                payload,
            }),
        }
    }

    /// Unique object ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The class of this instance
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// Instance attribute, bypassing any hooks
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.inner.attributes.read().get(name).cloned()
    }

    /// Store an instance attribute, bypassing any hooks
    pub fn set_attribute(&self, name: &str, value: Value) {
        self.inner.attributes.write().insert(Arc::from(name), value);
    }

    /// Remove an instance attribute, bypassing any hooks
    pub fn remove_attribute(&self, name: &str) -> Option<Value> {
        self.inner.attributes.write().remove(name)
    }

    /// Names of the instance attributes, sorted
    pub fn attribute_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.inner.attributes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Native payload downcast to `T`
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Non-owning handle to this object
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
            class: self.inner.class.clone(),
        }
    }

    /// Whether two handles refer to the same object
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object #{}>", self.inner.class.name(), self.inner.id)
    }
}

/// Non-owning handle to an object
///
/// Holding a `WeakObject` never keeps the object alive.
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
    class: Class,
}

impl WeakObject {
    /// Strong handle, if the object is still alive
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }

    /// Strong handle, or `ReferenceGone` once the object was dropped
    pub fn upgrade_or_gone(&self) -> ObjResult<Object> {
        self.upgrade().ok_or_else(|| ObjectError::ReferenceGone {
            type_name: self.class.name().to_string(),
        })
    }

    /// Class the object was created with
    pub fn class(&self) -> &Class {
        &self.class
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.inner.strong_count() > 0 { "live" } else { "dead" };
        write!(f, "<weakref to '{}' ({})>", self.class.name(), state)
    }
}
