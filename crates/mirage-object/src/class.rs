//! Classes: member tables, method resolution order and instantiation
//!
//! A [`Class`] owns an ordered member table and a linearized method
//! resolution order (C3). Classes are built with [`ClassBuilder`] and may be
//! synthesized at any time at runtime; members can still be added or removed
//! after construction.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{ObjResult, ObjectError};
use crate::function::{Args, Function};
use crate::object::Object;
use crate::ops;
use crate::value::Value;

/// Global counter for generating unique class IDs
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

fn generate_class_id() -> u64 {
    NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed)
}

/// Name under which the documentation string is exposed
pub const DOC: &str = "__doc__";
/// Name under which the declaring module is exposed
pub const MODULE: &str = "__module__";

// ============================================================================
// Member table
// ============================================================================

/// Ordered member table of a single class
#[derive(Debug, Clone, Default)]
pub struct ClassDict {
    /// Members in definition order
    entries: Vec<(Arc<str>, Value)>,
    /// Member name to position mapping
    indices: FxHashMap<Arc<str>, usize>,
}

impl ClassDict {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member; a replaced member keeps its position
    pub fn insert(&mut self, name: Arc<str>, value: Value) {
        if let Some(&index) = self.indices.get(&name) {
            self.entries[index].1 = value;
        } else {
            self.indices.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
        }
    }

    /// Member by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.indices.get(name).map(|&index| &self.entries[index].1)
    }

    /// Remove a member, preserving the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.indices.remove(name)?;
        let (_, value) = self.entries.remove(index);
        for slot in self.indices.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Whether a member exists
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Members in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Class
// ============================================================================

struct ClassInner {
    id: u64,
    name: Arc<str>,
    qualname: Arc<str>,
    module: Option<Arc<str>>,
    doc: Option<Arc<str>>,
    bases: Vec<Class>,
    /// Linearized ancestors, most-derived first, excluding the class itself
    ancestors: Vec<Class>,
    members: RwLock<ClassDict>,
}

/// Shared handle to a class
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    /// Unique class ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Declared name
    pub fn name(&self) -> &Arc<str> {
        &self.inner.name
    }

    /// Qualified name
    pub fn qualname(&self) -> &Arc<str> {
        &self.inner.qualname
    }

    /// Declaring module identifier
    pub fn module(&self) -> Option<&Arc<str>> {
        self.inner.module.as_ref()
    }

    /// Documentation string
    pub fn doc(&self) -> Option<&Arc<str>> {
        self.inner.doc.as_ref()
    }

    /// Direct bases in declaration order
    pub fn bases(&self) -> &[Class] {
        &self.inner.bases
    }

    /// Method resolution order: the class itself, then its ancestors
    pub fn mro(&self) -> Vec<Class> {
        let mut mro = Vec::with_capacity(self.inner.ancestors.len() + 1);
        mro.push(self.clone());
        mro.extend(self.inner.ancestors.iter().cloned());
        mro
    }

    /// Member declared directly on this class
    ///
    /// `__doc__` and `__module__` are answered from the class metadata.
    pub fn own(&self, name: &str) -> Option<Value> {
        match name {
            DOC => Some(self.doc().map_or(Value::None, |doc| Value::Str(doc.clone()))),
            MODULE => self.module().map(|module| Value::Str(module.clone())),
            _ => self.inner.members.read().get(name).cloned(),
        }
    }

    /// Snapshot of the members declared directly on this class, in order
    pub fn own_members(&self) -> Vec<(Arc<str>, Value)> {
        self.inner
            .members
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Resolve a member along the MRO
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.lookup_with_owner(name).map(|(_, value)| value)
    }

    /// Resolve a member along the MRO, returning the declaring class
    pub fn lookup_with_owner(&self, name: &str) -> Option<(Class, Value)> {
        if let Some(value) = self.own(name) {
            return Some((self.clone(), value));
        }
        self.inner
            .ancestors
            .iter()
            .find_map(|class| class.own(name).map(|value| (class.clone(), value)))
    }

    /// Insert or replace a member on this class
    pub fn set_member(&self, name: &str, value: Value) {
        self.inner.members.write().insert(Arc::from(name), value);
    }

    /// Remove a member declared on this class
    pub fn remove_member(&self, name: &str) -> Option<Value> {
        self.inner.members.write().remove(name)
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ptr_eq(other) || self.inner.ancestors.iter().any(|class| class.ptr_eq(other))
    }

    /// Create an instance without running any initializer
    pub fn allocate(&self) -> Object {
        Object::new(self.clone(), None)
    }

    /// Create an instance carrying an opaque native payload
    pub fn allocate_with_payload(&self, payload: Arc<dyn Any + Send + Sync>) -> Object {
        Object::new(self.clone(), Some(payload))
    }

    /// Create an instance and run `__init__` if the MRO defines one
    pub fn instantiate(&self, args: Args) -> ObjResult<Value> {
        let instance = Value::Object(self.allocate());
        match self.lookup("__init__") {
            Some(init) => {
                let result = ops::call(&init, args.prepend(instance.clone()))?;
                if !result.is_none() {
                    return Err(ObjectError::TypeError(format!(
                        "__init__() should return None, not '{}'",
                        result.type_name()
                    )));
                }
            }
            None if !args.is_empty() => {
                return Err(ObjectError::TypeError(format!(
                    "{}() takes no arguments",
                    self.name()
                )));
            }
            None => {}
        }
        tracing::trace!(class = %self.name(), "instantiated");
        Ok(instance)
    }

    /// Whether two handles refer to the same class
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.inner.qualname)
    }
}

/// C3 linearization of the given bases
fn linearize(bases: &[Class]) -> ObjResult<Vec<Class>> {
    let mut sequences: Vec<Vec<Class>> = bases.iter().map(Class::mro).collect();
    sequences.push(bases.to_vec());

    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        let next = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|head| {
                !sequences
                    .iter()
                    .any(|seq| seq[1..].iter().any(|class| class.ptr_eq(head)))
            })
            .cloned();

        let Some(next) = next else {
            let names: Vec<&str> = bases.iter().map(|base| base.name().as_ref()).collect();
            return Err(ObjectError::TypeError(format!(
                "Cannot create a consistent method resolution order (MRO) for bases {}",
                names.join(", ")
            )));
        };

        for seq in sequences.iter_mut() {
            if seq[0].ptr_eq(&next) {
                seq.remove(0);
            }
        }
        result.push(next);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for creating classes at runtime
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: Arc<str>,
    qualname: Option<Arc<str>>,
    module: Option<Arc<str>>,
    doc: Option<Arc<str>>,
    bases: Vec<Class>,
    members: ClassDict,
}

impl ClassBuilder {
    /// Start a class named `name`
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            qualname: None,
            module: None,
            doc: None,
            bases: Vec::new(),
            members: ClassDict::new(),
        }
    }

    /// Set the declared name
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the qualified name (defaults to the declared name)
    pub fn qualname(mut self, qualname: impl Into<Arc<str>>) -> Self {
        self.qualname = Some(qualname.into());
        self
    }

    /// Set the declaring module identifier
    pub fn module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Set the documentation string
    pub fn doc(mut self, doc: impl Into<Arc<str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Append a direct base
    pub fn base(mut self, base: &Class) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Define a method from a closure
    pub fn method<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(Args) -> ObjResult<Value> + Send + Sync + 'static,
    {
        self.function(Function::new(name, func))
    }

    /// Define a method from an existing function, under the function's name
    pub fn function(mut self, function: Function) -> Self {
        self.members
            .insert(function.name().clone(), Value::Function(function));
        self
    }

    /// Define a class-level attribute
    pub fn attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.members.insert(Arc::from(name), value.into());
        self
    }

    /// Finish the class, computing its method resolution order
    pub fn build(self) -> ObjResult<Class> {
        for (i, base) in self.bases.iter().enumerate() {
            if self.bases[..i].iter().any(|seen| seen.ptr_eq(base)) {
                return Err(ObjectError::TypeError(format!(
                    "duplicate base class {}",
                    base.name()
                )));
            }
        }
        let ancestors = linearize(&self.bases)?;
        let qualname = self.qualname.unwrap_or_else(|| self.name.clone());

        tracing::trace!(
            class = %self.name,
            members = self.members.len(),
            ancestors = ancestors.len(),
            "class built"
        );

        Ok(Class {
            inner: Arc::new(ClassInner {
                id: generate_class_id(),
                name: self.name,
                qualname,
                module: self.module,
                doc: self.doc,
                bases: self.bases,
                ancestors,
                members: RwLock::new(self.members),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, bases: &[&Class]) -> Class {
        bases
            .iter()
            .fold(ClassBuilder::new(name), |builder, base| builder.base(base))
            .build()
            .unwrap()
    }

    fn names(mro: &[Class]) -> Vec<String> {
        mro.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_single_inheritance_chain() {
        let animal = class("Animal", &[]);
        let dog = class("Dog", &[&animal]);
        let labrador = class("Labrador", &[&dog]);

        assert_eq!(names(&labrador.mro()), ["Labrador", "Dog", "Animal"]);
        assert!(labrador.is_subclass_of(&animal));
        assert!(!animal.is_subclass_of(&dog));
    }

    #[test]
    fn test_diamond_mro() {
        let a = class("A", &[]);
        let b = class("B", &[&a]);
        let c = class("C", &[&a]);
        let d = class("D", &[&b, &c]);

        assert_eq!(names(&d.mro()), ["D", "B", "C", "A"]);
    }

    #[test]
    fn test_inconsistent_mro() {
        let a = class("A", &[]);
        let b = class("B", &[&a]);
        let err = ClassBuilder::new("X").base(&a).base(&b).build().unwrap_err();
        assert!(err.to_string().starts_with("Cannot create a consistent method resolution order"));
    }

    #[test]
    fn test_duplicate_base() {
        let a = class("A", &[]);
        let err = ClassBuilder::new("X").base(&a).base(&a).build().unwrap_err();
        assert_eq!(err, ObjectError::TypeError("duplicate base class A".to_string()));
    }

    #[test]
    fn test_lookup_prefers_most_derived() {
        let base = ClassBuilder::new("Base").attribute("tag", "base").attribute("only_base", 1i64).build().unwrap();
        let derived = ClassBuilder::new("Derived").base(&base).attribute("tag", "derived").build().unwrap();

        let (owner, value) = derived.lookup_with_owner("tag").unwrap();
        assert!(owner.ptr_eq(&derived));
        assert_eq!(value, Value::str("derived"));

        let (owner, _) = derived.lookup_with_owner("only_base").unwrap();
        assert!(owner.ptr_eq(&base));
    }

    #[test]
    fn test_metadata_members() {
        let class = ClassBuilder::new("Doc").module("tests").doc("documented").build().unwrap();
        assert_eq!(class.own(DOC), Some(Value::str("documented")));
        assert_eq!(class.own(MODULE), Some(Value::str("tests")));
        assert_eq!(class.qualname().as_ref(), "Doc");
        assert!(class.own_members().is_empty());
    }

    #[test]
    fn test_class_dict_order_after_remove() {
        let mut dict = ClassDict::new();
        dict.insert(Arc::from("a"), Value::Int(1));
        dict.insert(Arc::from("b"), Value::Int(2));
        dict.insert(Arc::from("c"), Value::Int(3));
        dict.insert(Arc::from("a"), Value::Int(10));

        assert_eq!(dict.remove("b"), Some(Value::Int(2)));
        let order: Vec<&str> = dict.iter().map(|(name, _)| name.as_ref()).collect();
        assert_eq!(order, ["a", "c"]);
        assert_eq!(dict.get("c"), Some(&Value::Int(3)));
        assert_eq!(dict.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_instantiate_without_init_rejects_arguments() {
        let plain = class("Plain", &[]);
        let err = plain.instantiate(Args::from(vec![Value::Int(1)])).unwrap_err();
        assert_eq!(err.to_string(), "Plain() takes no arguments");
    }
}
