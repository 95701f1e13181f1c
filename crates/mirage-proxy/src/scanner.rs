//! Capability scanner
//!
//! Walks a class's method resolution order and collects the callable
//! members a proxy type has to expose. Resolution follows the MRO: the
//! first class that declares a name owns it, and a non-callable member
//! hides any callable of the same name further up the chain.

use std::sync::Arc;

use mirage_object::{ops, protocol, Class, ProtocolCategory};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::options::ScanMode;

/// How a discovered member is dispatched by the object model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Resolved on the receiver's type by a protocol operation
    Protocol(ProtocolCategory),
    /// One of the attribute read/write/delete hooks
    AttributeHook,
    /// Ordinary method reachable through plain attribute lookup
    Method,
}

impl CapabilityKind {
    fn of(name: &str) -> Self {
        match protocol::classify(name) {
            Some(ProtocolCategory::AttributeAccess) => CapabilityKind::AttributeHook,
            Some(category) => CapabilityKind::Protocol(category),
            None => CapabilityKind::Method,
        }
    }
}

/// A callable member discovered on the target's type chain
#[derive(Debug, Clone)]
pub struct Capability {
    /// Member name
    pub name: Arc<str>,
    /// Class in the MRO that declares the winning definition
    pub declared_by: Class,
    /// Dispatch category
    pub kind: CapabilityKind,
}

/// Capabilities in discovery order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    entries: Vec<Capability>,
    indices: FxHashMap<Arc<str>, usize>,
    data: Vec<Arc<str>>,
}

impl CapabilitySet {
    fn push(&mut self, capability: Capability) {
        self.indices
            .insert(capability.name.clone(), self.entries.len());
        self.entries.push(capability);
    }

    /// Iterate in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }

    /// Capability named `name`
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.indices.get(name).map(|&i| &self.entries[i])
    }

    /// Whether `name` was discovered
    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Number of capabilities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was discovered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capabilities of the given kind
    pub fn of_kind(&self, kind: CapabilityKind) -> impl Iterator<Item = &Capability> {
        self.entries.iter().filter(move |c| c.kind == kind)
    }

    /// Names that resolve to a non-callable member
    pub fn data_members(&self) -> impl Iterator<Item = &Arc<str>> {
        self.data.iter()
    }
}

/// Scan `class` and its ancestors for forwardable callables
///
/// Read-only: neither the class nor any ancestor is modified.
pub fn scan(class: &Class, mode: ScanMode) -> CapabilitySet {
    let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
    let mut set = CapabilitySet::default();

    for owner in class.mro() {
        for (name, member) in owner.own_members() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if !ops::is_callable(&member) {
                set.data.push(name);
                continue;
            }
            let kind = CapabilityKind::of(&name);
            if mode == ScanMode::ProtocolOnly && kind == CapabilityKind::Method {
                continue;
            }
            tracing::trace!(name = %name, owner = %owner.name(), ?kind, "capability found");
            set.push(Capability {
                name,
                declared_by: owner.clone(),
                kind,
            });
        }
    }

    set
}
