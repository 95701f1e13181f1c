//! Protocol-dispatched operation names
//!
//! The operations in this table are resolved on the receiver's *type*,
//! never on per-instance attributes: iterating an object whose instance
//! table holds `__iter__` does nothing unless its class defines it too.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Category of a protocol operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolCategory {
    /// `__repr__`, `__str__`, `__format__`
    Representation,
    /// Rich comparison and hashing
    Comparison,
    /// Length, item access, membership
    Container,
    /// `__iter__`, `__next__`, `__reversed__`
    Iteration,
    /// Arithmetic, reflected arithmetic and unary operators
    Numeric,
    /// `__enter__`, `__exit__`
    ContextManager,
    /// `__call__`
    Callable,
    /// Attribute read, write and delete hooks
    AttributeAccess,
    /// Construction and finalization
    Lifecycle,
    /// `__bool__`, `__int__`, `__float__`, `__index__`
    Conversion,
}

/// Attribute read hook consulted for every lookup
pub const GETATTRIBUTE: &str = "__getattribute__";
/// Attribute read fallback consulted when normal lookup fails
pub const GETATTR: &str = "__getattr__";
/// Attribute write hook
pub const SETATTR: &str = "__setattr__";
/// Attribute delete hook
pub const DELATTR: &str = "__delattr__";

const TABLE: &[(&str, ProtocolCategory)] = &[
    ("__repr__", ProtocolCategory::Representation),
    ("__str__", ProtocolCategory::Representation),
    ("__format__", ProtocolCategory::Representation),
    ("__eq__", ProtocolCategory::Comparison),
    ("__ne__", ProtocolCategory::Comparison),
    ("__lt__", ProtocolCategory::Comparison),
    ("__le__", ProtocolCategory::Comparison),
    ("__gt__", ProtocolCategory::Comparison),
    ("__ge__", ProtocolCategory::Comparison),
    ("__hash__", ProtocolCategory::Comparison),
    ("__len__", ProtocolCategory::Container),
    ("__getitem__", ProtocolCategory::Container),
    ("__setitem__", ProtocolCategory::Container),
    ("__delitem__", ProtocolCategory::Container),
    ("__contains__", ProtocolCategory::Container),
    ("__missing__", ProtocolCategory::Container),
    ("__iter__", ProtocolCategory::Iteration),
    ("__next__", ProtocolCategory::Iteration),
    ("__reversed__", ProtocolCategory::Iteration),
    ("__add__", ProtocolCategory::Numeric),
    ("__sub__", ProtocolCategory::Numeric),
    ("__mul__", ProtocolCategory::Numeric),
    ("__truediv__", ProtocolCategory::Numeric),
    ("__floordiv__", ProtocolCategory::Numeric),
    ("__mod__", ProtocolCategory::Numeric),
    ("__radd__", ProtocolCategory::Numeric),
    ("__rsub__", ProtocolCategory::Numeric),
    ("__rmul__", ProtocolCategory::Numeric),
    ("__rtruediv__", ProtocolCategory::Numeric),
    ("__rfloordiv__", ProtocolCategory::Numeric),
    ("__rmod__", ProtocolCategory::Numeric),
    ("__neg__", ProtocolCategory::Numeric),
    ("__pos__", ProtocolCategory::Numeric),
    ("__abs__", ProtocolCategory::Numeric),
    ("__enter__", ProtocolCategory::ContextManager),
    ("__exit__", ProtocolCategory::ContextManager),
    ("__call__", ProtocolCategory::Callable),
    (GETATTRIBUTE, ProtocolCategory::AttributeAccess),
    (GETATTR, ProtocolCategory::AttributeAccess),
    (SETATTR, ProtocolCategory::AttributeAccess),
    (DELATTR, ProtocolCategory::AttributeAccess),
    ("__init__", ProtocolCategory::Lifecycle),
    ("__new__", ProtocolCategory::Lifecycle),
    ("__del__", ProtocolCategory::Lifecycle),
    ("__bool__", ProtocolCategory::Conversion),
    ("__int__", ProtocolCategory::Conversion),
    ("__float__", ProtocolCategory::Conversion),
    ("__index__", ProtocolCategory::Conversion),
];

static PROTOCOL_NAMES: Lazy<FxHashMap<&'static str, ProtocolCategory>> =
    Lazy::new(|| TABLE.iter().copied().collect());

/// Protocol category of `name`, or `None` for ordinary method names
pub fn classify(name: &str) -> Option<ProtocolCategory> {
    PROTOCOL_NAMES.get(name).copied()
}

/// Whether `name` is one of the attribute read/write/delete hooks
pub fn is_attribute_hook(name: &str) -> bool {
    classify(name) == Some(ProtocolCategory::AttributeAccess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("__iter__"), Some(ProtocolCategory::Iteration));
        assert_eq!(classify("__exit__"), Some(ProtocolCategory::ContextManager));
        assert_eq!(classify("__radd__"), Some(ProtocolCategory::Numeric));
        assert_eq!(classify("bar"), None);
        assert_eq!(classify("__custom__"), None);
    }

    #[test]
    fn test_attribute_hooks() {
        assert!(is_attribute_hook(GETATTR));
        assert!(is_attribute_hook(GETATTRIBUTE));
        assert!(is_attribute_hook(SETATTR));
        assert!(is_attribute_hook(DELATTR));
        assert!(!is_attribute_hook("__getitem__"));
    }
}
