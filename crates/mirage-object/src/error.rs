//! Error types for the object model

/// Result type for object model operations
pub type ObjResult<T> = Result<T, ObjectError>;

/// Failures raised by attribute access, calls and protocol operations.
///
/// Every variant maps onto a host exception kind (see [`ObjectError::kind_name`]).
/// Failures raised by user-defined methods use [`ObjectError::Raised`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectError {
    /// Attribute lookup, store or delete rejected for a name
    #[error("{message}")]
    AttributeNotFound {
        /// The requested attribute name
        attribute: String,
        /// Rendered message, owner-specific
        message: String,
    },

    /// Operation applied to a value of an inappropriate type
    #[error("{0}")]
    TypeError(String),

    /// Sequence index out of range
    #[error("{0}")]
    IndexError(String),

    /// Mapping key not found
    #[error("{0}")]
    KeyError(String),

    /// Argument of the right type but an inappropriate value
    #[error("{0}")]
    ValueError(String),

    /// Division or modulo by zero
    #[error("division by zero")]
    ZeroDivision,

    /// Iterator exhausted
    #[error("iteration stopped")]
    StopIteration,

    /// A weak reference outlived its referent
    #[error("weakly-referenced '{type_name}' object no longer exists")]
    ReferenceGone {
        /// Type name of the vanished object
        type_name: String,
    },

    /// User-level failure raised by a method
    #[error("{kind}: {message}")]
    Raised {
        /// Exception kind name
        kind: String,
        /// Exception message
        message: String,
    },
}

impl ObjectError {
    /// Attribute missing on an instance of `type_name`
    pub fn no_attribute(type_name: &str, attribute: &str) -> Self {
        ObjectError::AttributeNotFound {
            attribute: attribute.to_string(),
            message: format!("'{}' object has no attribute '{}'", type_name, attribute),
        }
    }

    /// Attribute missing on the class object `class_name` itself
    pub fn no_class_attribute(class_name: &str, attribute: &str) -> Self {
        ObjectError::AttributeNotFound {
            attribute: attribute.to_string(),
            message: format!("type object '{}' has no attribute '{}'", class_name, attribute),
        }
    }

    /// Raise a user-level failure
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ObjectError::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Host exception kind name
    pub fn kind_name(&self) -> &str {
        match self {
            ObjectError::AttributeNotFound { .. } => "AttributeError",
            ObjectError::TypeError(_) => "TypeError",
            ObjectError::IndexError(_) => "IndexError",
            ObjectError::KeyError(_) => "KeyError",
            ObjectError::ValueError(_) => "ValueError",
            ObjectError::ZeroDivision => "ZeroDivisionError",
            ObjectError::StopIteration => "StopIteration",
            ObjectError::ReferenceGone { .. } => "ReferenceError",
            ObjectError::Raised { kind, .. } => kind,
        }
    }

    /// Whether this is an attribute failure
    pub fn is_attribute_error(&self) -> bool {
        matches!(self, ObjectError::AttributeNotFound { .. })
    }
}
