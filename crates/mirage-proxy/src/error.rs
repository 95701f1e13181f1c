//! Error types for proxy construction

use mirage_object::ObjectError;

/// Result type for proxy construction
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Failures local to building a proxy
///
/// Failures raised by the target while the proxy is in use are never
/// wrapped; they reach the caller as the target's own [`ObjectError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProxyError {
    /// The target has no introspectable class to mirror
    #[error("cannot proxy '{type_name}': {reason}")]
    Construction {
        /// Type name of the rejected target
        type_name: String,
        /// Why the target was rejected
        reason: String,
    },

    /// The object model rejected the synthesized proxy type
    #[error(transparent)]
    Object(#[from] ObjectError),
}

impl ProxyError {
    /// Target rejected before any type was synthesized
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProxyError::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
