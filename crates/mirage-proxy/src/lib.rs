//! Mirage Proxy
//!
//! Transparent forwarding proxies for `mirage-object` instances.
//!
//! Attribute access can be intercepted per instance, but protocol
//! operations (iteration, item access, comparison, arithmetic, context
//! management, calls) are resolved on the receiver's *type*. A proxy that
//! only hooks attribute reads is therefore not iterable even when its
//! target is. [`proxy`] solves this by synthesizing a fresh type for every
//! target:
//!
//! - the [`scanner`] walks the target's method resolution order,
//! - the [`thunk`] generator installs one forwarding function per member,
//! - the [`metadata`] mirror copies name, documentation, module and bases,
//! - the [`delegation`] layer routes attribute reads, writes and deletes to
//!   the target.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirage_object::{attr, ops};
//! use mirage_proxy::proxy;
//!
//! let p = proxy(&target)?;
//! attr::set_attr(&p, "value", Value::Int(9))?;
//! assert_eq!(attr::get_attr(&target, "value")?, Value::Int(9));
//! let items: Vec<Value> = ops::iter(&p)?.collect::<ObjResult<_>>()?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod delegation;
pub mod error;
pub mod factory;
pub mod metadata;
pub mod options;
pub mod scanner;
pub mod thunk;

pub use delegation::ReadHook;
pub use error::{ProxyError, ProxyResult};
pub use factory::{
    is_proxy, proxy, try_unwrap_proxy, unwrap_proxy_deep, unwrap_proxy_target, ProxyFactory,
    UnwrappedProxy,
};
pub use options::{MirrorLevel, ProxyOptions, ScanMode};
pub use scanner::{Capability, CapabilityKind, CapabilitySet};
