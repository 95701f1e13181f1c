//! Mirage Object Model
//!
//! A small dynamic object system with two dispatch paths:
//! - **Attribute access** (`attr` module): per-instance lookup that can be
//!   intercepted by `__getattribute__`, `__getattr__`, `__setattr__` and
//!   `__delattr__` hooks.
//! - **Protocol operations** (`ops` module): iteration, container access,
//!   comparison, arithmetic, context management and calls, resolved on the
//!   receiver's *type* only.
//!
//! Classes are ordinary runtime values built with [`ClassBuilder`], so new
//! types can be synthesized at any point.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirage_object::{attr, ops, Args, ClassBuilder, Value};
//!
//! let counter = ClassBuilder::new("Counter")
//!     .method("__init__", |args: Args| {
//!         attr::set_attr(args.receiver()?, "count", Value::Int(0))?;
//!         Ok(Value::None)
//!     })
//!     .build()?;
//!
//! let obj = ops::call(&Value::Class(counter), Args::new())?;
//! assert_eq!(attr::get_attr(&obj, "count")?, Value::Int(0));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod attr;
pub mod class;
pub mod error;
pub mod function;
pub mod iter;
pub mod object;
pub mod ops;
pub mod protocol;
pub mod value;

pub use class::{Class, ClassBuilder, ClassDict};
pub use error::{ObjResult, ObjectError};
pub use function::{Args, BoundMethod, Function, NativeFn};
pub use iter::ValueIter;
pub use object::{Object, WeakObject};
pub use ops::{BinaryOp, CompareOp};
pub use protocol::ProtocolCategory;
pub use value::{List, Value};
