//! Generic delegation layer
//!
//! Installs the attribute read, write and delete hooks on a proxy type.
//! Each hook goes through the target's public attribute interface, so hooks
//! the target's own type defines fire exactly once, on the target.
//!
//! Reads come in two flavours. A [`ReadHook::Fallback`] proxy answers names
//! its own type resolves (thunks, metadata) and forwards the rest. A
//! [`ReadHook::Intercept`] proxy forwards every read, which is required
//! whenever the target guards reads with `__getattribute__` or the proxy
//! type inherits members of its own from mirrored bases.

use mirage_object::protocol::{DELATTR, GETATTR, GETATTRIBUTE, SETATTR};
use mirage_object::{attr, Args, ClassBuilder, Function, Value, WeakObject};

use crate::scanner::{CapabilityKind, CapabilitySet};

/// How a proxy type answers attribute reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadHook {
    /// `__getattr__`: only names the proxy type cannot resolve reach the target
    Fallback,
    /// `__getattribute__`: every read reaches the target
    Intercept,
}

impl ReadHook {
    /// Choose the read hook for a target with `capabilities`
    ///
    /// `inherits` is true when the proxy type will carry bases of its own.
    pub fn select(capabilities: &CapabilitySet, inherits: bool) -> Self {
        let guarded = capabilities
            .of_kind(CapabilityKind::AttributeHook)
            .any(|capability| capability.name.as_ref() == GETATTRIBUTE);
        if guarded || inherits {
            ReadHook::Intercept
        } else {
            ReadHook::Fallback
        }
    }
}

/// Add the delegation hooks to `builder`
///
/// Hooks replace any member of the same name already on the builder. An
/// intercepting proxy also sets `__getattr__` to `None` so a fallback
/// inherited from a mirrored base never answers for the target.
pub fn install(builder: ClassBuilder, target: &WeakObject, read: ReadHook) -> ClassBuilder {
    let builder = match read {
        ReadHook::Fallback => builder.function(read_hook(GETATTR, target.clone())),
        ReadHook::Intercept => builder
            .function(read_hook(GETATTRIBUTE, target.clone()))
            .attribute(GETATTR, Value::None),
    };
    builder
        .function(write_hook(target.clone()))
        .function(delete_hook(target.clone()))
}

fn read_hook(name: &str, target: WeakObject) -> Function {
    Function::new(name, move |args: Args| {
        let name = args.str_arg(1, "name")?;
        let target = Value::Object(target.upgrade_or_gone()?);
        attr::get_attr(&target, &name)
    })
}

fn write_hook(target: WeakObject) -> Function {
    Function::new(SETATTR, move |args: Args| {
        let name = args.str_arg(1, "name")?;
        let value = args.arg(2, "value")?.clone();
        let target = Value::Object(target.upgrade_or_gone()?);
        attr::set_attr(&target, &name, value)?;
        Ok(Value::None)
    })
}

fn delete_hook(target: WeakObject) -> Function {
    Function::new(DELATTR, move |args: Args| {
        let name = args.str_arg(1, "name")?;
        let target = Value::Object(target.upgrade_or_gone()?);
        attr::del_attr(&target, &name)?;
        Ok(Value::None)
    })
}
