//! Attribute access: the per-instance dispatch path
//!
//! Reads consult the type's `__getattribute__` hook (or the generic lookup:
//! instance table first, then the class MRO with functions bound to the
//! receiver) and fall back to `__getattr__` on `AttributeNotFound`. Writes
//! and deletes go through `__setattr__` / `__delattr__` when the type
//! defines them. A type that sets `__getattr__` to `None` opts out of the
//! fallback even when an ancestor defines one.

use crate::class::{Class, DOC, MODULE};
use crate::error::{ObjResult, ObjectError};
use crate::function::{Args, BoundMethod};
use crate::ops;
use crate::protocol::{DELATTR, GETATTR, GETATTRIBUTE, SETATTR};
use crate::value::Value;

/// Read attribute `name`, honoring the type's read hooks
pub fn get_attr(value: &Value, name: &str) -> ObjResult<Value> {
    let Value::Object(obj) = value else {
        return generic_get_attr(value, name);
    };
    let class = obj.class();

    let result = match class.lookup(GETATTRIBUTE) {
        Some(hook) => {
            tracing::trace!(class = %class.name(), name, "dispatching __getattribute__");
            ops::call(&hook, hook_args(value, name))
        }
        None => generic_get_attr(value, name),
    };

    match result {
        Err(err) if err.is_attribute_error() => match class.lookup(GETATTR) {
            Some(hook) if !hook.is_none() => {
                tracing::trace!(class = %class.name(), name, "dispatching __getattr__");
                ops::call(&hook, hook_args(value, name))
            }
            _ => Err(err),
        },
        other => other,
    }
}

/// Write attribute `name`, honoring the type's write hook
pub fn set_attr(target: &Value, name: &str, value: Value) -> ObjResult<()> {
    if let Value::Object(obj) = target {
        if let Some(hook) = obj.class().lookup(SETATTR) {
            tracing::trace!(class = %obj.class().name(), name, "dispatching __setattr__");
            ops::call(&hook, Args::from(vec![target.clone(), Value::str(name), value]))?;
            return Ok(());
        }
    }
    generic_set_attr(target, name, value)
}

/// Delete attribute `name`, honoring the type's delete hook
pub fn del_attr(target: &Value, name: &str) -> ObjResult<()> {
    if let Value::Object(obj) = target {
        if let Some(hook) = obj.class().lookup(DELATTR) {
            tracing::trace!(class = %obj.class().name(), name, "dispatching __delattr__");
            ops::call(&hook, hook_args(target, name))?;
            return Ok(());
        }
    }
    generic_del_attr(target, name)
}

/// Whether `name` resolves on `value`
///
/// Only `AttributeNotFound` counts as absence; any other failure raised by
/// a hook propagates.
pub fn has_attr(value: &Value, name: &str) -> ObjResult<bool> {
    match get_attr(value, name) {
        Ok(_) => Ok(true),
        Err(err) if err.is_attribute_error() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Default attribute read, ignoring every hook
pub fn generic_get_attr(value: &Value, name: &str) -> ObjResult<Value> {
    match value {
        Value::Object(obj) => {
            if let Some(found) = obj.attribute(name) {
                return Ok(found);
            }
            match obj.class().lookup(name) {
                Some(Value::Function(function)) => {
                    Ok(Value::BoundMethod(BoundMethod::new(value.clone(), function)))
                }
                Some(member) => Ok(member),
                None => Err(ObjectError::no_attribute(obj.class().name(), name)),
            }
        }
        Value::Class(class) => class_get_attr(class, name),
        other => Err(ObjectError::no_attribute(&other.type_name(), name)),
    }
}

/// Default attribute write, ignoring every hook
pub fn generic_set_attr(target: &Value, name: &str, value: Value) -> ObjResult<()> {
    match target {
        Value::Object(obj) => {
            obj.set_attribute(name, value);
            Ok(())
        }
        Value::Class(class) => {
            if is_class_metadata(name) {
                return Err(ObjectError::TypeError(format!(
                    "cannot set '{}' attribute of type '{}'",
                    name,
                    class.name()
                )));
            }
            class.set_member(name, value);
            Ok(())
        }
        other => Err(ObjectError::no_attribute(&other.type_name(), name)),
    }
}

/// Default attribute delete, ignoring every hook
pub fn generic_del_attr(target: &Value, name: &str) -> ObjResult<()> {
    match target {
        Value::Object(obj) => obj
            .remove_attribute(name)
            .map(|_| ())
            .ok_or_else(|| ObjectError::no_attribute(obj.class().name(), name)),
        Value::Class(class) => class
            .remove_member(name)
            .map(|_| ())
            .ok_or_else(|| ObjectError::no_class_attribute(class.name(), name)),
        other => Err(ObjectError::no_attribute(&other.type_name(), name)),
    }
}

fn class_get_attr(class: &Class, name: &str) -> ObjResult<Value> {
    match name {
        "__name__" => Ok(Value::Str(class.name().clone())),
        "__qualname__" => Ok(Value::Str(class.qualname().clone())),
        "__bases__" => Ok(Value::tuple(
            class.bases().iter().cloned().map(Value::Class).collect(),
        )),
        "__mro__" => Ok(Value::tuple(class.mro().into_iter().map(Value::Class).collect())),
        _ => class
            .lookup(name)
            .ok_or_else(|| ObjectError::no_class_attribute(class.name(), name)),
    }
}

fn is_class_metadata(name: &str) -> bool {
    matches!(name, "__name__" | "__qualname__" | "__bases__" | "__mro__" | DOC | MODULE)
}

fn hook_args(receiver: &Value, name: &str) -> Args {
    Args::from(vec![receiver.clone(), Value::str(name)])
}
