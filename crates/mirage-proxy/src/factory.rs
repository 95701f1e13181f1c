//! Proxy factory
//!
//! Synthesizes one proxy type per call and returns its single instance.
//! Construction order matters:
//!
//! 1. scan the target's type chain
//! 2. install one forwarding thunk per capability
//! 3. mirror the descriptive metadata, and the bases at full level
//! 4. install the delegation hooks, replacing any same-named thunk
//!
//! The read hook intercepts every read when the target guards reads with
//! `__getattribute__` or the proxy type inherits from mirrored bases.
//! Otherwise names the proxy type resolves are answered by its thunks.
//!
//! The proxy instance holds nothing but a weak handle to the target, kept
//! as a native payload so it never shows up through attribute access.
//!
//! ## Recognizing proxies
//!
//! Proxies are indistinguishable from their targets through the object
//! model, but native code can still tell them apart:
//!
//! ```rust,ignore
//! if let Some(unwrapped) = try_unwrap_proxy(&value) {
//!     let target = unwrapped.target.upgrade_or_gone()?;
//! }
//! ```

use std::sync::Arc;

use mirage_object::{protocol, ClassBuilder, ObjResult, Value, WeakObject};

use crate::delegation::{self, ReadHook};
use crate::error::{ProxyError, ProxyResult};
use crate::metadata;
use crate::options::ProxyOptions;
use crate::scanner::{self, CapabilityKind};
use crate::thunk;

/// Payload attached to every proxy instance
struct ProxyTarget(WeakObject);

/// Builds proxies with a fixed set of options
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyFactory {
    options: ProxyOptions,
}

impl ProxyFactory {
    /// Create a factory using `options`
    pub fn new(options: ProxyOptions) -> Self {
        Self { options }
    }

    /// Options this factory builds with
    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    /// Build a proxy forwarding to `target`
    ///
    /// The target is never mutated and its initializer does not run.
    /// Fails only when `target` is not a class instance.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %target.type_name()))]
    pub fn create(&self, target: &Value) -> ProxyResult<Value> {
        let Value::Object(object) = target else {
            return Err(ProxyError::construction(
                target.type_name(),
                "only class instances have a type chain to mirror",
            ));
        };
        let class = object.class();
        let weak = object.downgrade();

        let capabilities = scanner::scan(class, self.options.scan);
        let inherits = metadata::mirrors_bases(class, self.options.mirror);

        let mut builder = ClassBuilder::new(class.name().clone());
        let mut thunks = 0usize;
        for capability in capabilities.iter() {
            // Hooks are covered by the delegation layer.
            if protocol::is_attribute_hook(&capability.name) {
                continue;
            }
            tracing::trace!(
                name = %capability.name,
                declared_by = %capability.declared_by.name(),
                "installing thunk"
            );
            builder =
                builder.function(thunk::forwarding_thunk(weak.clone(), capability.name.clone()));
            thunks += 1;
        }

        // A protocol name bound to data disables that protocol on the target.
        for name in capabilities.data_members() {
            if protocol::classify(name).is_none() || protocol::is_attribute_hook(name) {
                continue;
            }
            if let Some(value) = class.lookup(name) {
                builder = builder.attribute(name, value);
            }
        }

        builder = metadata::mirror(class, builder, self.options.mirror);
        let read = ReadHook::select(&capabilities, inherits);
        builder = delegation::install(builder, &weak, read);

        let proxy_class = builder.build()?;
        let proxy = proxy_class.allocate_with_payload(Arc::new(ProxyTarget(weak)));

        tracing::debug!(
            class = %proxy_class.qualname(),
            proxy_id = proxy.id(),
            thunks,
            hooks = capabilities.of_kind(CapabilityKind::AttributeHook).count(),
            ?read,
            scanned = capabilities.len(),
            "proxy type synthesized"
        );

        Ok(Value::Object(proxy))
    }
}

/// Build a proxy for `target` with default options
pub fn proxy(target: &Value) -> ProxyResult<Value> {
    ProxyFactory::default().create(target)
}

/// Result of unwrapping a proxy
#[derive(Debug, Clone)]
pub struct UnwrappedProxy {
    /// Weak handle to the target
    pub target: WeakObject,
    /// The proxy's unique object ID
    pub proxy_id: u64,
}

/// Check if a value is a proxy and return its contents
pub fn try_unwrap_proxy(value: &Value) -> Option<UnwrappedProxy> {
    let object = value.as_object()?;
    let ProxyTarget(target) = object.payload::<ProxyTarget>()?;
    Some(UnwrappedProxy {
        target: target.clone(),
        proxy_id: object.id(),
    })
}

/// Check if a value is a proxy
pub fn is_proxy(value: &Value) -> bool {
    try_unwrap_proxy(value).is_some()
}

/// Get the target of a proxy, or the value itself if it is not a proxy
pub fn unwrap_proxy_target(value: &Value) -> ObjResult<Value> {
    match try_unwrap_proxy(value) {
        Some(unwrapped) => Ok(Value::Object(unwrapped.target.upgrade_or_gone()?)),
        None => Ok(value.clone()),
    }
}

/// Recursively unwrap nested proxies to get the innermost target
pub fn unwrap_proxy_deep(value: &Value) -> ObjResult<Value> {
    let mut current = value.clone();
    while let Some(unwrapped) = try_unwrap_proxy(&current) {
        current = Value::Object(unwrapped.target.upgrade_or_gone()?);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_object::{attr, ops, Args, ObjectError};

    fn counter() -> Value {
        let class = ClassBuilder::new("Counter")
            .doc("Counts things")
            .method("__init__", |args: Args| {
                attr::set_attr(args.receiver()?, "count", Value::Int(0))?;
                Ok(Value::None)
            })
            .method("__len__", |args: Args| attr::get_attr(args.receiver()?, "count"))
            .method("bump", |args: Args| {
                let this = args.receiver()?;
                let count = attr::get_attr(this, "count")?.as_int().unwrap_or(0);
                attr::set_attr(this, "count", Value::Int(count + 1))?;
                Ok(Value::Int(count + 1))
            })
            .build()
            .unwrap();
        ops::call(&Value::Class(class), Args::new()).unwrap()
    }

    #[test]
    fn test_proxy_forwards_and_mirrors() {
        let target = counter();
        let proxied = proxy(&target).unwrap();

        assert_eq!(ops::call_method(&proxied, "bump", Args::new()).unwrap(), Value::Int(1));
        assert_eq!(ops::len(&proxied).unwrap(), 1);
        assert_eq!(attr::get_attr(&target, "count").unwrap(), Value::Int(1));

        let proxy_class = proxied.as_object().unwrap().class().clone();
        let target_class = target.as_object().unwrap().class().clone();
        assert!(!proxy_class.ptr_eq(&target_class));
        assert_eq!(proxy_class.name(), target_class.name());
        assert_eq!(proxy_class.doc(), target_class.doc());
    }

    #[test]
    fn test_construction_does_not_touch_target() {
        let target = counter();
        attr::set_attr(&target, "count", Value::Int(5)).unwrap();
        let names_before = target.as_object().unwrap().attribute_names();

        let proxied = proxy(&target).unwrap();

        assert_eq!(target.as_object().unwrap().attribute_names(), names_before);
        assert_eq!(attr::get_attr(&proxied, "count").unwrap(), Value::Int(5));
        assert!(proxied.as_object().unwrap().attribute_names().is_empty());
    }

    #[test]
    fn test_non_object_targets_rejected() {
        for target in [Value::Int(1), Value::str("s"), Value::None] {
            let err = proxy(&target).unwrap_err();
            assert!(matches!(err, ProxyError::Construction { .. }));
        }
    }

    #[test]
    fn test_unwrap_helpers() {
        let target = counter();
        let first = proxy(&target).unwrap();
        let second = proxy(&first).unwrap();

        assert!(is_proxy(&first));
        assert!(is_proxy(&second));
        assert!(!is_proxy(&target));

        let once = unwrap_proxy_target(&second).unwrap();
        assert!(Value::identical(&once, &first));
        let deep = unwrap_proxy_deep(&second).unwrap();
        assert!(Value::identical(&deep, &target));
        assert!(Value::identical(&unwrap_proxy_deep(&target).unwrap(), &target));
        assert_eq!(
            try_unwrap_proxy(&first).unwrap().proxy_id,
            first.as_object().unwrap().id()
        );
    }

    #[test]
    fn test_unwrap_after_target_dropped() {
        let target = counter();
        let proxied = proxy(&target).unwrap();
        drop(target);

        assert!(is_proxy(&proxied));
        assert_eq!(
            unwrap_proxy_target(&proxied).unwrap_err(),
            ObjectError::ReferenceGone {
                type_name: "Counter".to_string()
            }
        );
    }
}
