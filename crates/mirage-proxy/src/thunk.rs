//! Forwarding thunks
//!
//! A thunk is installed on the proxy type under some member name. When it
//! runs, it drops the proxy receiver, resolves the same name on the target
//! and calls it with the remaining arguments untouched.

use std::sync::Arc;

use mirage_object::{ops, Args, Function, Value, WeakObject};

/// Build the thunk forwarding `name` to `target`
///
/// The returned function owns its copy of `name`, so thunks built in a loop
/// each forward to their own member.
pub fn forwarding_thunk(target: WeakObject, name: Arc<str>) -> Function {
    let forwarded = name.clone();
    Function::new(name, move |args: Args| {
        let (_proxy, rest) = args.split_receiver()?;
        let target = Value::Object(target.upgrade_or_gone()?);
        tracing::trace!(name = %forwarded, args = rest.len(), "forwarding call");
        ops::call_method(&target, &forwarded, rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_object::{attr, ClassBuilder, ObjectError};

    fn echo_target() -> Value {
        let class = ClassBuilder::new("Echo")
            .method("first", |_args: Args| Ok(Value::str("first")))
            .method("second", |_args: Args| Ok(Value::str("second")))
            .method("args", |args: Args| {
                let (_, rest) = args.split_receiver()?;
                let mut items = rest.positional;
                if let Some(flag) = rest.keywords.iter().find(|(k, _)| k.as_ref() == "flag") {
                    items.push(flag.1.clone());
                }
                Ok(Value::list(items))
            })
            .build()
            .unwrap();
        class.instantiate(Args::new()).unwrap()
    }

    #[test]
    fn test_each_thunk_keeps_its_own_name() {
        let target = echo_target();
        let weak = target.as_object().unwrap().downgrade();

        let thunks: Vec<Function> = ["first", "second"]
            .iter()
            .map(|name| forwarding_thunk(weak.clone(), Arc::from(*name)))
            .collect();

        let receiver = Value::None;
        assert_eq!(
            thunks[0].call(Args::from(vec![receiver.clone()])).unwrap(),
            Value::str("first")
        );
        assert_eq!(
            thunks[1].call(Args::from(vec![receiver])).unwrap(),
            Value::str("second")
        );
        assert_eq!(thunks[1].name().as_ref(), "second");
    }

    #[test]
    fn test_arguments_pass_through() {
        let target = echo_target();
        let thunk = forwarding_thunk(target.as_object().unwrap().downgrade(), Arc::from("args"));

        let args = Args::from(vec![Value::None, Value::Int(1), Value::Int(2)]).with_keyword("flag", true);
        let result = thunk.call(args).unwrap();
        assert_eq!(
            result,
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Bool(true)])
        );
    }

    #[test]
    fn test_resolves_live_instance_attribute() {
        let target = echo_target();
        let thunk = forwarding_thunk(target.as_object().unwrap().downgrade(), Arc::from("first"));
        attr::set_attr(
            &target,
            "first",
            Value::Function(Function::new("first", |_args: Args| Ok(Value::str("patched")))),
        )
        .unwrap();

        assert_eq!(thunk.call(Args::from(vec![Value::None])).unwrap(), Value::str("patched"));
    }

    #[test]
    fn test_dropped_target() {
        let target = echo_target();
        let thunk = forwarding_thunk(target.as_object().unwrap().downgrade(), Arc::from("first"));
        drop(target);

        let err = thunk.call(Args::from(vec![Value::None])).unwrap_err();
        assert_eq!(
            err,
            ObjectError::ReferenceGone {
                type_name: "Echo".to_string()
            }
        );
    }
}
