//! Computed Installer.

use std::rc::Rc;

use crate::engine::{Accessor, Context, PublicInstance};
use crate::options::ComputedOption;
use crate::reactivity::{computed, ComputedRef};
use crate::types::{BoundGetter, BoundSetter, Value};

/// Build the computed binding for one entry and install it as an accessor.
///
/// The getter and setter receive `this`. A bare getter or a pair without a
/// setter ignores writes; a pair without a getter reads `Null`.
pub fn install_computed(
    this: PublicInstance,
    ctx: &Context,
    key: &str,
    option: &ComputedOption,
) -> ComputedRef {
    let (get, set): (BoundGetter, Option<BoundSetter>) = match option {
        ComputedOption::Getter(get) => {
            let get = get.clone();
            (Rc::new(move || get(this)), None)
        }
        ComputedOption::Accessors { get, set } => {
            let get: BoundGetter = match get.clone() {
                Some(get) => Rc::new(move || get(this)),
                None => {
                    tracing::debug!(key, "computed declared without a getter");
                    Rc::new(|| Ok(Value::Null))
                }
            };
            let set = set.clone().map(|set| -> BoundSetter { Rc::new(move |value| set(this, value)) });
            (get, set)
        }
    };

    let binding = computed(get, set);
    let read = binding.clone();
    let write = binding.clone();
    ctx.define_accessor(
        key,
        Accessor::new(Rc::new(move || read.get()), Rc::new(move |value| write.set(value))),
    );

    tracing::trace!(key, writable = binding.is_writable(), "computed installed");
    binding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_instance, reset_registry};
    use crate::options::ComponentOptions;
    use crate::types::Key;
    use serde_json::json;

    fn instance() -> PublicInstance {
        allocate_instance(Rc::new(ComponentOptions::default()), None)
    }

    #[test]
    fn test_getter_reads_through_receiver() {
        reset_registry();
        let this = instance();
        let ctx = this.context().unwrap();
        ctx.assign("base", json!(21));

        install_computed(
            this,
            &ctx,
            "double",
            &ComputedOption::getter(|this| Ok(json!(this.get("base")?.as_i64().unwrap_or(0) * 2))),
        );

        assert_eq!(this.get("double"), Ok(json!(42)));
    }

    #[test]
    fn test_getter_only_write_is_noop() {
        reset_registry();
        let this = instance();
        let ctx = this.context().unwrap();

        install_computed(this, &ctx, "fixed", &ComputedOption::getter(|_| Ok(json!(7))));
        this.set("fixed", json!(100)).unwrap();
        assert_eq!(this.get("fixed"), Ok(json!(7)));
    }

    #[test]
    fn test_writable_pair() {
        reset_registry();
        let this = instance();
        let ctx = this.context().unwrap();
        ctx.assign("raw", json!("a"));

        install_computed(
            this,
            &ctx,
            "upper",
            &ComputedOption::Accessors {
                get: Some(Rc::new(|this: PublicInstance| {
                    Ok(json!(this.get("raw")?.as_str().unwrap_or("").to_uppercase()))
                })),
                set: Some(Rc::new(|this: PublicInstance, value: Value| {
                    let lower = value.as_str().unwrap_or("").to_lowercase();
                    this.context()?.assign("raw", json!(lower));
                    Ok(())
                })),
            },
        );

        this.set("upper", json!("XY")).unwrap();
        assert_eq!(ctx.read(&Key::from("raw")), Ok(json!("xy")));
    }

    #[test]
    fn test_missing_getter_reads_null() {
        reset_registry();
        let this = instance();
        let ctx = this.context().unwrap();

        install_computed(this, &ctx, "empty", &ComputedOption::Accessors { get: None, set: None });
        assert_eq!(this.get("empty"), Ok(Value::Null));
    }
}
