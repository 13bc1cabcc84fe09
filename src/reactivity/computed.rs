//! Computed - memoized derived values with an optional setter.
//!
//! The getter runs inside a spark-signals `derived`, so its result is cached
//! until something it read changes. A failed getter is memoized too: the
//! error is returned on every read until a dependency changes.

use spark_signals::{derived, Derived};

use crate::error::HandlerResult;
use crate::types::{BoundGetter, BoundSetter, Value};

/// A computed binding.
#[derive(Clone)]
pub struct ComputedRef {
    value: Derived<HandlerResult<Value>>,
    setter: Option<BoundSetter>,
}

/// Build a computed binding. Without a setter, writes are silently ignored.
pub fn computed(get: BoundGetter, set: Option<BoundSetter>) -> ComputedRef {
    ComputedRef {
        value: derived(move || get()),
        setter: set,
    }
}

impl ComputedRef {
    /// Read the memoized value (tracked).
    pub fn get(&self) -> HandlerResult<Value> {
        self.value.get()
    }

    /// Hand `value` to the setter, if there is one.
    pub fn set(&self, value: Value) -> HandlerResult<()> {
        match &self.setter {
            Some(setter) => setter(value),
            None => {
                tracing::trace!("write to getter-only computed ignored");
                Ok(())
            }
        }
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::reactivity::reference;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_computed_follows_source() {
        let count = reference(json!(2));
        let source = count.clone();
        let double = computed(
            Rc::new(move || Ok(json!(source.get().as_i64().unwrap_or(0) * 2))),
            None,
        );

        assert_eq!(double.get(), Ok(json!(4)));
        count.set(json!(5));
        assert_eq!(double.get(), Ok(json!(10)));
    }

    #[test]
    fn test_getter_only_write_is_noop() {
        let double = computed(Rc::new(|| Ok(json!(1))), None);
        assert!(!double.is_writable());
        assert_eq!(double.set(json!(99)), Ok(()));
        assert_eq!(double.get(), Ok(json!(1)));
    }

    #[test]
    fn test_setter_writes_through() {
        let count = reference(json!(0));
        let read = count.clone();
        let write = count.clone();
        let mirror = computed(
            Rc::new(move || Ok(read.get())),
            Some(Rc::new(move |v: Value| {
                write.set(v);
                Ok(())
            })),
        );

        mirror.set(json!(7)).unwrap();
        assert_eq!(count.get(), json!(7));
        assert_eq!(mirror.get(), Ok(json!(7)));
    }

    #[test]
    fn test_getter_error_is_returned() {
        let broken = computed(Rc::new(|| Err(HandlerError::new("boom"))), None);
        assert_eq!(broken.get(), Err(HandlerError::new("boom")));
    }
}
