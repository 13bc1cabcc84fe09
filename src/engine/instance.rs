//! Public Instance - the receiver handed to every user-authored function.
//!
//! A `PublicInstance` is just an index. It is `Copy`, so closures installed on
//! a context capture it by value without creating reference cycles. Every
//! accessor looks the instance up in the registry; once the instance is
//! released they fail with a [`HandlerError`].
//!
//! Reads consult the data store first, then the context:
//!
//! ```text
//! this.get("count")   data store has "count"  -> store value (tracked)
//!                     context has "count"     -> value / accessor get()
//!                     otherwise               -> Null
//! ```

use std::rc::Rc;

use super::context::Context;
use super::registry::{self, InstanceState};
use crate::error::{HandlerError, HandlerResult};
use crate::options::ComponentOptions;
use crate::reactivity::ReactiveStore;
use crate::types::{Key, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicInstance {
    index: usize,
}

impl PublicInstance {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }

    /// Handle for an allocated index.
    pub fn from_index(index: usize) -> Option<Self> {
        registry::is_allocated(index).then_some(Self { index })
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn state(self) -> HandlerResult<Rc<InstanceState>> {
        registry::instance_state(self.index).ok_or_else(|| HandlerError::released(self.index))
    }

    pub fn is_alive(self) -> bool {
        registry::is_allocated(self.index)
    }

    pub fn id(self) -> Option<String> {
        registry::get_id(self.index)
    }

    pub fn parent(self) -> Option<PublicInstance> {
        registry::instance_state(self.index)
            .and_then(|state| state.parent)
            .map(PublicInstance::new)
    }

    pub fn options(self) -> HandlerResult<Rc<ComponentOptions>> {
        Ok(self.state()?.options.clone())
    }

    pub fn context(self) -> HandlerResult<Context> {
        Ok(self.state()?.context.clone())
    }

    /// The materialized data store, if a data factory ran.
    pub fn data(self) -> Option<ReactiveStore> {
        registry::instance_state(self.index).and_then(|state| state.data.borrow().clone())
    }

    // -------------------------------------------------------------------------
    // Property access
    // -------------------------------------------------------------------------

    /// Read `key` through the data store, then the context.
    pub fn get(self, key: impl Into<Key>) -> HandlerResult<Value> {
        let key = key.into();
        let state = self.state()?;

        let store = state.data.borrow().clone();
        if let (Some(store), Some(name)) = (store, key.as_name()) {
            if store.contains_key(name) {
                return Ok(store.get(name).unwrap_or(Value::Null));
            }
        }

        state.context.read(&key)
    }

    /// Write `key`: the data store if it owns the key, else the context.
    pub fn set(self, key: impl Into<Key>, value: Value) -> HandlerResult<()> {
        let key = key.into();
        let state = self.state()?;

        let store = state.data.borrow().clone();
        if let (Some(store), Some(name)) = (store, key.as_name()) {
            if store.contains_key(name) {
                store.set(name, value);
                return Ok(());
            }
        }

        state.context.write(&key, value)
    }

    /// Invoke the context method `key`.
    pub fn call(self, key: impl Into<Key>, args: &[Value]) -> HandlerResult<Value> {
        let key = key.into();
        let method = self
            .state()?
            .context
            .method(&key)
            .ok_or_else(|| HandlerError::not_callable(&key))?;
        method(args)
    }

    /// Whether `key` resolves through the data store or the context.
    pub fn has(self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let Some(state) = registry::instance_state(self.index) else {
            return false;
        };

        let in_data = match (state.data.borrow().as_ref(), key.as_name()) {
            (Some(store), Some(name)) => store.contains_key(name),
            _ => false,
        };
        in_data || state.context.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_instance, release_instance, reset_registry};
    use crate::reactivity::reactive;
    use serde_json::json;

    fn instance() -> PublicInstance {
        allocate_instance(Rc::new(ComponentOptions::default()), None)
    }

    #[test]
    fn test_data_shadows_context() {
        reset_registry();
        let this = instance();
        let state = this.state().unwrap();
        state.context.assign("count", json!("from context"));
        *state.data.borrow_mut() = Some(reactive(json!({ "count": 1 })));

        assert_eq!(this.get("count"), Ok(json!(1)));
        this.set("count", json!(2)).unwrap();
        assert_eq!(this.data().unwrap().get("count"), Some(json!(2)));
        assert_eq!(state.context.read(&Key::from("count")), Ok(json!("from context")));
    }

    #[test]
    fn test_context_fallback() {
        reset_registry();
        let this = instance();
        this.context().unwrap().assign("title", json!("Hello"));

        assert!(this.has("title"));
        assert!(!this.has("missing"));
        assert_eq!(this.get("title"), Ok(json!("Hello")));
        assert_eq!(this.get("missing"), Ok(Value::Null));
    }

    #[test]
    fn test_call() {
        reset_registry();
        let this = instance();
        this.context()
            .unwrap()
            .define_method("add", Rc::new(|args: &[Value]| Ok(json!(args.len()))));

        assert_eq!(this.call("add", &[json!(1), json!(2)]), Ok(json!(2)));
        assert_eq!(
            this.call("nope", &[]),
            Err(HandlerError::new("`nope` is not a method"))
        );
    }

    #[test]
    fn test_released_instance_errors() {
        reset_registry();
        let this = instance();
        release_instance(this.index());

        assert!(!this.is_alive());
        assert!(this.get("anything").is_err());
        assert!(PublicInstance::from_index(this.index()).is_none());
    }
}
