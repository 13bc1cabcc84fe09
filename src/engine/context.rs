//! Context - the per-instance property bag.
//!
//! Option application installs three kinds of property here:
//!
//! ```text
//! Value     plain injected value          ctx.read("title")  -> value
//! Method    bound method / function       ctx.method("save") -> callable
//! Accessor  computed or unwrapped ref     ctx.read("double") -> get()
//!                                         ctx.write("double", v) -> set(v)
//! ```
//!
//! Later installs replace earlier ones under the same key. No borrow is held
//! while a getter, setter or method runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::HandlerResult;
use crate::types::{BoundGetter, BoundMethod, BoundSetter, Key, Value};

/// A get/set pair installed under one key.
#[derive(Clone)]
pub struct Accessor {
    pub get: BoundGetter,
    pub set: BoundSetter,
}

impl Accessor {
    pub fn new(get: BoundGetter, set: BoundSetter) -> Self {
        Self { get, set }
    }
}

#[derive(Clone)]
pub enum Property {
    Value(Value),
    Method(BoundMethod),
    Accessor(Accessor),
}

impl Property {
    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(self, Property::Method(_))
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Property::Method(_) => f.write_str("Method(..)"),
            Property::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

/// Shared handle to an instance's properties. Clones see the same bag.
#[derive(Clone, Default)]
pub struct Context {
    properties: Rc<RefCell<IndexMap<Key, Property>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Installation
    // -------------------------------------------------------------------------

    pub fn assign(&self, key: impl Into<Key>, value: Value) {
        self.install(key.into(), Property::Value(value));
    }

    pub fn define_method(&self, key: impl Into<Key>, method: BoundMethod) {
        self.install(key.into(), Property::Method(method));
    }

    pub fn define_accessor(&self, key: impl Into<Key>, accessor: Accessor) {
        self.install(key.into(), Property::Accessor(accessor));
    }

    fn install(&self, key: Key, property: Property) {
        // Drop the replaced property outside the borrow.
        let replaced = self.properties.borrow_mut().insert(key, property);
        drop(replaced);
    }

    pub fn remove(&self, key: &Key) -> Option<Property> {
        self.properties.borrow_mut().shift_remove(key)
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn property(&self, key: &Key) -> Option<Property> {
        self.properties.borrow().get(key).cloned()
    }

    /// Read a property. Methods and missing keys read as `Null`.
    pub fn read(&self, key: &Key) -> HandlerResult<Value> {
        match self.property(key) {
            Some(Property::Value(value)) => Ok(value),
            Some(Property::Accessor(accessor)) => (accessor.get)(),
            Some(Property::Method(_)) | None => Ok(Value::Null),
        }
    }

    /// Write a property. Accessors route to their setter; anything else is
    /// replaced by a plain value.
    pub fn write(&self, key: &Key, value: Value) -> HandlerResult<()> {
        match self.property(key) {
            Some(Property::Accessor(accessor)) => (accessor.set)(value),
            _ => {
                self.install(key.clone(), Property::Value(value));
                Ok(())
            }
        }
    }

    pub fn method(&self, key: &Key) -> Option<BoundMethod> {
        match self.property(key) {
            Some(Property::Method(method)) => Some(method),
            _ => None,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.properties.borrow().contains_key(key)
    }

    /// Keys in installation order.
    pub fn keys(&self) -> Vec<Key> {
        self.properties.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }

    /// Drop every property.
    ///
    /// Bound closures capture only index handles, so this is what actually
    /// frees them when an instance is released.
    pub fn clear(&self) {
        let properties = std::mem::take(&mut *self.properties.borrow_mut());
        drop(properties);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.properties.borrow().iter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::reference;
    use serde_json::json;

    #[test]
    fn test_plain_values() {
        let ctx = Context::new();
        ctx.assign("title", json!("Hello"));

        assert_eq!(ctx.read(&Key::from("title")), Ok(json!("Hello")));
        assert_eq!(ctx.read(&Key::from("missing")), Ok(Value::Null));

        ctx.write(&Key::from("title"), json!("Bye")).unwrap();
        assert_eq!(ctx.read(&Key::from("title")), Ok(json!("Bye")));
    }

    #[test]
    fn test_accessor_routes_through_closures() {
        let ctx = Context::new();
        let theme = reference(json!("dark"));
        let read = theme.clone();
        let write = theme.clone();

        ctx.define_accessor(
            "theme",
            Accessor::new(
                Rc::new(move || Ok(read.get())),
                Rc::new(move |v: Value| {
                    write.set(v);
                    Ok(())
                }),
            ),
        );

        assert_eq!(ctx.read(&Key::from("theme")), Ok(json!("dark")));
        ctx.write(&Key::from("theme"), json!("light")).unwrap();
        assert_eq!(theme.get(), json!("light"));
        assert!(ctx.property(&Key::from("theme")).unwrap().is_accessor());
    }

    #[test]
    fn test_methods() {
        let ctx = Context::new();
        ctx.define_method("greet", Rc::new(|args: &[Value]| Ok(json!(format!("hi {}", args[0])))));

        let greet = ctx.method(&Key::from("greet")).unwrap();
        assert_eq!(greet(&[json!(1)]), Ok(json!("hi 1")));
        assert_eq!(ctx.read(&Key::from("greet")), Ok(Value::Null));
        assert!(ctx.method(&Key::from("missing")).is_none());
    }

    #[test]
    fn test_later_install_shadows() {
        let ctx = Context::new();
        ctx.assign("count", json!(1));
        ctx.define_accessor(
            "count",
            Accessor::new(Rc::new(|| Ok(json!(2))), Rc::new(|_: Value| Ok(()))),
        );

        assert_eq!(ctx.read(&Key::from("count")), Ok(json!(2)));
        assert_eq!(ctx.keys(), vec![Key::from("count")]);
    }
}
