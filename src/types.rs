//! Core types - keys, values, and bound callables.
//!
//! Values flowing through components are `serde_json::Value`s. Everything
//! user-authored is an `Rc<dyn Fn>` so it can be cloned into the closures the
//! reactive engines hold.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::error::HandlerResult;
use crate::reactivity::{ComputedRef, Ref};

pub use serde_json::Value;

/// A plain keyed record, as returned by a data factory.
pub type Record = serde_json::Map<String, Value>;

// =============================================================================
// Symbol
// =============================================================================

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(0);

/// A unique key that can never collide with a string name.
///
/// Two symbols with the same description are still distinct.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Rc<str>,
}

impl Symbol {
    pub fn new(description: &str) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Rc::from(description),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

// =============================================================================
// Key
// =============================================================================

/// Property, provide, and inject key.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Name(String),
    Symbol(Symbol),
}

impl Key {
    /// The string name, if this is not a symbol.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Symbol(_) => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Key::Symbol(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Symbol(symbol) => write!(f, "{symbol:?}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Key::Symbol(symbol)
    }
}

impl From<&Symbol> for Key {
    fn from(symbol: &Symbol) -> Self {
        Key::Symbol(symbol.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// =============================================================================
// Bound Callables
// =============================================================================

/// A method with its receiver already captured.
pub type BoundMethod = Rc<dyn Fn(&[Value]) -> HandlerResult<Value>>;

/// A zero-argument reader with its receiver already captured.
pub type BoundGetter = Rc<dyn Fn() -> HandlerResult<Value>>;

/// A writer with its receiver already captured.
pub type BoundSetter = Rc<dyn Fn(Value) -> HandlerResult<()>>;

// =============================================================================
// Provided Values
// =============================================================================

/// A value published into a provide scope.
#[derive(Clone)]
pub enum Provided {
    /// Plain value, copied onto the injecting context.
    Value(Value),
    /// Reactive reference, unwrapped into a read/write accessor.
    Ref(Ref),
    /// Computed reference, unwrapped into a read/write accessor.
    Computed(ComputedRef),
    /// Callable, installed as a method on the injecting context.
    Function(BoundMethod),
}

impl Provided {
    /// Whether injection should unwrap this into an accessor.
    pub fn is_ref(&self) -> bool {
        matches!(self, Provided::Ref(_) | Provided::Computed(_))
    }

    /// Current value, reading through refs.
    pub fn value(&self) -> HandlerResult<Value> {
        match self {
            Provided::Value(value) => Ok(value.clone()),
            Provided::Ref(reference) => Ok(reference.get()),
            Provided::Computed(computed) => computed.get(),
            Provided::Function(_) => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provided::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Provided::Ref(_) => f.write_str("Ref(..)"),
            Provided::Computed(_) => f.write_str("Computed(..)"),
            Provided::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Value> for Provided {
    fn from(value: Value) -> Self {
        Provided::Value(value)
    }
}

impl From<Ref> for Provided {
    fn from(reference: Ref) -> Self {
        Provided::Ref(reference)
    }
}

impl From<ComputedRef> for Provided {
    fn from(computed: ComputedRef) -> Self {
        Provided::Computed(computed)
    }
}

/// An evaluated provide declaration.
pub type ProvideRecord = IndexMap<Key, Provided>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbols_are_unique() {
        let a = Symbol::new("theme");
        let b = Symbol::new("theme");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(Key::from(&a), Key::from("theme"));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::from("count").to_string(), "count");
        assert_eq!(Key::from(Symbol::new("locale")).to_string(), "Symbol(locale)");
    }

    #[test]
    fn test_provided_value() {
        let plain = Provided::from(json!(3));
        assert!(!plain.is_ref());
        assert_eq!(plain.value(), Ok(json!(3)));

        let reference = Provided::from(crate::reactivity::reference(json!("dark")));
        assert!(reference.is_ref());
        assert_eq!(reference.value(), Ok(json!("dark")));
    }
}
