//! Declaration shapes for the individual option kinds.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::engine::PublicInstance;
use crate::error::HandlerResult;
use crate::types::{Key, ProvideRecord, Value};
use crate::watch::WatchOptions;

// =============================================================================
// Authoring Signatures
// =============================================================================
//
// Every user-authored function takes the receiver explicitly.

pub type DataFn = Rc<dyn Fn(PublicInstance) -> HandlerResult<Value>>;
pub type MethodFn = Rc<dyn Fn(PublicInstance, &[Value]) -> HandlerResult<Value>>;
pub type GetterFn = Rc<dyn Fn(PublicInstance) -> HandlerResult<Value>>;
pub type SetterFn = Rc<dyn Fn(PublicInstance, Value) -> HandlerResult<()>>;
pub type WatchFn = Rc<dyn Fn(PublicInstance, &Value, &Value) -> HandlerResult<()>>;
pub type HookFn = Rc<dyn Fn(PublicInstance) -> HandlerResult<()>>;
pub type ProvideFn = Rc<dyn Fn(PublicInstance) -> HandlerResult<ProvideRecord>>;
pub type DefaultFn = Rc<dyn Fn() -> Value>;

// =============================================================================
// Computed
// =============================================================================

#[derive(Clone)]
pub enum ComputedOption {
    /// Getter only. Writes are ignored.
    Getter(GetterFn),
    /// Explicit pair. A missing getter reads `Null`, a missing setter ignores
    /// writes.
    Accessors {
        get: Option<GetterFn>,
        set: Option<SetterFn>,
    },
}

impl ComputedOption {
    pub fn getter(get: impl Fn(PublicInstance) -> HandlerResult<Value> + 'static) -> Self {
        Self::Getter(Rc::new(get))
    }

    pub fn writable(
        get: impl Fn(PublicInstance) -> HandlerResult<Value> + 'static,
        set: impl Fn(PublicInstance, Value) -> HandlerResult<()> + 'static,
    ) -> Self {
        Self::Accessors {
            get: Some(Rc::new(get)),
            set: Some(Rc::new(set)),
        }
    }
}

impl fmt::Debug for ComputedOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Getter(_) => f.write_str("Getter(..)"),
            Self::Accessors { get, set } => f
                .debug_struct("Accessors")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .finish(),
        }
    }
}

// =============================================================================
// Watch
// =============================================================================

/// Handler inside a described watch entry.
#[derive(Clone)]
pub enum WatchHandler {
    /// Name of a context method, resolved at registration.
    Named(String),
    Callback(WatchFn),
}

/// One watch declaration. Lists nest.
#[derive(Clone)]
pub enum WatchSpec {
    /// Name of a context method, resolved at registration.
    Named(String),
    Handler(WatchFn),
    Described {
        handler: WatchHandler,
        options: WatchOptions,
    },
    List(Vec<WatchSpec>),
}

impl WatchSpec {
    pub fn named(method: impl Into<String>) -> Self {
        Self::Named(method.into())
    }

    pub fn handler(
        handler: impl Fn(PublicInstance, &Value, &Value) -> HandlerResult<()> + 'static,
    ) -> Self {
        Self::Handler(Rc::new(handler))
    }

    pub fn described(handler: WatchHandler, options: WatchOptions) -> Self {
        Self::Described { handler, options }
    }

    /// Number of non-list shapes, counting through nested lists.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::List(specs) => specs.iter().map(WatchSpec::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Debug for WatchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl fmt::Debug for WatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Described { handler, options } => f
                .debug_struct("Described")
                .field("handler", handler)
                .field("options", options)
                .finish(),
            Self::List(specs) => f.debug_tuple("List").field(specs).finish(),
        }
    }
}

// =============================================================================
// Inject
// =============================================================================

#[derive(Clone)]
pub enum InjectDefault {
    Value(Value),
    Factory(DefaultFn),
}

impl InjectDefault {
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for InjectDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum InjectEntry {
    /// Look up this key instead of the entry's own.
    Source(Key),
    Described {
        from: Option<Key>,
        default: Option<InjectDefault>,
    },
}

impl InjectEntry {
    /// Key to look up for an entry installed under `own`.
    pub fn source<'a>(&'a self, own: &'a Key) -> &'a Key {
        match self {
            Self::Source(key) => key,
            Self::Described { from, .. } => from.as_ref().unwrap_or(own),
        }
    }

    pub fn default_value(&self) -> Option<&InjectDefault> {
        match self {
            Self::Source(_) => None,
            Self::Described { default, .. } => default.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum InjectOptions {
    /// Each key resolves to itself.
    List(Vec<Key>),
    Map(IndexMap<Key, InjectEntry>),
}

impl InjectOptions {
    pub fn keys<K: Into<Key>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::List(keys.into_iter().map(Into::into).collect())
    }

    /// Keyed form of the declaration.
    pub fn normalize(&self) -> IndexMap<Key, InjectEntry> {
        match self {
            Self::List(keys) => keys
                .iter()
                .map(|key| (key.clone(), InjectEntry::Source(key.clone())))
                .collect(),
            Self::Map(entries) => entries.clone(),
        }
    }
}

// =============================================================================
// Provide
// =============================================================================

#[derive(Clone)]
pub enum ProvideOptions {
    Record(ProvideRecord),
    /// Evaluated once during option application.
    Factory(ProvideFn),
}

impl fmt::Debug for ProvideOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(record) => f.debug_tuple("Record").field(record).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// =============================================================================
// Lifecycle Hooks
// =============================================================================

#[derive(Clone)]
pub enum HookSpec {
    Single(HookFn),
    List(Vec<HookFn>),
}

impl HookSpec {
    /// Hooks in declaration order.
    pub fn hooks(&self) -> Vec<HookFn> {
        match self {
            Self::Single(hook) => vec![hook.clone()],
            Self::List(hooks) => hooks.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(hooks) => hooks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a hook, turning a single declaration into a list.
    pub fn push(&mut self, hook: HookFn) {
        *self = match std::mem::replace(self, Self::List(Vec::new())) {
            Self::Single(first) => Self::List(vec![first, hook]),
            Self::List(mut hooks) => {
                hooks.push(hook);
                Self::List(hooks)
            }
        };
    }
}

impl fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookSpec({})", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inject_list_normalizes_to_self() {
        let inject = InjectOptions::keys(["theme", "locale"]);
        let normalized = inject.normalize();

        let keys: Vec<Key> = normalized.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("theme"), Key::from("locale")]);
        let theme = Key::from("theme");
        assert_eq!(normalized[&theme].source(&theme), &theme);
    }

    #[test]
    fn test_inject_entry_source() {
        let own = Key::from("color");
        let from = InjectEntry::Described {
            from: Some(Key::from("theme")),
            default: None,
        };
        let plain = InjectEntry::Described {
            from: None,
            default: Some(InjectDefault::Value(json!("red"))),
        };

        assert_eq!(from.source(&own), &Key::from("theme"));
        assert_eq!(plain.source(&own), &own);
        assert_eq!(plain.default_value().map(InjectDefault::resolve), Some(json!("red")));
    }

    #[test]
    fn test_watch_leaf_count() {
        let spec = WatchSpec::List(vec![
            WatchSpec::named("a"),
            WatchSpec::List(vec![WatchSpec::named("b"), WatchSpec::named("c")]),
            WatchSpec::handler(|_, _, _| Ok(())),
        ]);
        assert_eq!(spec.leaf_count(), 4);
        assert_eq!(WatchSpec::List(Vec::new()).leaf_count(), 0);
    }

    #[test]
    fn test_hook_spec_push() {
        let mut spec = HookSpec::Single(Rc::new(|_: PublicInstance| Ok(())));
        spec.push(Rc::new(|_: PublicInstance| Ok(())));
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.hooks().len(), 2);
    }
}
