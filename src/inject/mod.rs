//! Provide / Inject - ancestor-scoped value passing.
//!
//! Every instance owns a [`ProvideScope`] chained to its parent's scope; the
//! root of every chain is the application scope. `provide` writes the
//! instance's own scope. `inject` starts at the *parent's* scope, so an
//! instance never sees its own provisions, only those of its ancestors.
//!
//! ```text
//! app scope      { locale }
//!   └─ App       { theme }          inject("locale") → app scope
//!        └─ Child {}                inject("theme")  → App's scope
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::engine::PublicInstance;
use crate::error::HandlerResult;
use crate::types::{Key, Provided};

// =============================================================================
// Provide Scope
// =============================================================================

#[derive(Default)]
pub struct ProvideScope {
    parent: Option<Rc<ProvideScope>>,
    entries: RefCell<IndexMap<Key, Provided>>,
}

impl ProvideScope {
    /// A scope with no parent.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A scope whose lookups fall back to `parent`.
    pub fn child(parent: &Rc<ProvideScope>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(parent.clone()),
            entries: RefCell::new(IndexMap::new()),
        })
    }

    pub fn parent(&self) -> Option<&Rc<ProvideScope>> {
        self.parent.as_ref()
    }

    /// Publish `value` under `key`, replacing any earlier entry in this scope.
    pub fn publish(&self, key: impl Into<Key>, value: impl Into<Provided>) {
        let replaced = self.entries.borrow_mut().insert(key.into(), value.into());
        drop(replaced);
    }

    /// Find `key` in this scope or the nearest ancestor that has it.
    pub fn lookup(&self, key: &Key) -> Option<Provided> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(found) = current.entries.borrow().get(key) {
                return Some(found.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Whether this scope itself (not an ancestor) has `key`.
    pub fn provides_own(&self, key: &Key) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Keys published directly in this scope, in publication order.
    pub fn own_keys(&self) -> Vec<Key> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Number of scopes above this one.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.parent.as_deref();
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent.as_deref();
        }
        depth
    }

    fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }
}

impl fmt::Debug for ProvideScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideScope")
            .field("keys", &self.own_keys())
            .field("depth", &self.depth())
            .finish()
    }
}

// =============================================================================
// Application Scope
// =============================================================================

thread_local! {
    static APP_SCOPE: Rc<ProvideScope> = ProvideScope::root();
}

/// The root scope every instance chain ends in.
pub fn app_scope() -> Rc<ProvideScope> {
    APP_SCOPE.with(Rc::clone)
}

/// Publish a value visible to every component on this thread.
pub fn app_provide(key: impl Into<Key>, value: impl Into<Provided>) {
    APP_SCOPE.with(|scope| scope.publish(key, value));
}

/// Drop all app-level provisions (for testing).
pub fn reset_app_scope() {
    APP_SCOPE.with(|scope| scope.clear());
}

// =============================================================================
// Instance API
// =============================================================================

/// Publish `value` to the descendants of `this`.
pub fn provide(this: PublicInstance, key: impl Into<Key>, value: impl Into<Provided>) -> HandlerResult<()> {
    let key = key.into();
    tracing::trace!(index = this.index(), %key, "provide");
    this.state()?.provides.publish(key, value);
    Ok(())
}

/// Look `key` up among the ancestors of `this`.
pub fn inject(this: PublicInstance, key: impl Into<Key>) -> HandlerResult<Option<Provided>> {
    let key = key.into();
    let state = this.state()?;
    Ok(state
        .provides
        .parent()
        .and_then(|scope| scope.lookup(&key)))
}
