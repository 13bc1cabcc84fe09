//! Ref - a single reactive value with shared identity.

use spark_signals::{signal, Signal};

use crate::types::Value;

/// A reactive reference. Clones share the same underlying signal, so a write
/// through one clone is observed by every other holder.
#[derive(Clone)]
pub struct Ref {
    signal: Signal<Value>,
}

/// Create a new reactive reference.
pub fn reference(value: Value) -> Ref {
    Ref {
        signal: signal(value),
    }
}

impl Ref {
    /// Read the inner value (tracked).
    pub fn get(&self) -> Value {
        self.signal.get()
    }

    /// Replace the inner value, notifying dependents.
    pub fn set(&self, value: Value) {
        self.signal.set(value);
    }

    /// Derive the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) {
        let next = f(&self.signal.get());
        self.signal.set(next);
    }
}

impl std::fmt::Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ref").field("value", &self.signal.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_value() {
        let theme = reference(json!("dark"));
        let other = theme.clone();

        other.set(json!("light"));
        assert_eq!(theme.get(), json!("light"));
    }

    #[test]
    fn test_update() {
        let count = reference(json!(1));
        count.update(|v| json!(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(count.get(), json!(2));
    }
}
