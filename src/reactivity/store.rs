//! Reactive Data Store - the materialized `data` of a component.
//!
//! A record is split into one `Signal<Value>` per top-level key, so an effect
//! that reads `count` only re-runs when `count` changes.
//!
//! Reading a key that does not exist yet tracks the store's shape instead,
//! so the reader re-runs once that key is inserted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::{signal, Signal};

use crate::types::{Record, Value};

/// Mutation-tracked wrapper around a data record.
///
/// Cloning is cheap; clones share the same fields.
#[derive(Clone)]
pub struct ReactiveStore {
    inner: Rc<StoreInner>,
}

struct StoreInner {
    fields: RefCell<IndexMap<String, Signal<Value>>>,
    /// Bumped whenever a key is added.
    shape: Signal<u64>,
    revision: Cell<u64>,
    /// A non-record factory result, kept untouched.
    raw: Option<Value>,
}

/// Wrap a data factory result in a reactive store.
///
/// Objects become per-field signals. Anything else is stored as-is and exposes
/// no fields.
pub fn reactive(value: Value) -> ReactiveStore {
    let (fields, raw) = match value {
        Value::Object(record) => (split_fields(record), None),
        other => {
            tracing::debug!(kind = value_kind(&other), "data factory returned a non-record value");
            (IndexMap::new(), Some(other))
        }
    };

    ReactiveStore {
        inner: Rc::new(StoreInner {
            fields: RefCell::new(fields),
            shape: signal(0),
            revision: Cell::new(0),
            raw,
        }),
    }
}

fn split_fields(record: Record) -> IndexMap<String, Signal<Value>> {
    record
        .into_iter()
        .map(|(key, value)| (key, signal(value)))
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ReactiveStore {
    /// Read a field. Tracks the field, or the store shape if it is missing.
    pub fn get(&self, key: &str) -> Option<Value> {
        let field = self.inner.fields.borrow().get(key).cloned();
        match field {
            Some(field) => Some(field.get()),
            None => {
                let _ = self.inner.shape.get();
                None
            }
        }
    }

    /// Write a field, inserting it if needed.
    pub fn set(&self, key: &str, value: Value) {
        let field = self.inner.fields.borrow().get(key).cloned();
        if let Some(field) = field {
            field.set(value);
            return;
        }

        self.inner
            .fields
            .borrow_mut()
            .insert(key.to_string(), signal(value));
        let revision = self.inner.revision.get() + 1;
        self.inner.revision.set(revision);
        self.inner.shape.set(revision);
    }

    /// Untracked membership check.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.borrow().is_empty()
    }

    /// Whether the factory produced a record.
    pub fn is_record(&self) -> bool {
        self.inner.raw.is_none()
    }

    /// Current contents as a plain value (tracked).
    pub fn snapshot(&self) -> Value {
        if let Some(raw) = &self.inner.raw {
            if self.is_empty() {
                return raw.clone();
            }
        }

        let fields: Vec<(String, Signal<Value>)> = self
            .inner
            .fields
            .borrow()
            .iter()
            .map(|(key, field)| (key.clone(), field.clone()))
            .collect();

        Value::Object(
            fields
                .into_iter()
                .map(|(key, field)| (key, field.get()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spark_signals::effect;
    use std::cell::Cell;

    #[test]
    fn test_record_fields() {
        let store = reactive(json!({ "count": 0, "label": "hi" }));
        assert!(store.is_record());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("count"), Some(json!(0)));
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.keys(), vec!["count".to_string(), "label".to_string()]);
    }

    #[test]
    fn test_field_reads_are_tracked() {
        let store = reactive(json!({ "count": 0, "other": 1 }));
        let runs = Rc::new(Cell::new(0));

        let runs_clone = runs.clone();
        let reader = store.clone();
        let _stop = effect(move || {
            let _ = reader.get("count");
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        store.set("count", json!(5));
        assert_eq!(runs.get(), 2);

        // Unrelated field does not re-run the reader
        store.set("other", json!(2));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_missing_key_tracks_insertion() {
        let store = reactive(json!({}));
        let seen = Rc::new(RefCell::new(None));

        let seen_clone = seen.clone();
        let reader = store.clone();
        let _stop = effect(move || {
            *seen_clone.borrow_mut() = reader.get("late");
        });
        assert_eq!(*seen.borrow(), None);

        store.set("late", json!("here"));
        assert_eq!(*seen.borrow(), Some(json!("here")));
    }

    #[test]
    fn test_non_record_is_kept() {
        let store = reactive(json!(42));
        assert!(!store.is_record());
        assert!(store.is_empty());
        assert_eq!(store.snapshot(), json!(42));
    }

    #[test]
    fn test_snapshot() {
        let store = reactive(json!({ "a": 1 }));
        store.set("b", json!([1, 2]));
        assert_eq!(store.snapshot(), json!({ "a": 1, "b": [1, 2] }));
    }
}
