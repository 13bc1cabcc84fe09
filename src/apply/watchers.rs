//! Watcher Registrar - normalizes watch declarations into subscriptions.
//!
//! ```text
//! Named("onChange")              → ctx method "onChange"        → 1 subscription
//! Handler(f)                     → f bound to this              → 1 subscription
//! Described { handler, options } → either of the above + options → 1 subscription
//! List([..])                     → recurse per element          → N subscriptions
//! ```
//!
//! A named handler that is not a method on the context registers nothing.

use std::rc::Rc;

use crate::engine::{Context, PublicInstance};
use crate::error::HandlerResult;
use crate::options::{WatchFn, WatchHandler, WatchSpec};
use crate::types::{BoundGetter, Key, Value};
use crate::watch::{watch, WatchCallback, WatchHandle, WatchOptions};

/// Register every subscription `spec` describes for the property `key`.
///
/// The getter reads `key` through `this` at evaluation time, so it follows
/// data, computed and injected properties alike. A dotted key such as
/// `"user.name"` walks into the value. If any registration fails, the ones
/// already made are stopped and the error returned.
pub fn create_watcher(
    spec: &WatchSpec,
    ctx: &Context,
    this: PublicInstance,
    key: &str,
) -> HandlerResult<Vec<WatchHandle>> {
    let mut handles = Vec::new();
    if let Err(err) = register(spec, ctx, this, key, &mut handles) {
        for handle in &handles {
            handle.stop();
        }
        return Err(err);
    }
    Ok(handles)
}

fn register(
    spec: &WatchSpec,
    ctx: &Context,
    this: PublicInstance,
    key: &str,
    handles: &mut Vec<WatchHandle>,
) -> HandlerResult<()> {
    let (callback, options) = match spec {
        WatchSpec::List(specs) => {
            for spec in specs {
                register(spec, ctx, this, key, handles)?;
            }
            return Ok(());
        }
        WatchSpec::Named(name) => (named_callback(ctx, name), WatchOptions::default()),
        WatchSpec::Handler(handler) => (Some(bind_handler(handler, this)), WatchOptions::default()),
        WatchSpec::Described { handler, options } => {
            let callback = match handler {
                WatchHandler::Named(name) => named_callback(ctx, name),
                WatchHandler::Callback(handler) => Some(bind_handler(handler, this)),
            };
            (callback, *options)
        }
    };

    let Some(callback) = callback else {
        return Ok(());
    };

    handles.push(watch(property_getter(this, key), callback, options)?);
    tracing::trace!(key, "watcher registered");
    Ok(())
}

fn bind_handler(handler: &WatchFn, this: PublicInstance) -> WatchCallback {
    let handler = handler.clone();
    Rc::new(move |new: &Value, old: &Value| handler(this, new, old))
}

/// Resolve a context method by name, calling it with `[new, old]`.
fn named_callback(ctx: &Context, name: &str) -> Option<WatchCallback> {
    let Some(method) = ctx.method(&Key::from(name)) else {
        tracing::debug!(handler = name, "watch handler is not a method, skipping");
        return None;
    };
    Some(Rc::new(move |new: &Value, old: &Value| {
        method(&[new.clone(), old.clone()]).map(|_| ())
    }))
}

fn property_getter(this: PublicInstance, key: &str) -> BoundGetter {
    let mut segments = key.split('.').map(str::to_string);
    let head = segments.next().unwrap_or_default();
    let rest: Vec<String> = segments.collect();

    Rc::new(move || {
        let mut value = this.get(head.as_str())?;
        for segment in &rest {
            value = match value {
                Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
                Value::Array(mut items) => match segment.parse::<usize>() {
                    Ok(i) if i < items.len() => items.swap_remove(i),
                    _ => Value::Null,
                },
                _ => return Ok(Value::Null),
            };
        }
        Ok(value)
    })
}
