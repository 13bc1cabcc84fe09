//! Watch Engine - dependency-tracked subscriptions.
//!
//! `watch(getter, callback, options)` runs the getter inside a spark-signals
//! effect. Whatever the getter reads becomes a dependency. When one changes,
//! the getter re-runs and, if the result differs from the last delivered
//! value, the callback is scheduled with `(new, old)`.
//!
//! # Flush timing
//!
//! - [`FlushMode::Pre`] (default) - queued until [`flush_watchers`]
//! - [`FlushMode::Post`] - queued, runs after every pre job in the same flush
//! - [`FlushMode::Sync`] - delivered inside the effect run, immediately
//!
//! Several changes before a flush coalesce into one callback that sees the
//! latest value and the last delivered one. A getter that fails on a re-run
//! keeps its last good value; the failure is held on the watcher and surfaces
//! in the next [`flush_watchers`] report, whatever the flush mode.
//!
//! # Example
//!
//! ```ignore
//! use spark_options::reactivity::reference;
//! use spark_options::watch::{watch, flush_watchers, WatchOptions};
//!
//! let count = reference(json!(0));
//! let source = count.clone();
//! let handle = watch(
//!     Rc::new(move || Ok(source.get())),
//!     Rc::new(|new: &Value, old: &Value| { println!("{old} -> {new}"); Ok(()) }),
//!     WatchOptions::default(),
//! )?;
//!
//! count.set(json!(1));
//! flush_watchers(); // prints "0 -> 1"
//! handle.stop();
//! ```

mod scheduler;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect, untrack};

use crate::config;
use crate::error::{HandlerError, HandlerResult, OptionsError, Origin};
use crate::types::{BoundGetter, Value};

pub use scheduler::{flush_watchers, pending_jobs, reset_scheduler, FlushReport};

/// Callback receiving `(new, old)`.
pub type WatchCallback = Rc<dyn Fn(&Value, &Value) -> HandlerResult<()>>;

// =============================================================================
// Options
// =============================================================================

/// When a changed watcher delivers its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    #[default]
    Pre,
    Post,
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchOptions {
    /// Run the callback once at registration, with `old` = `Null`.
    pub immediate: bool,
    /// Deliver on every dependency change, even if the value compares equal.
    pub deep: bool,
    /// Stop after the first delivery.
    pub once: bool,
    /// `None` uses the configured default.
    pub flush: Option<FlushMode>,
}

// =============================================================================
// Watcher State
// =============================================================================

pub(crate) struct WatcherState {
    getter: BoundGetter,
    callback: WatchCallback,
    options: WatchOptions,
    flush: FlushMode,
    /// Latest getter result. `None` until the first run.
    current: RefCell<Option<Value>>,
    /// Value most recently passed to the callback as `new`.
    delivered: RefCell<Value>,
    queued: Cell<bool>,
    active: Cell<bool>,
    initial_error: RefCell<Option<HandlerError>>,
    /// Re-run getter failure waiting for the next flush.
    pending_error: RefCell<Option<HandlerError>>,
    stop: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Effect body: re-evaluate the getter and schedule delivery on change.
fn track(state: &Rc<WatcherState>) {
    if !state.active.get() {
        return;
    }

    let first_run = state.current.borrow().is_none();
    let value = match (state.getter)() {
        Ok(value) => value,
        Err(err) => {
            if first_run {
                *state.initial_error.borrow_mut() = Some(err);
            } else {
                state.pending_error.borrow_mut().get_or_insert(err);
                schedule(state, FlushMode::Pre);
            }
            return;
        }
    };

    let previous = state.current.replace(Some(value.clone()));
    let Some(previous) = previous else {
        *state.delivered.borrow_mut() = value;
        return;
    };

    if !state.options.deep && previous == value {
        return;
    }

    match state.flush {
        FlushMode::Sync => {
            if let Err(err) = deliver(state, false) {
                config::report_error(&OptionsError::handler(Origin::Scheduler, err));
            }
            // The effect cannot be disposed from inside its own run; the next
            // flush retires it.
            if !state.active.get() {
                schedule(state, FlushMode::Pre);
            }
        }
        mode => schedule(state, mode),
    }
}

fn schedule(state: &Rc<WatcherState>, mode: FlushMode) {
    if !state.queued.get() {
        state.queued.set(true);
        scheduler::queue_job(state.clone(), mode);
    }
}

/// Take a re-run getter failure, if the watcher is still live.
pub(crate) fn take_pending_error(state: &WatcherState) -> Option<HandlerError> {
    let err = state.pending_error.borrow_mut().take();
    err.filter(|_| state.active.get())
}

/// Run the callback with the latest value. Returns whether it was invoked.
pub(crate) fn deliver(state: &Rc<WatcherState>, stop_now: bool) -> HandlerResult<bool> {
    state.queued.set(false);
    if !state.active.get() {
        if stop_now {
            dispose(state);
        }
        return Ok(false);
    }

    let new = state.current.borrow().clone().unwrap_or(Value::Null);
    let old = state.delivered.replace(new.clone());
    if !state.options.deep && new == old {
        return Ok(false);
    }

    if state.options.once {
        state.active.set(false);
        if stop_now {
            dispose(state);
        }
    }

    (state.callback)(&new, &old).map(|()| true)
}

fn dispose(state: &WatcherState) {
    state.active.set(false);
    let stop = state.stop.borrow_mut().take();
    if let Some(stop) = stop {
        stop();
    }
}

// =============================================================================
// Watch Handle
// =============================================================================

/// A registered subscription. Dropping the handle does not stop it.
#[derive(Clone)]
pub struct WatchHandle {
    state: Rc<WatcherState>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").finish_non_exhaustive()
    }
}

impl WatchHandle {
    /// Stop tracking and discard any queued delivery. Idempotent.
    pub fn stop(&self) {
        dispose(&self.state);
    }

    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn flush_mode(&self) -> FlushMode {
        self.state.flush
    }
}

// =============================================================================
// watch()
// =============================================================================

/// Register a subscription.
///
/// The getter runs once immediately. If that first run fails, or an
/// `immediate` callback fails, the watcher is stopped and the error returned.
///
/// Inside a `batch` or a running effect, spark-signals defers the effect's
/// first run. The initial value is then read untracked here, and the deferred
/// run only collects dependencies.
pub fn watch(
    getter: BoundGetter,
    callback: WatchCallback,
    options: WatchOptions,
) -> HandlerResult<WatchHandle> {
    let flush = options
        .flush
        .unwrap_or_else(|| config::config().default_flush);

    let state = Rc::new(WatcherState {
        getter,
        callback,
        options,
        flush,
        current: RefCell::new(None),
        delivered: RefCell::new(Value::Null),
        queued: Cell::new(false),
        active: Cell::new(true),
        initial_error: RefCell::new(None),
        pending_error: RefCell::new(None),
        stop: RefCell::new(None),
    });

    let runner = state.clone();
    let stop = effect(move || track(&runner));
    *state.stop.borrow_mut() = Some(Box::new(stop));

    let deferred = state.current.borrow().is_none() && state.initial_error.borrow().is_none();
    if deferred {
        match untrack(|| (state.getter)()) {
            Ok(value) => {
                *state.delivered.borrow_mut() = value.clone();
                *state.current.borrow_mut() = Some(value);
            }
            Err(err) => *state.initial_error.borrow_mut() = Some(err),
        }
    }

    let handle = WatchHandle { state };

    let initial_error = handle.state.initial_error.borrow_mut().take();
    if let Some(err) = initial_error {
        handle.stop();
        return Err(err);
    }

    if options.immediate {
        let value = handle.state.current.borrow().clone().unwrap_or(Value::Null);
        if options.once {
            handle.stop();
        }
        if let Err(err) = (handle.state.callback)(&value, &Value::Null) {
            handle.stop();
            return Err(err);
        }
    }

    tracing::trace!(?flush, immediate = options.immediate, "watcher registered");
    Ok(handle)
}
