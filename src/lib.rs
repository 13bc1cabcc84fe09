//! # spark-options
//!
//! Options-API component initialization for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A component is declared once as a static [`ComponentOptions`] record: a
//! data factory, computed entries, methods, watchers, provide/inject and
//! lifecycle hooks. Creating a component allocates an index in the instance
//! registry and runs [`apply_options`], which wires each declaration to its
//! reactive engine in a fixed order:
//!
//! ```text
//! ComponentOptions → allocate_instance → apply_options
//!                                          ├─ inject   → Context (values / accessors)
//!                                          ├─ methods  → Context (bound methods)
//!                                          ├─ data     → ReactiveStore (signals)
//!                                          ├─ computed → Context (derived accessors)
//!                                          ├─ watch    → effects + flush queues
//!                                          ├─ provide  → ProvideScope (for descendants)
//!                                          └─ hooks    → created now, others scheduled
//! ```
//!
//! Every user-authored function receives the [`PublicInstance`] explicitly.
//!
//! ## Modules
//!
//! - [`types`] - Keys, symbols, values and bound callables
//! - [`options`] - The options declaration and its shapes
//! - [`engine`] - Instance registry, context, public instance, component driver
//! - [`apply`] - The option application pass and its installers
//! - [`reactivity`] - Reactive store, refs and computed bindings
//! - [`watch`] - Watch engine and flush scheduler
//! - [`inject`] - Provide scopes and provide/inject
//! - [`lifecycle`] - Lifecycle phases and hook scheduling
//! - [`config`] - Thread-local runtime settings
//! - [`error`] - Error types

pub mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod inject;
pub mod lifecycle;
pub mod options;
pub mod reactivity;
pub mod types;
pub mod watch;

// Re-export commonly used items
pub use types::*;

pub use apply::{apply_options, create_watcher, resolve_injections};

pub use config::{config, reset_config, set_config, OptionsConfig};

pub use engine::{
    allocate_instance, children_of, create_component, get_allocated_count, get_id, get_index,
    is_allocated, mount_component, on_destroy, pop_parent_context, push_parent_context,
    release_instance, reset_registry, unmount_component, update_component, with_parent,
    Accessor, Context, Property, PublicInstance,
};

pub use error::{HandlerError, HandlerResult, OptionsError, Origin, Result};

pub use inject::{app_provide, inject, provide, ProvideScope};

pub use lifecycle::{LifecyclePhase, Phases};

pub use options::{
    ComponentOptions, ComputedOption, HookSpec, InjectDefault, InjectEntry, InjectOptions,
    ProvideOptions, WatchHandler, WatchSpec,
};

pub use reactivity::{computed, reactive, reference, ComputedRef, ReactiveStore, Ref};

pub use watch::{flush_watchers, pending_jobs, watch, FlushMode, FlushReport, WatchHandle, WatchOptions};
