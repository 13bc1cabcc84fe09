//! Component Engine - instance registry, context and driver.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, ID mapping, parent context, instance state
//! - Context: The per-instance property bag (values, methods, accessors)
//! - PublicInstance: Copy handle used as the receiver for user functions
//! - Component: create / mount / update / unmount
//!
//! # Architecture
//!
//! Components are NOT objects. They are indices into a thread-local registry:
//!
//! ```text
//! Index 0: App     (parent=None, scope=app→0, data={..}, ctx={..})
//! Index 1: Toolbar (parent=0,    scope=0→1,   data=None, ctx={..})
//! Index 2: Button  (parent=1,    scope=1→2,   data={..}, ctx={..})
//! ```
//!
//! Closures installed on a context capture the instance index, never the
//! instance itself, so nothing forms an `Rc` cycle.

mod component;
mod context;
mod instance;
mod registry;

pub use component::*;
pub use context::*;
pub use instance::*;
pub use registry::*;

pub(crate) use registry::InstanceState;
