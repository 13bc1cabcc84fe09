//! Reactivity - the state, ref, and computed engines components bind to.
//!
//! All three are thin layers over spark-signals:
//! - [`reactive`] - a keyed record where every field is its own `Signal`
//! - [`reference`] - a single shared `Signal<Value>` (a "ref")
//! - [`computed`] - a memoized `Derived` with an optional setter
//!
//! Reads inside an effect or derived are tracked; writes notify synchronously.

mod computed;
mod reference;
mod store;

pub use computed::{computed, ComputedRef};
pub use reference::{reference, Ref};
pub use store::{reactive, ReactiveStore};
