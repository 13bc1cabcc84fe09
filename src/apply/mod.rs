//! Option Application - turns a static declaration into live instance state.
//!
//! [`apply_options`] runs the installers in a fixed order. Each step may
//! observe what earlier steps installed on the context, never the reverse:
//!
//! ```text
//! beforeCreate hooks (run now)
//!   → injections       ctx: values / accessors / methods from ancestors
//!   → methods          ctx: bound methods
//!   → data             data store (shadows ctx on reads)
//!   → computed         ctx: memoized accessors
//!   → watchers         subscriptions, stopped on destroy
//!   → provide          own scope, visible to descendants
//!   → created hooks    (run now)
//!   → other hooks      handed to the lifecycle scheduler
//! ```
//!
//! Malformed declarations are skipped. A failing user function aborts the
//! rest of the pass and its error is returned tagged with where it came from.

mod computed;
mod hooks;
mod injections;
mod provide;
mod watchers;

use std::rc::Rc;

pub use computed::install_computed;
pub use injections::resolve_injections;
pub use provide::{evaluate_provide, install_provide};
pub use watchers::create_watcher;

use crate::engine::{on_destroy, Context, InstanceState, PublicInstance};
use crate::error::{OptionsError, Origin, Result};
use crate::inject::ProvideScope;
use crate::lifecycle::LifecyclePhase;
use crate::options::ComponentOptions;
use crate::reactivity::reactive;
use crate::types::{Key, Value};

/// Apply the instance's options to it, in one synchronous pass.
pub fn apply_options(this: PublicInstance) -> Result<()> {
    let index = this.index();
    let state = this
        .state()
        .map_err(|_| OptionsError::UnknownInstance { index })?;
    let options = state.options.clone();
    let ctx = state.context.clone();

    let _span = tracing::debug_span!(
        "apply_options",
        index,
        component = options.name.as_deref().unwrap_or("anonymous"),
    )
    .entered();

    hooks::run_hooks_now(this, &options, LifecyclePhase::BeforeCreate)?;

    if let Some(inject) = &options.inject {
        let scope = state
            .provides
            .parent()
            .cloned()
            .unwrap_or_else(ProvideScope::root);
        resolve_injections(inject, &ctx, &scope);
    }

    bind_methods(this, &options, &ctx);
    materialize_data(this, &options, &state)?;

    for (key, option) in &options.computed {
        install_computed(this, &ctx, key, option);
    }

    for (key, spec) in &options.watch {
        let handles = create_watcher(spec, &ctx, this, key)
            .map_err(|err| OptionsError::handler(Origin::Watcher(Key::from(key)), err))?;
        for handle in handles {
            on_destroy(index, move || handle.stop());
        }
    }

    if let Some(provide) = &options.provide {
        install_provide(provide, this, &state.provides)?;
    }

    hooks::run_hooks_now(this, &options, LifecyclePhase::Created)?;
    hooks::register_hooks(this, &options);

    tracing::debug!(
        properties = ctx.len(),
        has_data = state.data.borrow().is_some(),
        "options applied"
    );
    Ok(())
}

/// Install every method bound to `this` on the context.
fn bind_methods(this: PublicInstance, options: &ComponentOptions, ctx: &Context) {
    for (key, method) in &options.methods {
        let method = method.clone();
        ctx.define_method(key, Rc::new(move |args: &[Value]| method(this, args)));
        tracing::trace!(key = key.as_str(), "method bound");
    }
}

/// Run the data factory and wrap its result in a reactive store.
fn materialize_data(this: PublicInstance, options: &ComponentOptions, state: &InstanceState) -> Result<()> {
    let Some(factory) = &options.data else {
        return Ok(());
    };

    let value = factory(this).map_err(|err| OptionsError::handler(Origin::DataFactory, err))?;
    let store = reactive(value);
    tracing::trace!(fields = store.len(), "data materialized");
    *state.data.borrow_mut() = Some(store);
    Ok(())
}
