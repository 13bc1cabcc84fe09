//! Component driver - create, mount, update and unmount instances.
//!
//! ```text
//! create_component   allocate → apply options (beforeCreate … created)
//! mount_component    beforeMount → children → mounted
//! update_component   beforeUpdate → updated
//! unmount_component  beforeUnmount → children → destroy callbacks → unmounted → free
//! ```
//!
//! Children are whatever was created while the parent was on the parent
//! context stack (see [`with_parent`](super::with_parent)).

use std::rc::Rc;

use super::instance::PublicInstance;
use super::registry::{
    allocate_instance, children_of, get_index, is_allocated, release_instance,
    run_destroy_callbacks,
};
use crate::apply::apply_options;
use crate::config;
use crate::error::{OptionsError, Result};
use crate::lifecycle::{invoke_hooks, LifecyclePhase};
use crate::options::ComponentOptions;

/// Allocate an instance and apply its options.
///
/// If option application fails the instance is released again and the error
/// returned. An `id` that is already allocated returns the existing instance
/// untouched.
pub fn create_component(
    options: impl Into<Rc<ComponentOptions>>,
    id: Option<&str>,
) -> Result<PublicInstance> {
    if let Some(index) = id.and_then(get_index) {
        return Ok(PublicInstance::new(index));
    }

    let this = allocate_instance(options.into(), id);
    if let Err(err) = apply_options(this) {
        tracing::debug!(index = this.index(), %err, "option application failed, releasing instance");
        release_instance(this.index());
        return Err(err);
    }
    Ok(this)
}

fn ensure_allocated(index: usize) -> Result<()> {
    if is_allocated(index) {
        Ok(())
    } else {
        Err(OptionsError::UnknownInstance { index })
    }
}

/// Run mount hooks: this instance's `beforeMount`, every child's mount, then
/// this instance's `mounted`.
pub fn mount_component(index: usize) -> Result<()> {
    ensure_allocated(index)?;
    invoke_hooks(index, LifecyclePhase::BeforeMount)?;
    for child in children_of(index) {
        mount_component(child)?;
    }
    invoke_hooks(index, LifecyclePhase::Mounted)
}

/// Run update hooks for one instance.
pub fn update_component(index: usize) -> Result<()> {
    ensure_allocated(index)?;
    invoke_hooks(index, LifecyclePhase::BeforeUpdate)?;
    invoke_hooks(index, LifecyclePhase::Updated)
}

/// Tear an instance down and free its index.
///
/// Teardown always completes. Hook failures are passed to the configured
/// error handler and the first one is returned.
pub fn unmount_component(index: usize) -> Result<()> {
    ensure_allocated(index)?;
    let mut first_error = None;

    report_hook_failure(&mut first_error, invoke_hooks(index, LifecyclePhase::BeforeUnmount));
    for child in children_of(index) {
        // A child already reported its own failures.
        if let Err(err) = unmount_component(child) {
            first_error.get_or_insert(err);
        }
    }
    // Stops watchers registered during option application.
    run_destroy_callbacks(index);
    report_hook_failure(&mut first_error, invoke_hooks(index, LifecyclePhase::Unmounted));

    release_instance(index);
    tracing::trace!(index, "component unmounted");

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn report_hook_failure(first_error: &mut Option<OptionsError>, result: Result<()>) {
    if let Err(err) = result {
        config::report_error(&err);
        first_error.get_or_insert(err);
    }
}
