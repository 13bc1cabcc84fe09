//! Lifecycle Scheduler - per-instance hook lists keyed by phase.
//!
//! Hooks registered here are invoked later by whoever drives the component:
//! [`run_mount`], [`run_update`], or the unmount routine in the engine.
//! `before_create` and `created` never pass through here; option application
//! runs them on the spot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::{HandlerResult, OptionsError, Origin, Result};

/// A registered hook with its receiver already captured.
pub type Hook = Rc<dyn Fn() -> HandlerResult<()>>;

// =============================================================================
// Phases
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeUnmount,
    Unmounted,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 8] = [
        Self::BeforeCreate,
        Self::Created,
        Self::BeforeMount,
        Self::Mounted,
        Self::BeforeUpdate,
        Self::Updated,
        Self::BeforeUnmount,
        Self::Unmounted,
    ];

    /// Option name of the phase, e.g. `beforeMount`.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeCreate => "beforeCreate",
            Self::Created => "created",
            Self::BeforeMount => "beforeMount",
            Self::Mounted => "mounted",
            Self::BeforeUpdate => "beforeUpdate",
            Self::Updated => "updated",
            Self::BeforeUnmount => "beforeUnmount",
            Self::Unmounted => "unmounted",
        }
    }

    /// Phases that run during option application instead of being scheduled.
    pub fn is_synchronous(self) -> bool {
        matches!(self, Self::BeforeCreate | Self::Created)
    }

    pub fn flag(self) -> Phases {
        match self {
            Self::BeforeCreate => Phases::BEFORE_CREATE,
            Self::Created => Phases::CREATED,
            Self::BeforeMount => Phases::BEFORE_MOUNT,
            Self::Mounted => Phases::MOUNTED,
            Self::BeforeUpdate => Phases::BEFORE_UPDATE,
            Self::Updated => Phases::UPDATED,
            Self::BeforeUnmount => Phases::BEFORE_UNMOUNT,
            Self::Unmounted => Phases::UNMOUNTED,
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of phases with at least one registered hook.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Phases: u8 {
        const BEFORE_CREATE  = 1 << 0;
        const CREATED        = 1 << 1;
        const BEFORE_MOUNT   = 1 << 2;
        const MOUNTED        = 1 << 3;
        const BEFORE_UPDATE  = 1 << 4;
        const UPDATED        = 1 << 5;
        const BEFORE_UNMOUNT = 1 << 6;
        const UNMOUNTED      = 1 << 7;
    }
}

// =============================================================================
// Hook Storage
// =============================================================================

thread_local! {
    static HOOKS: RefCell<HashMap<usize, HashMap<LifecyclePhase, Vec<Hook>>>> = RefCell::new(HashMap::new());
}

/// Register a hook for `phase` on the instance at `index`.
pub fn register_hook(index: usize, phase: LifecyclePhase, hook: Hook) {
    HOOKS.with(|hooks| {
        hooks
            .borrow_mut()
            .entry(index)
            .or_default()
            .entry(phase)
            .or_default()
            .push(hook);
    });
    tracing::trace!(index, %phase, "lifecycle hook registered");
}

pub fn on_before_mount(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::BeforeMount, Rc::new(hook));
}

pub fn on_mounted(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::Mounted, Rc::new(hook));
}

pub fn on_before_update(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::BeforeUpdate, Rc::new(hook));
}

pub fn on_updated(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::Updated, Rc::new(hook));
}

pub fn on_before_unmount(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::BeforeUnmount, Rc::new(hook));
}

pub fn on_unmounted(index: usize, hook: impl Fn() -> HandlerResult<()> + 'static) {
    register_hook(index, LifecyclePhase::Unmounted, Rc::new(hook));
}

// =============================================================================
// Invocation
// =============================================================================

/// Run every hook registered for `phase`, in registration order.
///
/// Stops at the first failure.
pub fn invoke_hooks(index: usize, phase: LifecyclePhase) -> Result<()> {
    // Clone the list out so hooks can register more hooks.
    let hooks: Vec<Hook> = HOOKS.with(|hooks| {
        hooks
            .borrow()
            .get(&index)
            .and_then(|phases| phases.get(&phase))
            .cloned()
            .unwrap_or_default()
    });

    if !hooks.is_empty() {
        tracing::trace!(index, %phase, count = hooks.len(), "invoking lifecycle hooks");
    }

    for hook in hooks {
        hook().map_err(|err| OptionsError::handler(Origin::Hook(phase), err))?;
    }
    Ok(())
}

/// Drive the mount phases: before-mount, then mounted.
pub fn run_mount(index: usize) -> Result<()> {
    invoke_hooks(index, LifecyclePhase::BeforeMount)?;
    invoke_hooks(index, LifecyclePhase::Mounted)
}

/// Drive the update phases: before-update, then updated.
pub fn run_update(index: usize) -> Result<()> {
    invoke_hooks(index, LifecyclePhase::BeforeUpdate)?;
    invoke_hooks(index, LifecyclePhase::Updated)
}

// =============================================================================
// Queries
// =============================================================================

pub fn registered_phases(index: usize) -> Phases {
    HOOKS.with(|hooks| {
        hooks
            .borrow()
            .get(&index)
            .map(|phases| {
                phases
                    .iter()
                    .filter(|(_, list)| !list.is_empty())
                    .fold(Phases::empty(), |acc, (phase, _)| acc | phase.flag())
            })
            .unwrap_or_default()
    })
}

pub fn hook_count(index: usize, phase: LifecyclePhase) -> usize {
    HOOKS.with(|hooks| {
        hooks
            .borrow()
            .get(&index)
            .and_then(|phases| phases.get(&phase))
            .map_or(0, Vec::len)
    })
}

/// Drop every hook of one instance.
pub fn clear_hooks(index: usize) {
    let removed = HOOKS.with(|hooks| hooks.borrow_mut().remove(&index));
    drop(removed);
}

/// Drop all hooks (for testing).
pub fn reset_hooks() {
    let removed = HOOKS.with(|hooks| std::mem::take(&mut *hooks.borrow_mut()));
    drop(removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;

    #[test]
    fn test_hooks_run_in_order() {
        reset_hooks();
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = order.clone();
        on_mounted(0, move || {
            first.borrow_mut().push(1);
            Ok(())
        });
        let second = order.clone();
        on_mounted(0, move || {
            second.borrow_mut().push(2);
            Ok(())
        });

        invoke_hooks(0, LifecyclePhase::Mounted).unwrap();
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_run_mount_order() {
        reset_hooks();
        let order = Rc::new(RefCell::new(Vec::new()));

        let mounted = order.clone();
        on_mounted(3, move || {
            mounted.borrow_mut().push("mounted");
            Ok(())
        });
        let before = order.clone();
        on_before_mount(3, move || {
            before.borrow_mut().push("beforeMount");
            Ok(())
        });

        run_mount(3).unwrap();
        assert_eq!(*order.borrow(), vec!["beforeMount", "mounted"]);
    }

    #[test]
    fn test_first_failure_stops() {
        reset_hooks();
        let ran = Rc::new(RefCell::new(false));
        let ran_clone = ran.clone();

        on_updated(1, || Err(HandlerError::new("bad update")));
        on_updated(1, move || {
            *ran_clone.borrow_mut() = true;
            Ok(())
        });

        let err = invoke_hooks(1, LifecyclePhase::Updated).unwrap_err();
        assert_eq!(err.origin(), Some(&Origin::Hook(LifecyclePhase::Updated)));
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_registered_phases() {
        reset_hooks();
        on_before_unmount(2, || Ok(()));
        on_unmounted(2, || Ok(()));

        assert_eq!(
            registered_phases(2),
            Phases::BEFORE_UNMOUNT | Phases::UNMOUNTED
        );
        assert_eq!(hook_count(2, LifecyclePhase::Unmounted), 1);
        assert_eq!(registered_phases(9), Phases::empty());

        clear_hooks(2);
        assert_eq!(registered_phases(2), Phases::empty());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::BeforeMount.to_string(), "beforeMount");
        assert!(LifecyclePhase::Created.is_synchronous());
        assert!(!LifecyclePhase::Mounted.is_synchronous());
    }
}
