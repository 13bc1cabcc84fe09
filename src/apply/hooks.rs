//! Lifecycle Hook Installer.

use std::rc::Rc;

use crate::engine::PublicInstance;
use crate::error::{OptionsError, Origin, Result};
use crate::lifecycle::{register_hook, LifecyclePhase};
use crate::options::ComponentOptions;

/// Phases handed to the lifecycle scheduler, in registration order.
const SCHEDULED_PHASES: [LifecyclePhase; 6] = [
    LifecyclePhase::BeforeMount,
    LifecyclePhase::Mounted,
    LifecyclePhase::BeforeUpdate,
    LifecyclePhase::Updated,
    LifecyclePhase::BeforeUnmount,
    LifecyclePhase::Unmounted,
];

/// Run the hooks of a synchronous phase now, in declaration order.
pub(crate) fn run_hooks_now(this: PublicInstance, options: &ComponentOptions, phase: LifecyclePhase) -> Result<()> {
    for hook in options.hooks_for(phase) {
        hook(this).map_err(|err| OptionsError::handler(Origin::Hook(phase), err))?;
    }
    Ok(())
}

/// Bind every scheduled-phase hook to `this` and register it.
pub(crate) fn register_hooks(this: PublicInstance, options: &ComponentOptions) {
    for phase in SCHEDULED_PHASES {
        for hook in options.hooks_for(phase) {
            register_hook(this.index(), phase, Rc::new(move || hook(this)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_instance, reset_registry};
    use crate::lifecycle::{hook_count, invoke_hooks, registered_phases, Phases};
    use std::cell::RefCell;

    #[test]
    fn test_created_runs_in_order() {
        reset_registry();
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = order.clone();
        let second = order.clone();
        let options = ComponentOptions::new()
            .created(move |_| {
                first.borrow_mut().push(1);
                Ok(())
            })
            .created(move |_| {
                second.borrow_mut().push(2);
                Ok(())
            });
        let this = allocate_instance(Rc::new(ComponentOptions::default()), None);

        run_hooks_now(this, &options, LifecyclePhase::Created).unwrap();
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_scheduled_hooks_registered() {
        reset_registry();
        let options = ComponentOptions::new()
            .mounted(|_| Ok(()))
            .mounted(|_| Ok(()))
            .unmounted(|_| Ok(()))
            .created(|_| Ok(()));
        let this = allocate_instance(Rc::new(ComponentOptions::default()), None);

        register_hooks(this, &options);

        assert_eq!(registered_phases(this.index()), Phases::MOUNTED | Phases::UNMOUNTED);
        assert_eq!(hook_count(this.index(), LifecyclePhase::Mounted), 2);
        invoke_hooks(this.index(), LifecyclePhase::Mounted).unwrap();
    }
}
