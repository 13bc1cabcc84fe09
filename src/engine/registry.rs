//! Component Registry - Index allocation for component instances.
//!
//! Manages the lifecycle of component indices:
//! - ID ↔ Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - ReactiveSet for allocated indices (deriveds react to add/remove)
//! - Parent context stack for nested component creation
//! - Per-index instance state (options, context, data store, provide scope)

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::ReactiveSet;

use super::context::Context;
use super::instance::PublicInstance;
use crate::inject::{app_scope, reset_app_scope, ProvideScope};
use crate::lifecycle::{clear_hooks, reset_hooks};
use crate::options::ComponentOptions;
use crate::reactivity::ReactiveStore;
use crate::watch::reset_scheduler;

// =============================================================================
// Instance State
// =============================================================================

/// Everything one running component owns.
pub(crate) struct InstanceState {
    pub(crate) options: Rc<ComponentOptions>,
    pub(crate) context: Context,
    pub(crate) data: RefCell<Option<ReactiveStore>>,
    pub(crate) provides: Rc<ProvideScope>,
    pub(crate) parent: Option<usize>,
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map component ID to index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Map index to component ID.
    static INDEX_TO_ID: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Set of currently allocated indices (for iteration).
    /// Using ReactiveSet so deriveds that iterate over this set
    /// automatically react when components are added or removed.
    static ALLOCATED_INDICES: RefCell<ReactiveSet<usize>> = RefCell::new(ReactiveSet::new());

    /// Instance state per allocated index.
    static INSTANCES: RefCell<HashMap<usize, Rc<InstanceState>>> = RefCell::new(HashMap::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating unique IDs.
    static ID_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Stack of parent indices for nested component creation.
    static PARENT_STACK: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Destroy callbacks registered per index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Parent Context Stack
// =============================================================================

/// Get current parent index (None if at root).
pub fn get_current_parent_index() -> Option<usize> {
    PARENT_STACK.with(|stack| stack.borrow().last().copied())
}

/// Push a parent index onto the stack.
pub fn push_parent_context(index: usize) {
    PARENT_STACK.with(|stack| stack.borrow_mut().push(index));
}

/// Pop a parent index from the stack.
pub fn pop_parent_context() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

/// Run `f` with `parent` as the current parent context.
pub fn with_parent<R>(parent: PublicInstance, f: impl FnOnce() -> R) -> R {
    push_parent_context(parent.index());
    let result = f();
    pop_parent_context();
    result
}

// =============================================================================
// Index Allocation
// =============================================================================

fn next_component_id() -> String {
    ID_COUNTER.with(|counter| {
        let mut counter = counter.borrow_mut();
        let id = format!("c{}", *counter);
        *counter += 1;
        id
    })
}

/// Allocate an instance for `options`.
///
/// The parent is taken from the parent context stack. The new instance gets
/// its own provide scope, chained to the parent's (or the app scope at the
/// root).
///
/// # Arguments
/// * `id` - Optional component ID. If not provided, one is generated. An ID
///   that is already allocated returns the existing instance.
pub fn allocate_instance(options: Rc<ComponentOptions>, id: Option<&str>) -> PublicInstance {
    let component_id = match id {
        Some(id) => id.to_string(),
        None => next_component_id(),
    };

    // Check if already allocated
    let existing = ID_TO_INDEX.with(|map| map.borrow().get(&component_id).copied());
    if let Some(index) = existing {
        return PublicInstance::new(index);
    }

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        free.pop().unwrap_or_else(|| {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        })
    });

    let parent = get_current_parent_index().filter(|&p| is_allocated(p));
    let parent_scope = parent
        .and_then(instance_state)
        .map(|state| state.provides.clone())
        .unwrap_or_else(app_scope);

    let state = InstanceState {
        options,
        context: Context::new(),
        data: RefCell::new(None),
        provides: ProvideScope::child(&parent_scope),
        parent,
    };

    // Register mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(component_id.clone(), index);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().insert(index, component_id.clone());
    });
    INSTANCES.with(|instances| {
        instances.borrow_mut().insert(index, Rc::new(state));
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    tracing::trace!(index, id = %component_id, ?parent, "instance allocated");
    PublicInstance::new(index)
}

/// Release an instance back to the pool.
///
/// Also recursively releases all children!
pub fn release_instance(index: usize) {
    let id = INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned());
    let Some(id) = id else { return };

    // FIRST: release all children (recursive!)
    for child_index in children_of(index) {
        release_instance(child_index);
    }

    // Run destroy callbacks before cleanup
    run_destroy_callbacks(index);
    clear_hooks(index);

    // Clean up mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().remove(&id);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().remove(&index);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });
    let state = INSTANCES.with(|instances| instances.borrow_mut().remove(&index));
    if let Some(state) = state {
        state.context.clear();
    }

    // Return to pool for reuse
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    tracing::trace!(index, id = %id, "instance released");

    // AUTO-CLEANUP: When all components are destroyed, restart numbering
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        FREE_INDICES.with(|free| {
            free.borrow_mut().clear();
        });
        NEXT_INDEX.with(|next| {
            *next.borrow_mut() = 0;
        });
    }
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the component at `index` is destroyed.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear destroy callbacks for an index.
pub(crate) fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

/// Number of destroy callbacks waiting on an index.
pub fn destroy_callback_count(index: usize) -> usize {
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow().get(&index).map_or(0, Vec::len))
}

// =============================================================================
// Lookups
// =============================================================================

pub(crate) fn instance_state(index: usize) -> Option<Rc<InstanceState>> {
    INSTANCES.with(|instances| instances.borrow().get(&index).cloned())
}

/// Get index for a component ID.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get ID for an index.
pub fn get_id(index: usize) -> Option<String> {
    INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned())
}

/// Get all currently allocated indices.
///
/// Note: This creates a reactive dependency when called from a derived/effect.
pub fn get_allocated_indices() -> Vec<usize> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect())
}

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Get the count of currently allocated components.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

/// Direct children of an instance, in index order.
pub fn children_of(index: usize) -> Vec<usize> {
    let mut children: Vec<usize> = INSTANCES.with(|instances| {
        instances
            .borrow()
            .iter()
            .filter(|(_, state)| state.parent == Some(index))
            .map(|(&child, _)| child)
            .collect()
    });
    children.sort_unstable();
    children
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
///
/// Also clears the watcher queues, lifecycle hooks and app scope.
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    INDEX_TO_ID.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    let instances = INSTANCES.with(|instances| std::mem::take(&mut *instances.borrow_mut()));
    for state in instances.values() {
        state.context.clear();
    }
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    PARENT_STACK.with(|stack| stack.borrow_mut().clear());
    // Still run pending destroy callbacks so watchers stop tracking.
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| std::mem::take(&mut *callbacks.borrow_mut()));
    for callback in callbacks.into_values().flatten() {
        callback();
    }
    reset_scheduler();
    reset_hooks();
    reset_app_scope();
}
