//! Component Options - the static declaration of a component's behavior.
//!
//! Options are authored once and never mutated by option application. Build
//! them with struct update syntax or the chaining methods:
//!
//! ```ignore
//! use spark_options::options::{ComponentOptions, ComputedOption, WatchSpec};
//!
//! let counter = ComponentOptions::new()
//!     .name("Counter")
//!     .data(|_| Ok(json!({ "count": 0 })))
//!     .computed("double", ComputedOption::getter(|this| {
//!         Ok(json!(this.get("count")?.as_i64().unwrap_or(0) * 2))
//!     }))
//!     .method("onCountChange", |_, _| Ok(Value::Null))
//!     .watch("count", WatchSpec::named("onCountChange"));
//! ```

mod shapes;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::engine::PublicInstance;
use crate::error::HandlerResult;
use crate::lifecycle::LifecyclePhase;
use crate::types::{Key, ProvideRecord, Provided, Value};

pub use shapes::*;

#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    pub data: Option<DataFn>,
    pub computed: IndexMap<String, ComputedOption>,
    pub methods: IndexMap<String, MethodFn>,
    pub watch: IndexMap<String, WatchSpec>,
    pub provide: Option<ProvideOptions>,
    pub inject: Option<InjectOptions>,
    pub hooks: IndexMap<LifecyclePhase, HookSpec>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn data(mut self, factory: impl Fn(PublicInstance) -> HandlerResult<Value> + 'static) -> Self {
        self.data = Some(Rc::new(factory));
        self
    }

    pub fn computed(mut self, key: impl Into<String>, option: ComputedOption) -> Self {
        self.computed.insert(key.into(), option);
        self
    }

    pub fn method(
        mut self,
        key: impl Into<String>,
        method: impl Fn(PublicInstance, &[Value]) -> HandlerResult<Value> + 'static,
    ) -> Self {
        self.methods.insert(key.into(), Rc::new(method));
        self
    }

    pub fn watch(mut self, key: impl Into<String>, spec: WatchSpec) -> Self {
        self.watch.insert(key.into(), spec);
        self
    }

    pub fn inject(mut self, inject: InjectOptions) -> Self {
        self.inject = Some(inject);
        self
    }

    pub fn provide(mut self, provide: ProvideOptions) -> Self {
        self.provide = Some(provide);
        self
    }

    /// Add one entry to a record-form provide declaration.
    ///
    /// Replaces a factory declaration if there was one.
    pub fn provide_value(mut self, key: impl Into<Key>, value: impl Into<Provided>) -> Self {
        let mut record = match self.provide.take() {
            Some(ProvideOptions::Record(record)) => record,
            _ => ProvideRecord::new(),
        };
        record.insert(key.into(), value.into());
        self.provide = Some(ProvideOptions::Record(record));
        self
    }

    pub fn provide_factory(
        mut self,
        factory: impl Fn(PublicInstance) -> HandlerResult<ProvideRecord> + 'static,
    ) -> Self {
        self.provide = Some(ProvideOptions::Factory(Rc::new(factory)));
        self
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Append a hook for `phase`. Repeated calls build a list.
    pub fn hook(
        mut self,
        phase: LifecyclePhase,
        hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static,
    ) -> Self {
        let hook: HookFn = Rc::new(hook);
        match self.hooks.get_mut(&phase) {
            Some(spec) => spec.push(hook),
            None => {
                self.hooks.insert(phase, HookSpec::Single(hook));
            }
        }
        self
    }

    pub fn before_create(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::BeforeCreate, hook)
    }

    pub fn created(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::Created, hook)
    }

    pub fn before_mount(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::BeforeMount, hook)
    }

    pub fn mounted(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::Mounted, hook)
    }

    pub fn before_update(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::BeforeUpdate, hook)
    }

    pub fn updated(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::Updated, hook)
    }

    pub fn before_unmount(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::BeforeUnmount, hook)
    }

    pub fn unmounted(self, hook: impl Fn(PublicInstance) -> HandlerResult<()> + 'static) -> Self {
        self.hook(LifecyclePhase::Unmounted, hook)
    }

    pub fn hooks_for(&self, phase: LifecyclePhase) -> Vec<HookFn> {
        self.hooks.get(&phase).map(HookSpec::hooks).unwrap_or_default()
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("name", &self.name)
            .field("data", &self.data.is_some())
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("watch", &self.watch.keys().collect::<Vec<_>>())
            .field("provide", &self.provide)
            .field("inject", &self.inject)
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
