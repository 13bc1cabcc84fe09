//! Injection Resolver.

use std::rc::Rc;

use crate::config;
use crate::engine::{Accessor, Context};
use crate::inject::ProvideScope;
use crate::options::InjectOptions;
use crate::types::{Provided, Value};

/// Resolve every inject entry against `scope` and install the results on `ctx`.
///
/// - refs and computed refs become accessors reading/writing the inner value
/// - functions become methods
/// - plain values are assigned
/// - an unresolved key installs its default (when enabled) or `Null`
///
/// Never fails. `scope` is where lookup starts; for a component that is its
/// parent's scope.
pub fn resolve_injections(inject: &InjectOptions, ctx: &Context, scope: &ProvideScope) {
    let settings = config::config();

    for (key, entry) in inject.normalize() {
        let source = entry.source(&key);

        match scope.lookup(source) {
            Some(Provided::Ref(reference)) => {
                let read = reference.clone();
                ctx.define_accessor(
                    key.clone(),
                    Accessor::new(
                        Rc::new(move || Ok(read.get())),
                        Rc::new(move |value: Value| {
                            reference.set(value);
                            Ok(())
                        }),
                    ),
                );
            }
            Some(Provided::Computed(binding)) => {
                let read = binding.clone();
                ctx.define_accessor(
                    key.clone(),
                    Accessor::new(Rc::new(move || read.get()), Rc::new(move |value: Value| binding.set(value))),
                );
            }
            Some(Provided::Function(method)) => ctx.define_method(key.clone(), method),
            Some(Provided::Value(value)) => ctx.assign(key.clone(), value),
            None => {
                let fallback = match entry.default_value() {
                    Some(default) if settings.apply_inject_defaults => Some(default.resolve()),
                    _ => None,
                };
                if fallback.is_none() && settings.warn_missing_injection {
                    tracing::warn!(%key, from = %source, "injection not found");
                }
                ctx.assign(key.clone(), fallback.unwrap_or(Value::Null));
            }
        }

        tracing::trace!(%key, "injection installed");
    }
}
