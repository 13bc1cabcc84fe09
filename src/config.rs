//! Runtime configuration.
//!
//! Thread-local settings shared by every component created on this thread.
//!
//! ```ignore
//! use spark_options::config::{set_config, OptionsConfig};
//!
//! set_config(OptionsConfig {
//!     warn_missing_injection: false,
//!     ..OptionsConfig::default()
//! });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::OptionsError;
use crate::watch::FlushMode;

/// Receives failures that have no synchronous caller to propagate to.
pub type ErrorHandler = Rc<dyn Fn(&OptionsError)>;

#[derive(Clone)]
pub struct OptionsConfig {
    /// Log a warning when an injection key has no provider.
    pub warn_missing_injection: bool,
    /// Substitute an inject entry's `default` when no ancestor provides it.
    ///
    /// When false, defaults are accepted but never applied and an unresolved
    /// key always yields `Null`.
    pub apply_inject_defaults: bool,
    /// Flush timing for watchers that do not specify one.
    pub default_flush: FlushMode,
    /// Handler for deferred failures. Without one they are logged.
    pub error_handler: Option<ErrorHandler>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            warn_missing_injection: true,
            apply_inject_defaults: true,
            default_flush: FlushMode::Pre,
            error_handler: None,
        }
    }
}

thread_local! {
    static CONFIG: RefCell<OptionsConfig> = RefCell::new(OptionsConfig::default());
}

/// Get a copy of the current configuration.
pub fn config() -> OptionsConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Replace the current configuration.
pub fn set_config(config: OptionsConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Restore defaults (for testing).
pub fn reset_config() {
    set_config(OptionsConfig::default());
}

/// Route a deferred failure to the configured handler, or log it.
pub fn report_error(error: &OptionsError) {
    let handler = CONFIG.with(|c| c.borrow().error_handler.clone());
    match handler {
        Some(handler) => handler(error),
        None => tracing::error!(%error, "unhandled component error"),
    }
}
