//! Error types.
//!
//! Two layers:
//! - [`HandlerError`] is what user-authored functions (data factories, getters,
//!   setters, watch handlers, hooks) return when they fail.
//! - [`OptionsError`] is what option application returns: a propagated
//!   `HandlerError` tagged with where it came from, or a registry miss.
//!
//! Malformed declarations are never errors. They are skipped.

use std::fmt;

use thiserror::Error;

use crate::lifecycle::LifecyclePhase;
use crate::types::Key;

pub type Result<T> = std::result::Result<T, OptionsError>;

/// Result type for user-authored functions.
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

// =============================================================================
// Handler Error
// =============================================================================

/// Failure raised by a user-authored function.
///
/// Cloneable and comparable so it can be memoized inside a computed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn released(index: usize) -> Self {
        Self::new(format!("component instance {index} has been released"))
    }

    pub(crate) fn not_callable(key: &Key) -> Self {
        Self::new(format!("`{key}` is not a method"))
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

// =============================================================================
// Origin
// =============================================================================

/// Which declaration a propagated failure came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    DataFactory,
    Watcher(Key),
    ProvideFactory,
    Hook(LifecyclePhase),
    /// A deferred watcher callback run by the scheduler.
    Scheduler,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataFactory => f.write_str("data factory"),
            Self::Watcher(key) => write!(f, "watcher on `{key}`"),
            Self::ProvideFactory => f.write_str("provide factory"),
            Self::Hook(phase) => write!(f, "`{phase}` hook"),
            Self::Scheduler => f.write_str("scheduled watcher callback"),
        }
    }
}

// =============================================================================
// Options Error
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("{origin} failed: {source}")]
    Handler {
        origin: Origin,
        #[source]
        source: HandlerError,
    },

    #[error("component instance {index} is not allocated")]
    UnknownInstance { index: usize },
}

impl OptionsError {
    #[must_use]
    pub fn handler(origin: Origin, source: HandlerError) -> Self {
        Self::Handler { origin, source }
    }

    /// The user failure behind this error, if any.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            Self::Handler { source, .. } => Some(source),
            Self::UnknownInstance { .. } => None,
        }
    }

    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::Handler { origin, .. } => Some(origin),
            Self::UnknownInstance { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_display() {
        let err = OptionsError::handler(Origin::Watcher(Key::from("count")), "boom".into());
        assert_eq!(err.to_string(), "watcher on `count` failed: boom");
        assert_eq!(err.handler_error().map(HandlerError::message), Some("boom"));
    }

    #[test]
    fn test_hook_origin_display() {
        let err = OptionsError::handler(Origin::Hook(LifecyclePhase::Created), "nope".into());
        assert_eq!(err.to_string(), "`created` hook failed: nope");
    }

    #[test]
    fn test_unknown_instance() {
        let err = OptionsError::UnknownInstance { index: 7 };
        assert_eq!(err.to_string(), "component instance 7 is not allocated");
        assert!(err.origin().is_none());
    }
}
