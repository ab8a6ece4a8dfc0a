//! Action-level error type.

use thiserror::Error;

/// Errors returned by an [`ActionExecutor`](crate::ActionExecutor).
///
/// The engine never retries. Any error aborts the cascade that fired the
/// step and is handed back to whoever called the triggering entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The host refused to run the actions (e.g. the widget was closed).
    #[error("actions rejected: {0}")]
    Rejected(String),

    /// The host has no way to run this kind of action.
    #[error("unsupported action: {0}")]
    Unsupported(String),
}
