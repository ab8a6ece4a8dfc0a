//! Engine-level error types.

use actions::ActionError;
use thiserror::Error;

/// Errors produced by the condition engine.
///
/// Condition problems are not errors: unknown node kinds and dangling
/// ids simply never hold.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The executor failed while running a fired step's actions. The
    /// cascade that fired the step stops here.
    #[error("actions of step '{step_id}' failed: {source}")]
    Action {
        step_id: String,
        #[source]
        source: ActionError,
    },

    /// A workflow snapshot could not be decoded.
    #[error("invalid workflow snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
