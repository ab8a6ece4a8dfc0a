//! The `ActionExecutor` trait — the engine's only side-effect channel.

use crate::{Action, ActionError};

/// Identifies the step whose actions are being executed.
///
/// Defined here (in the actions crate) so both the engine and executor
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// ID of the fired step.
    pub step_id: String,
    /// ID of the workflow that owns the step.
    pub workflow_id: String,
}

/// Carries out the actions of a fired step.
///
/// Called synchronously; the engine does not wait for any asynchronous
/// work the executor starts on its own. Failures the host wants retried
/// must be handled inside the executor.
pub trait ActionExecutor {
    fn execute(&mut self, ctx: &StepContext, actions: &[Action]) -> Result<(), ActionError>;
}

impl<F> ActionExecutor for F
where
    F: FnMut(&StepContext, &[Action]) -> Result<(), ActionError>,
{
    fn execute(&mut self, ctx: &StepContext, actions: &[Action]) -> Result<(), ActionError> {
        self(ctx, actions)
    }
}
