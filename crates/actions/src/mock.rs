//! `MockExecutor` — a test double for `ActionExecutor`.
//!
//! The engine takes ownership of its executor, so the call log lives behind
//! an `Arc`: keep a clone of the mock to inspect what was executed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Action, ActionError, ActionExecutor, StepContext};

/// One recorded `execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStep {
    pub ctx: StepContext,
    pub actions: Vec<Action>,
}

/// A mock executor that records every call it receives and optionally
/// fails for selected steps.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    /// Step id → error message returned instead of succeeding.
    failures: HashMap<String, String>,
    /// All calls seen by this executor (in call order).
    pub calls: Arc<Mutex<Vec<ExecutedStep>>>,
}

impl MockExecutor {
    /// Create a mock that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the mock fail with `ActionError::Rejected(msg)` whenever
    /// `step_id` is executed. The failed call is still recorded.
    pub fn failing_on(mut self, step_id: impl Into<String>, msg: impl Into<String>) -> Self {
        self.failures.insert(step_id.into(), msg.into());
        self
    }

    /// Number of times this executor has been called.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Step ids in the order they were executed.
    pub fn executed_step_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.ctx.step_id.clone())
            .collect()
    }

    /// How many times `step_id` was executed.
    pub fn times_executed(&self, step_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.ctx.step_id == step_id)
            .count()
    }
}

impl ActionExecutor for MockExecutor {
    fn execute(&mut self, ctx: &StepContext, actions: &[Action]) -> Result<(), ActionError> {
        self.calls.lock().unwrap().push(ExecutedStep {
            ctx: ctx.clone(),
            actions: actions.to_vec(),
        });

        match self.failures.get(&ctx.step_id) {
            Some(msg) => Err(ActionError::Rejected(msg.clone())),
            None => Ok(()),
        }
    }
}
