//! The facts conditions are evaluated against.

use std::collections::{HashMap, HashSet};

/// Completed steps, completed workflows and agent verdicts for one session.
///
/// The two completion sets only ever grow. A judgment may be overwritten
/// by a later verdict for the same step.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    completed_steps: HashSet<String>,
    completed_workflows: HashSet<String>,
    judgments: HashMap<String, bool>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.completed_steps.contains(step_id)
    }

    pub fn is_workflow_completed(&self, workflow_id: &str) -> bool {
        self.completed_workflows.contains(workflow_id)
    }

    /// `None` until the agent layer has reported on `step_id`.
    pub fn judgment(&self, step_id: &str) -> Option<bool> {
        self.judgments.get(step_id).copied()
    }

    pub fn completed_step_count(&self) -> usize {
        self.completed_steps.len()
    }

    /// Returns `true` if the step was not already completed.
    pub(crate) fn complete_step(&mut self, step_id: &str) -> bool {
        self.completed_steps.insert(step_id.to_owned())
    }

    /// Returns `true` if the workflow was not already completed.
    pub(crate) fn complete_workflow(&mut self, workflow_id: &str) -> bool {
        self.completed_workflows.insert(workflow_id.to_owned())
    }

    pub(crate) fn record_judgment(&mut self, step_id: &str, accepted: bool) {
        self.judgments.insert(step_id.to_owned(), accepted);
    }
}
