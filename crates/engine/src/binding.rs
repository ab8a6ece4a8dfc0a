//! Element bindings: the payload the embeddable widget attaches to a UI
//! element so interactions on it are routed to a single step.

use serde::{Deserialize, Serialize};

use crate::models::{Condition, StepId, UiEvent, WorkflowId};
use crate::{EngineError, WorkflowEngine};

/// `{ "type": "step", "payload": { .. } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ElementBinding {
    Step(StepBinding),
}

impl ElementBinding {
    pub fn dispatch(&self, engine: &mut WorkflowEngine, event: &UiEvent) -> Result<(), EngineError> {
        match self {
            Self::Step(binding) => binding.dispatch(engine, event),
        }
    }
}

/// Ties an element to one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBinding {
    pub id: StepId,
    pub workflow: WorkflowId,
    /// Extra gate the element imposes on top of the step's own conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

impl StepBinding {
    /// Forward `event` on the bound element to the engine, scoped to the
    /// bound step.
    pub fn dispatch(&self, engine: &mut WorkflowEngine, event: &UiEvent) -> Result<(), EngineError> {
        engine.trigger_ui_event(event, Some(self.id.as_str()), self.conditions.as_deref())
    }
}
