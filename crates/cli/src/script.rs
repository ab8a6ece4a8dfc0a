//! Session scripts for `stepflow replay`.
//!
//! A script is a JSON array of events, applied in order, standing in for
//! the transport and agent layers that would call the engine in a live
//! session.

use engine::{Condition, ElementBinding, EngineError, UiEvent, WorkflowEngine};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// A tracked interaction, optionally scoped to one step.
    #[serde(rename_all = "camelCase")]
    UiEvent {
        event: UiEvent,
        #[serde(default)]
        step_id: Option<String>,
        #[serde(default)]
        conditions: Option<Vec<Condition>>,
    },
    /// An interaction on an element carrying a widget binding.
    Element {
        event: UiEvent,
        binding: ElementBinding,
    },
    /// The agent layer's verdict on a step.
    #[serde(rename_all = "camelCase")]
    AgentJudgment { step_id: String, accepted: bool },
    /// The workflow-completion collaborator decided a workflow is done.
    #[serde(rename_all = "camelCase")]
    WorkflowCompleted { workflow_id: String },
}

impl SessionEvent {
    pub fn apply(&self, engine: &mut WorkflowEngine) -> Result<(), EngineError> {
        match self {
            Self::UiEvent {
                event,
                step_id,
                conditions,
            } => engine.trigger_ui_event(event, step_id.as_deref(), conditions.as_deref()),
            Self::Element { event, binding } => binding.dispatch(engine, event),
            Self::AgentJudgment { step_id, accepted } => {
                engine.handle_agent_judgment(step_id, *accepted)
            }
            Self::WorkflowCompleted { workflow_id } => engine.mark_workflow_completed(workflow_id),
        }
    }
}

pub fn parse_script(json: &str) -> Result<Vec<SessionEvent>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Apply every event in order, stopping at the first failure.
pub fn replay(engine: &mut WorkflowEngine, events: &[SessionEvent]) -> Result<(), EngineError> {
    for (n, event) in events.iter().enumerate() {
        info!(n, ?event, "applying session event");
        event.apply(engine)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actions::mock::MockExecutor;
    use engine::parse_workflows;

    const WORKFLOWS: &str = r#"[{
        "id": "workflow-1",
        "status": "active",
        "steps": [
            { "id": "step-1", "conditions": [{ "id": "c1", "type": "uiEvent", "data": "onPageLoad" }] },
            { "id": "step-2", "conditions": [{ "id": "c2", "type": "judgedByAgent", "data": { "stepId": "step-1" } }] },
            { "id": "step-3", "conditions": [
                { "id": "c3", "type": "uiEvent", "data": "onClicked" },
                { "id": "c4", "type": "step", "data": "step-2" }
            ]},
            { "id": "step-4", "conditions": [{ "id": "c5", "type": "workflow", "data": "workflow-1" }] }
        ]
    }]"#;

    #[test]
    fn parses_every_event_type() {
        let events = parse_script(
            r#"[
                { "type": "uiEvent", "event": "onPageLoad" },
                { "type": "uiEvent", "event": "onClicked", "stepId": "step-3",
                  "conditions": [{ "id": "x", "type": "step", "data": "step-2" }] },
                { "type": "element", "event": "onHovered",
                  "binding": { "type": "step", "payload": { "id": "step-3", "workflow": "workflow-1" } } },
                { "type": "agentJudgment", "stepId": "step-1", "accepted": true },
                { "type": "workflowCompleted", "workflowId": "workflow-1" }
            ]"#,
        )
        .expect("valid script");

        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], SessionEvent::UiEvent { event: UiEvent::OnPageLoad, step_id: None, .. }));
        assert!(matches!(&events[1], SessionEvent::UiEvent { step_id: Some(id), conditions: Some(c), .. }
            if id == "step-3" && c.len() == 1));
        assert!(matches!(&events[2], SessionEvent::Element { event: UiEvent::OnHovered, .. }));
        assert!(matches!(&events[3], SessionEvent::AgentJudgment { accepted: true, .. }));
        assert!(matches!(&events[4], SessionEvent::WorkflowCompleted { workflow_id } if workflow_id == "workflow-1"));
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!(parse_script(r#"[{ "type": "keyPressed", "key": "x" }]"#).is_err());
    }

    #[test]
    fn replay_drives_the_engine() {
        let workflows = parse_workflows(WORKFLOWS).unwrap();
        let mock = MockExecutor::new();
        let mut engine = WorkflowEngine::new(&workflows, mock.clone());
        engine.start().unwrap();

        let events = parse_script(
            r#"[
                { "type": "uiEvent", "event": "onPageLoad" },
                { "type": "agentJudgment", "stepId": "step-1", "accepted": true },
                { "type": "element", "event": "onClicked",
                  "binding": { "type": "step", "payload": { "id": "step-3", "workflow": "workflow-1" } } },
                { "type": "workflowCompleted", "workflowId": "workflow-1" }
            ]"#,
        )
        .unwrap();

        replay(&mut engine, &events).expect("replay succeeds");
        assert_eq!(
            mock.executed_step_ids(),
            vec!["step-1", "step-2", "step-3", "step-4"]
        );
    }

    #[test]
    fn replay_stops_at_first_failure() {
        let workflows = parse_workflows(WORKFLOWS).unwrap();
        let mock = MockExecutor::new().failing_on("step-1", "closed");
        let mut engine = WorkflowEngine::new(&workflows, mock.clone());
        engine.start().unwrap();

        let events = parse_script(
            r#"[
                { "type": "uiEvent", "event": "onPageLoad" },
                { "type": "workflowCompleted", "workflowId": "workflow-1" }
            ]"#,
        )
        .unwrap();

        assert!(replay(&mut engine, &events).is_err());
        assert_eq!(mock.executed_step_ids(), vec!["step-1"]);
    }
}
