//! Condition evaluation — a pure walk over a condition tree.

use crate::models::{Condition, ConditionKind, UiEvent};
use crate::state::EngineState;

/// What a condition is evaluated against.
///
/// `pulse` is the UI event currently being dispatched, if any. It is the
/// only way a UI event leaf can hold: UI events are momentary and never
/// recorded in [`EngineState`].
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub state: &'a EngineState,
    pub pulse: Option<&'a UiEvent>,
}

impl<'a> Scope<'a> {
    pub fn new(state: &'a EngineState) -> Self {
        Self { state, pulse: None }
    }

    pub fn with_pulse(state: &'a EngineState, event: &'a UiEvent) -> Self {
        Self {
            state,
            pulse: Some(event),
        }
    }
}

/// Does `condition` currently hold?
pub fn evaluate(condition: &Condition, scope: &Scope<'_>) -> bool {
    match &condition.kind {
        ConditionKind::Always => true,
        ConditionKind::StepCompleted(id) => scope.state.is_step_completed(id),
        ConditionKind::WorkflowCompleted(id) => scope.state.is_workflow_completed(id),
        ConditionKind::JudgedByAgent(args) => scope.state.judgment(&args.step_id) == Some(true),
        ConditionKind::UiEvent(event) => scope.pulse == Some(event),
        ConditionKind::And(children) => children.iter().all(|c| evaluate(c, scope)),
        ConditionKind::Or(children) => children.iter().any(|c| evaluate(c, scope)),
        ConditionKind::Unknown { .. } => false,
    }
}

/// A step's gate: every top-level entry must hold.
pub fn evaluate_all(conditions: &[Condition], scope: &Scope<'_>) -> bool {
    conditions.iter().all(|c| evaluate(c, scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn state_with(steps: &[&str], workflows: &[&str]) -> EngineState {
        let mut state = EngineState::new();
        for s in steps {
            state.complete_step(s);
        }
        for w in workflows {
            state.complete_workflow(w);
        }
        state
    }

    #[test]
    fn leaves_follow_state() {
        let state = state_with(&["step-a"], &["workflow-a"]);
        let scope = Scope::new(&state);

        assert!(evaluate(&Condition::always(), &scope));
        assert!(evaluate(&Condition::step_completed("step-a"), &scope));
        assert!(!evaluate(&Condition::step_completed("step-b"), &scope));
        assert!(evaluate(&Condition::workflow_completed("workflow-a"), &scope));
        assert!(!evaluate(&Condition::workflow_completed("workflow-missing"), &scope));
    }

    #[test]
    fn judgment_must_be_an_explicit_yes() {
        let mut state = EngineState::new();
        let cond = Condition::judged_by_agent("step-x");

        assert!(!evaluate(&cond, &Scope::new(&state)));
        state.record_judgment("step-x", false);
        assert!(!evaluate(&cond, &Scope::new(&state)));
        state.record_judgment("step-x", true);
        assert!(evaluate(&cond, &Scope::new(&state)));
    }

    #[test]
    fn ui_event_holds_only_for_matching_pulse() {
        let state = EngineState::new();
        let cond = Condition::ui_event(UiEvent::OnClicked);

        assert!(!evaluate(&cond, &Scope::new(&state)));
        assert!(!evaluate(&cond, &Scope::with_pulse(&state, &UiEvent::OnHovered)));
        assert!(evaluate(&cond, &Scope::with_pulse(&state, &UiEvent::OnClicked)));
    }

    #[test]
    fn branches_combine_children() {
        let state = state_with(&["step-a"], &[]);
        let scope = Scope::new(&state);
        let a = Condition::step_completed("step-a");
        let b = Condition::step_completed("step-b");

        assert!(!evaluate(&Condition::and(vec![a.clone(), b.clone()]), &scope));
        assert!(evaluate(&Condition::or(vec![a.clone(), b.clone()]), &scope));
        assert!(evaluate(
            &Condition::and(vec![a, Condition::or(vec![b, Condition::always()])]),
            &scope
        ));
    }

    #[test]
    fn empty_branches() {
        let state = EngineState::new();
        let scope = Scope::new(&state);

        assert!(evaluate(&Condition::and(vec![]), &scope));
        assert!(!evaluate(&Condition::or(vec![]), &scope));
        assert!(evaluate_all(&[], &scope));
    }

    #[test]
    fn unknown_kind_fails_closed() {
        let state = EngineState::new();
        let unknown = Condition::new(ConditionKind::Unknown {
            kind: "geoFence".into(),
            data: Value::Null,
        });

        assert!(!evaluate(&unknown, &Scope::new(&state)));
        assert!(evaluate(
            &Condition::or(vec![unknown, Condition::always()]),
            &Scope::new(&state)
        ));
    }
}
