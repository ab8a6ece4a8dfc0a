//! Dependency index — built once from the workflow snapshot.
//!
//! Rules:
//! 1. Inactive workflows are skipped; their steps never enter the index.
//! 2. Every leaf anywhere in a step's condition tree registers the *whole*
//!    step under that leaf's trigger key.
//! 3. `Always` leaves put the step in the always bucket instead.
//!
//! Whichever trigger arrives first re-evaluates the step's entire
//! condition list, not just the branch that mentioned it.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::models::{Condition, ConditionKind, Step, StepId, UiEvent, Workflow, WorkflowId};

/// Position of a step inside the index.
pub type StepRef = usize;

/// What has to happen for a step to be re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerKey {
    UiEvent(String),
    StepCompleted(StepId),
    WorkflowCompleted(WorkflowId),
    /// Keyed by the judged step, not by the judging agent.
    JudgedByAgent(StepId),
}

impl TriggerKey {
    pub fn ui_event(event: &UiEvent) -> Self {
        Self::UiEvent(event.as_str().to_owned())
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UiEvent(kind) => write!(f, "uiEvent:{kind}"),
            Self::StepCompleted(id) => write!(f, "step:{id}"),
            Self::WorkflowCompleted(id) => write!(f, "workflow:{id}"),
            Self::JudgedByAgent(id) => write!(f, "judgedByAgent:{id}"),
        }
    }
}

/// Reverse map from trigger key to candidate steps, plus the always bucket.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    steps: Vec<Step>,
    buckets: HashMap<TriggerKey, Vec<StepRef>>,
    always: Vec<StepRef>,
    inactive_workflows: usize,
}

impl DependencyIndex {
    /// The indexed step at `step_ref`.
    ///
    /// # Panics
    /// If `step_ref` did not come from this index.
    pub fn step(&self, step_ref: StepRef) -> &Step {
        &self.steps[step_ref]
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Candidates for `key`, in authoring order. Empty for unknown keys.
    pub fn candidates(&self, key: &TriggerKey) -> &[StepRef] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn always(&self) -> &[StepRef] {
        &self.always
    }

    /// Every bucket, sorted by key.
    pub fn buckets(&self) -> Vec<(&TriggerKey, &[StepRef])> {
        let mut out: Vec<_> = self
            .buckets
            .iter()
            .map(|(k, v)| (k, v.as_slice()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary {
            inactive_workflows: self.inactive_workflows,
            indexed_steps: self.steps.len(),
            always: self.always.len(),
            ..IndexSummary::default()
        };
        let mut workflows: Vec<&str> = self.steps.iter().map(|s| s.workflow_id.as_str()).collect();
        workflows.sort_unstable();
        workflows.dedup();
        summary.active_workflows = workflows.len();

        for key in self.buckets.keys() {
            match key {
                TriggerKey::UiEvent(_) => summary.ui_event_keys += 1,
                TriggerKey::StepCompleted(_) => summary.step_keys += 1,
                TriggerKey::WorkflowCompleted(_) => summary.workflow_keys += 1,
                TriggerKey::JudgedByAgent(_) => summary.judgment_keys += 1,
            }
        }
        summary
    }

    fn register(&mut self, key: TriggerKey, step_ref: StepRef) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.contains(&step_ref) {
            bucket.push(step_ref);
        }
    }

    fn register_always(&mut self, step_ref: StepRef) {
        if !self.always.contains(&step_ref) {
            self.always.push(step_ref);
        }
    }

    /// Walk a condition tree, registering `step_ref` under every leaf.
    fn collect(&mut self, condition: &Condition, step_ref: StepRef) {
        match &condition.kind {
            ConditionKind::Always => self.register_always(step_ref),
            ConditionKind::UiEvent(event) => self.register(TriggerKey::ui_event(event), step_ref),
            ConditionKind::StepCompleted(id) => {
                self.register(TriggerKey::StepCompleted(id.clone()), step_ref)
            }
            ConditionKind::WorkflowCompleted(id) => {
                self.register(TriggerKey::WorkflowCompleted(id.clone()), step_ref)
            }
            ConditionKind::JudgedByAgent(args) => {
                self.register(TriggerKey::JudgedByAgent(args.step_id.clone()), step_ref)
            }
            ConditionKind::And(children) | ConditionKind::Or(children) => {
                for child in children {
                    self.collect(child, step_ref);
                }
            }
            ConditionKind::Unknown { kind, .. } => {
                debug!(step_ref, kind = %kind, "unknown condition kind, no trigger registered");
            }
        }
    }
}

/// Counts reported by `stepflow inspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub active_workflows: usize,
    pub inactive_workflows: usize,
    pub indexed_steps: usize,
    pub always: usize,
    pub ui_event_keys: usize,
    pub step_keys: usize,
    pub workflow_keys: usize,
    pub judgment_keys: usize,
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} active / {} inactive workflows, {} steps indexed, {} always, \
             trigger keys: {} ui event, {} step, {} workflow, {} judgment",
            self.active_workflows,
            self.inactive_workflows,
            self.indexed_steps,
            self.always,
            self.ui_event_keys,
            self.step_keys,
            self.workflow_keys,
            self.judgment_keys,
        )
    }
}

/// Build the dependency index for a workflow snapshot.
pub fn build_index(workflows: &[Workflow]) -> DependencyIndex {
    let mut index = DependencyIndex::default();

    for workflow in workflows {
        if !workflow.is_active() {
            debug!(workflow_id = %workflow.id, "skipping inactive workflow");
            index.inactive_workflows += 1;
            continue;
        }

        for step in &workflow.steps {
            let mut step = step.clone();
            if step.workflow_id.is_empty() {
                step.workflow_id = workflow.id.clone();
            }

            let step_ref = index.steps.len();
            for condition in &step.conditions {
                index.collect(condition, step_ref);
            }
            index.steps.push(step);
        }
    }

    info!("dependency index built: {}", index.summary());
    index
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn ids<'a>(index: &'a DependencyIndex, refs: &[StepRef]) -> Vec<&'a str> {
        refs.iter().map(|&r| index.step(r).id.as_str()).collect()
    }

    #[test]
    fn inactive_workflows_are_excluded() {
        let index = build_index(&[
            Workflow::new(
                "workflow-off",
                Status::Inactive,
                vec![Step::new("step-off", "workflow-off", vec![Condition::always()], vec![])],
            ),
            Workflow::new(
                "workflow-on",
                Status::Active,
                vec![Step::new("step-on", "workflow-on", vec![Condition::always()], vec![])],
            ),
        ]);

        assert_eq!(ids(&index, index.always()), vec!["step-on"]);
        assert_eq!(index.steps().len(), 1);
        assert_eq!(index.summary().inactive_workflows, 1);
    }

    #[test]
    fn nested_leaves_register_the_whole_step() {
        // step-c: Or(step-a done, And(onClicked, workflow-x done))
        let step = Step::new(
            "step-c",
            "workflow-1",
            vec![Condition::or(vec![
                Condition::step_completed("step-a"),
                Condition::and(vec![
                    Condition::ui_event(UiEvent::OnClicked),
                    Condition::workflow_completed("workflow-x"),
                ]),
            ])],
            vec![],
        );
        let index = build_index(&[Workflow::new("workflow-1", Status::Active, vec![step])]);

        for key in [
            TriggerKey::StepCompleted("step-a".into()),
            TriggerKey::ui_event(&UiEvent::OnClicked),
            TriggerKey::WorkflowCompleted("workflow-x".into()),
        ] {
            assert_eq!(ids(&index, index.candidates(&key)), vec!["step-c"], "key {key}");
        }
        assert!(index.always().is_empty());
    }

    #[test]
    fn judgment_is_keyed_by_judged_step() {
        let step = Step::new(
            "step-ask",
            "workflow-1",
            vec![Condition::judged_by_agent("step-judged")],
            vec![],
        );
        let index = build_index(&[Workflow::new("workflow-1", Status::Active, vec![step])]);

        assert_eq!(
            ids(&index, index.candidates(&TriggerKey::JudgedByAgent("step-judged".into()))),
            vec!["step-ask"]
        );
        assert!(index
            .candidates(&TriggerKey::JudgedByAgent("step-ask".into()))
            .is_empty());
    }

    #[test]
    fn step_is_registered_once_per_key() {
        let step = Step::new(
            "step-dup",
            "workflow-1",
            vec![
                Condition::step_completed("step-a"),
                Condition::or(vec![Condition::step_completed("step-a"), Condition::always()]),
                Condition::always(),
            ],
            vec![],
        );
        let index = build_index(&[Workflow::new("workflow-1", Status::Active, vec![step])]);

        assert_eq!(index.candidates(&TriggerKey::StepCompleted("step-a".into())).len(), 1);
        assert_eq!(index.always().len(), 1);
    }

    #[test]
    fn missing_workflow_id_is_inherited() {
        let step = Step::new("step-1", "", vec![], vec![]);
        let index = build_index(&[Workflow::new("workflow-7", Status::Active, vec![step])]);

        assert_eq!(index.step(0).workflow_id, "workflow-7");
    }

    #[test]
    fn buckets_are_sorted_and_summarised() {
        let wf = Workflow::new(
            "workflow-1",
            Status::Active,
            vec![
                Step::new("s1", "workflow-1", vec![Condition::always()], vec![]),
                Step::new("s2", "workflow-1", vec![Condition::step_completed("s1")], vec![]),
                Step::new("s3", "workflow-1", vec![Condition::ui_event("onVisited")], vec![]),
            ],
        );
        let index = build_index(&[wf]);

        let keys: Vec<String> = index.buckets().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["uiEvent:onVisited", "step:s1"]);

        let summary = index.summary();
        assert_eq!(summary.active_workflows, 1);
        assert_eq!(summary.indexed_steps, 3);
        assert_eq!(summary.always, 1);
        assert_eq!(summary.ui_event_keys, 1);
        assert_eq!(summary.step_keys, 1);
    }
}
