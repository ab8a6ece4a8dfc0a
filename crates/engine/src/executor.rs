//! Trigger handling and step firing.
//!
//! `WorkflowEngine` owns one session's worth of state:
//! 1. Builds the dependency index from the workflow snapshot.
//! 2. On `start`, fires every step in the always bucket whose gate already
//!    holds.
//! 3. On each trigger, re-evaluates only the candidates indexed under it.
//! 4. Fires a satisfied step by handing its actions to the `ActionExecutor`,
//!    then marks it completed, which cascades into its dependents.
//!
//! Every step is `Pending` until it fires, and `Fired` forever after.
//! Cascades are plain recursion; they terminate because a step fires at
//! most once.

use std::fmt;

use actions::{ActionExecutor, StepContext};
use tracing::{debug, info, instrument, trace, warn};

use crate::evaluator::{evaluate_all, Scope};
use crate::graph::{build_index, DependencyIndex, StepRef, TriggerKey};
use crate::models::{Condition, Step, UiEvent, Workflow};
use crate::state::EngineState;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Step lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Fired,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Decides when each step of a workflow snapshot fires.
///
/// Construct one engine per session. All entry points take `&mut self`
/// and run to completion, cascades included, before returning.
pub struct WorkflowEngine {
    index: DependencyIndex,
    state: EngineState,
    step_states: Vec<StepState>,
    fired: Vec<StepRef>,
    executor: Box<dyn ActionExecutor>,
}

impl fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("steps", &self.index.steps().len())
            .field("fired", &self.fired.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Build the engine for a workflow snapshot. Nothing fires until
    /// [`WorkflowEngine::start`] runs.
    pub fn new(workflows: &[Workflow], executor: impl ActionExecutor + 'static) -> Self {
        let index = build_index(workflows);
        Self {
            step_states: vec![StepState::Pending; index.steps().len()],
            index,
            state: EngineState::new(),
            fired: Vec::new(),
            executor: Box::new(executor),
        }
    }

    /// Fire every always-gated step whose gate already holds, cascading
    /// into their dependents. Call once, right after [`WorkflowEngine::new`].
    ///
    /// # Errors
    /// Returns [`EngineError::Action`] if the executor fails. The engine
    /// stays usable: steps fired before the failure remain fired.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.trigger_always_steps()?;
        info!(
            "engine ready: {} steps indexed, {} fired on start",
            self.index.steps().len(),
            self.fired.len()
        );
        Ok(())
    }

    /// A tracked UI interaction happened.
    ///
    /// `event` holds only for the duration of this call and only for the
    /// steps indexed under it. A step gated on both `event` and some other
    /// fact therefore fires only if that fact is already true now.
    ///
    /// - `step_id` restricts dispatch to that one candidate (no-op if it is
    ///   not indexed under `event`).
    /// - `extra_conditions` must hold before any candidate is looked at. It
    ///   is evaluated without `event`, so UI event leaves in it never hold.
    #[instrument(skip(self, event, extra_conditions), fields(event = %event))]
    pub fn trigger_ui_event(
        &mut self,
        event: &UiEvent,
        step_id: Option<&str>,
        extra_conditions: Option<&[Condition]>,
    ) -> Result<(), EngineError> {
        if let Some(extra) = extra_conditions {
            if !evaluate_all(extra, &Scope::new(&self.state)) {
                debug!("extra conditions do not hold, ignoring event");
                return Ok(());
            }
        }

        let candidates = self.index.candidates(&TriggerKey::ui_event(event));
        let targets: Vec<StepRef> = match step_id {
            Some(id) => candidates
                .iter()
                .copied()
                .find(|&r| self.index.step(r).id == id)
                .into_iter()
                .collect(),
            None => candidates.to_vec(),
        };

        if targets.is_empty() {
            debug!("no candidate steps");
            return Ok(());
        }

        for step_ref in targets {
            self.evaluate_and_fire(step_ref, Some(event))?;
        }
        Ok(())
    }

    /// Record the agent's verdict on `step_id` and re-evaluate the steps
    /// waiting on it. A `false` verdict never fires anything.
    #[instrument(skip(self))]
    pub fn handle_agent_judgment(&mut self, step_id: &str, accepted: bool) -> Result<(), EngineError> {
        self.state.record_judgment(step_id, accepted);
        let candidates = self
            .index
            .candidates(&TriggerKey::JudgedByAgent(step_id.to_owned()))
            .to_vec();
        self.evaluate_and_fire_all(&candidates, None)
    }

    /// Mark a workflow as completed and cascade into the steps waiting on
    /// it. Workflow completion is decided by the caller.
    #[instrument(skip(self))]
    pub fn mark_workflow_completed(&mut self, workflow_id: &str) -> Result<(), EngineError> {
        if !self.state.complete_workflow(workflow_id) {
            debug!("workflow already completed");
        }
        let candidates = self
            .index
            .candidates(&TriggerKey::WorkflowCompleted(workflow_id.to_owned()))
            .to_vec();
        self.evaluate_and_fire_all(&candidates, None)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Has a step with this id fired?
    pub fn is_fired(&self, step_id: &str) -> bool {
        self.fired.iter().any(|&r| self.index.step(r).id == step_id)
    }

    /// Fired steps in firing order.
    pub fn fired_steps(&self) -> impl Iterator<Item = &Step> + '_ {
        self.fired.iter().map(|&r| self.index.step(r))
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    // -----------------------------------------------------------------------
    // Internal: evaluation and firing.
    // -----------------------------------------------------------------------

    fn trigger_always_steps(&mut self) -> Result<(), EngineError> {
        let candidates = self.index.always().to_vec();
        self.evaluate_and_fire_all(&candidates, None)
    }

    fn mark_step_completed(&mut self, step_id: &str) -> Result<(), EngineError> {
        self.state.complete_step(step_id);
        let candidates = self
            .index
            .candidates(&TriggerKey::StepCompleted(step_id.to_owned()))
            .to_vec();
        if !candidates.is_empty() {
            debug!(step_id, dependents = candidates.len(), "cascading");
        }
        self.evaluate_and_fire_all(&candidates, None)
    }

    fn evaluate_and_fire_all(
        &mut self,
        candidates: &[StepRef],
        pulse: Option<&UiEvent>,
    ) -> Result<(), EngineError> {
        for &step_ref in candidates {
            self.evaluate_and_fire(step_ref, pulse)?;
        }
        Ok(())
    }

    fn evaluate_and_fire(&mut self, step_ref: StepRef, pulse: Option<&UiEvent>) -> Result<(), EngineError> {
        if self.step_states[step_ref] == StepState::Fired {
            return Ok(());
        }

        let step = self.index.step(step_ref);
        let scope = Scope {
            state: &self.state,
            pulse,
        };
        if !evaluate_all(&step.conditions, &scope) {
            trace!(step_id = %step.id, "conditions not met");
            return Ok(());
        }

        self.fire(step_ref)
    }

    fn fire(&mut self, step_ref: StepRef) -> Result<(), EngineError> {
        let step = self.index.step(step_ref);
        let ctx = StepContext {
            step_id: step.id.clone(),
            workflow_id: step.workflow_id.clone(),
        };

        info!(step_id = %ctx.step_id, workflow_id = %ctx.workflow_id, "firing step");
        if let Err(source) = self.executor.execute(&ctx, &step.actions) {
            warn!(step_id = %ctx.step_id, "action executor failed: {}", source);
            return Err(EngineError::Action {
                step_id: ctx.step_id,
                source,
            });
        }

        self.step_states[step_ref] = StepState::Fired;
        self.fired.push(step_ref);
        self.mark_step_completed(&ctx.step_id)
    }
}
