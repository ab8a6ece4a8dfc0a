//! `engine` crate — workflow models, the dependency index, condition
//! evaluation and the trigger-driven engine that fires steps.

pub mod models;
pub mod error;
pub mod state;
pub mod evaluator;
pub mod graph;
pub mod executor;
pub mod binding;

pub use models::{parse_workflows, Condition, ConditionKind, Status, Step, UiEvent, Workflow};
pub use error::EngineError;
pub use graph::{build_index, DependencyIndex, TriggerKey};
pub use executor::{StepState, WorkflowEngine};
pub use binding::{ElementBinding, StepBinding};
