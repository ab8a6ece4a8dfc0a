//! Core domain models for the condition engine.
//!
//! These types mirror the JSON the authoring layer stores for a workflow
//! snapshot. The engine treats them as read-only input.

use std::fmt;

use actions::Action;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::EngineError;

pub type StepId = String;
pub type WorkflowId = String;

// ---------------------------------------------------------------------------
// UiEvent
// ---------------------------------------------------------------------------

/// A tracked user interaction. Unknown kinds are kept verbatim and only
/// match an identical kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UiEvent {
    OnPageLoad,
    OnVisited,
    OnClicked,
    OnHovered,
    Custom(String),
}

impl UiEvent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnPageLoad => "onPageLoad",
            Self::OnVisited => "onVisited",
            Self::OnClicked => "onClicked",
            Self::OnHovered => "onHovered",
            Self::Custom(kind) => kind,
        }
    }
}

impl From<&str> for UiEvent {
    fn from(s: &str) -> Self {
        match s {
            "onPageLoad" => Self::OnPageLoad,
            "onVisited" => Self::OnVisited,
            "onClicked" => Self::OnClicked,
            "onHovered" => Self::OnHovered,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl From<String> for UiEvent {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<UiEvent> for String {
    fn from(event: UiEvent) -> Self {
        event.as_str().to_owned()
    }
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Arguments of a judged-by-agent leaf. Only `step_id` matters to the
/// engine; the rest tells the agent layer who to ask and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentJudgment {
    /// The step being judged (the dependency key, not the judging agent).
    pub step_id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// What a condition node tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    Always,
    StepCompleted(StepId),
    WorkflowCompleted(WorkflowId),
    UiEvent(UiEvent),
    JudgedByAgent(AgentJudgment),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    /// A node whose type (or data) this engine does not understand.
    /// Never satisfied.
    Unknown { kind: String, data: Value },
}

/// A node of a step's condition tree.
///
/// The `id` exists for the authoring UI and is never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub struct Condition {
    pub id: String,
    pub kind: ConditionKind,
}

impl Condition {
    /// Build a node with a freshly generated id.
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
        }
    }

    pub fn always() -> Self {
        Self::new(ConditionKind::Always)
    }

    pub fn step_completed(step_id: impl Into<StepId>) -> Self {
        Self::new(ConditionKind::StepCompleted(step_id.into()))
    }

    pub fn workflow_completed(workflow_id: impl Into<WorkflowId>) -> Self {
        Self::new(ConditionKind::WorkflowCompleted(workflow_id.into()))
    }

    pub fn ui_event(event: impl Into<UiEvent>) -> Self {
        Self::new(ConditionKind::UiEvent(event.into()))
    }

    pub fn judged_by_agent(step_id: impl Into<StepId>) -> Self {
        Self::new(ConditionKind::JudgedByAgent(AgentJudgment {
            step_id: step_id.into(),
            agent_id: None,
            prompt: None,
        }))
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Self::new(ConditionKind::And(children))
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Self::new(ConditionKind::Or(children))
    }
}

/// Stored shape: `{ "id", "type", "data" }`.
#[derive(Serialize, Deserialize)]
struct RawCondition {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        let RawCondition { id, kind, data } = raw;

        let parsed = match kind.as_str() {
            "always" => Some(ConditionKind::Always),
            "step" => data
                .as_str()
                .map(|s| ConditionKind::StepCompleted(s.to_owned())),
            "workflow" => data
                .as_str()
                .map(|s| ConditionKind::WorkflowCompleted(s.to_owned())),
            "uiEvent" => data.as_str().map(|s| ConditionKind::UiEvent(s.into())),
            "judgedByAgent" => serde_json::from_value(data.clone())
                .ok()
                .map(ConditionKind::JudgedByAgent),
            "and" => serde_json::from_value(data.clone()).ok().map(ConditionKind::And),
            "or" => serde_json::from_value(data.clone()).ok().map(ConditionKind::Or),
            _ => None,
        };

        Self {
            id,
            kind: parsed.unwrap_or(ConditionKind::Unknown { kind, data }),
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(cond: Condition) -> Self {
        let (kind, data) = match cond.kind {
            ConditionKind::Always => ("always".to_owned(), Value::Bool(true)),
            ConditionKind::StepCompleted(id) => ("step".to_owned(), Value::String(id)),
            ConditionKind::WorkflowCompleted(id) => ("workflow".to_owned(), Value::String(id)),
            ConditionKind::UiEvent(event) => ("uiEvent".to_owned(), Value::String(event.into())),
            ConditionKind::JudgedByAgent(args) => (
                "judgedByAgent".to_owned(),
                serde_json::to_value(args).unwrap_or(Value::Null),
            ),
            ConditionKind::And(children) => (
                "and".to_owned(),
                serde_json::to_value(children).unwrap_or(Value::Null),
            ),
            ConditionKind::Or(children) => (
                "or".to_owned(),
                serde_json::to_value(children).unwrap_or(Value::Null),
            ),
            ConditionKind::Unknown { kind, data } => (kind, data),
        };
        Self {
            id: cond.id,
            kind,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// The smallest schedulable unit: a condition list and the actions to run
/// once it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    /// Owning workflow. Filled in from the enclosing workflow when absent.
    #[serde(default)]
    pub workflow_id: WorkflowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level entries, implicitly AND-ed together.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, rename = "action", alias = "actions")]
    pub actions: Vec<Action>,
}

impl Step {
    /// Convenience constructor for testing.
    pub fn new(
        id: impl Into<StepId>,
        workflow_id: impl Into<WorkflowId>,
        conditions: Vec<Condition>,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            name: None,
            description: None,
            conditions,
            actions,
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// A status-bearing collection of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Informational only. Unparseable values decode as `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 and offset-less `timestamp` text (taken as UTC);
/// anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::String(text)) = raw else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .map(|naive| naive.and_utc()))
}

impl Workflow {
    /// Convenience constructor for testing.
    pub fn new(id: impl Into<WorkflowId>, status: Status, steps: Vec<Step>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            status,
            steps,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Decode a workflow snapshot (a JSON array of workflows).
pub fn parse_workflows(json: &str) -> Result<Vec<Workflow>, EngineError> {
    Ok(serde_json::from_str(json)?)
}
