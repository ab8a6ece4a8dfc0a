//! What a fired step asks the host to do.

use serde::{Deserialize, Serialize};

/// A single action attached to a step.
///
/// Agent actions are recursive: the agent is prompted first, then the
/// nested `return` action is carried out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Show a piece of text in the chat surface.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(rename = "return")]
        output: TextReturn,
    },
    /// Prompt an agent, then perform the action it returns.
    Agent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        args: AgentArgs,
        #[serde(rename = "return")]
        output: Box<Action>,
    },
}

/// Payload of a text action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReturn {
    pub text: String,
}

/// Who to ask, and what.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Example: `"gpt-4o"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Empty when the authoring layer saved the action without one.
    #[serde(default)]
    pub prompt: String,
}

impl Action {
    /// Convenience constructor for a text action without an id.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            id: None,
            output: TextReturn { text: text.into() },
        }
    }

    /// Convenience constructor for an agent action without an id.
    pub fn agent(prompt: impl Into<String>, then: Action) -> Self {
        Self::Agent {
            id: None,
            args: AgentArgs {
                prompt: prompt.into(),
                ..AgentArgs::default()
            },
            output: Box::new(then),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_nested_agent_action() {
        let raw = json!({
            "id": "a-1",
            "type": "agent",
            "args": { "agentId": "agent-1", "prompt": "Collect feedback." },
            "return": { "type": "text", "return": { "text": "Thanks!" } }
        });

        let action: Action = serde_json::from_value(raw).expect("valid action");
        match action {
            Action::Agent { id, args, output } => {
                assert_eq!(id.as_deref(), Some("a-1"));
                assert_eq!(args.agent_id.as_deref(), Some("agent-1"));
                assert_eq!(args.prompt, "Collect feedback.");
                assert_eq!(*output, Action::text("Thanks!"));
            }
            other => panic!("expected agent action, got {other:?}"),
        }
    }

    #[test]
    fn agent_action_without_prompt_still_decodes() {
        let raw = json!({
            "type": "agent",
            "args": { "agentId": "agent-1" },
            "return": { "type": "text", "return": { "text": "Done." } }
        });

        let action: Action = serde_json::from_value(raw).expect("prompt is optional");
        assert!(matches!(action, Action::Agent { ref args, .. } if args.prompt.is_empty()));
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let raw = json!({ "type": "video", "return": { "url": "x" } });
        assert!(serde_json::from_value::<Action>(raw).is_err());
    }
}
