//! Console rendering of fired actions, used by the `stepflow` binary.

use serde::Serialize;
use tracing::debug;

use crate::{Action, ActionError, ActionExecutor, StepContext};

/// How the renderer writes to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per rendered action.
    #[default]
    Text,
    /// One JSON object per fired step.
    Json,
}

/// Flatten actions into display lines, depth-first.
///
/// Text actions render verbatim; an agent action renders its prompt and
/// then whatever its nested action renders.
pub fn render_lines(actions: &[Action]) -> Vec<String> {
    let mut lines = Vec::new();
    for action in actions {
        push_lines(action, &mut lines);
    }
    lines
}

fn push_lines(action: &Action, lines: &mut Vec<String>) {
    match action {
        Action::Text { output, .. } => lines.push(output.text.clone()),
        Action::Agent { args, output, .. } => {
            let agent = args.agent_id.as_deref().unwrap_or("default");
            lines.push(format!("[agent {agent}] {}", args.prompt));
            push_lines(output, lines);
        }
    }
}

#[derive(Serialize)]
struct FiredLine<'a> {
    step: &'a str,
    workflow: &'a str,
    lines: Vec<String>,
}

/// Prints fired actions to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleRenderer {
    format: OutputFormat,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Produce the output for one fired step without printing it.
    pub fn format_step(&self, ctx: &StepContext, actions: &[Action]) -> Result<String, ActionError> {
        let lines = render_lines(actions);
        match self.format {
            OutputFormat::Text => Ok(lines
                .iter()
                .map(|l| format!("{}: {l}", ctx.step_id))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Json => serde_json::to_string(&FiredLine {
                step: &ctx.step_id,
                workflow: &ctx.workflow_id,
                lines,
            })
            .map_err(|e| ActionError::Rejected(e.to_string())),
        }
    }
}

impl ActionExecutor for ConsoleRenderer {
    fn execute(&mut self, ctx: &StepContext, actions: &[Action]) -> Result<(), ActionError> {
        debug!(step_id = %ctx.step_id, count = actions.len(), "rendering actions");
        let out = self.format_step(ctx, actions)?;
        if !out.is_empty() {
            println!("{out}");
        }
        Ok(())
    }
}
