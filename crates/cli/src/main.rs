//! `stepflow` CLI entry-point.
//!
//! Available sub-commands:
//! - `inspect` — build and print the dependency index of a workflow snapshot.
//! - `replay`  — run a scripted session against a snapshot and print fired actions.

mod script;

use std::path::{Path, PathBuf};

use actions::{ConsoleRenderer, OutputFormat};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use engine::{build_index, parse_workflows, Workflow, WorkflowEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stepflow",
    about = "Condition-driven workflow step engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the dependency index of a workflow snapshot.
    Inspect {
        /// Path to the workflow snapshot (JSON array of workflows).
        #[arg(env = "STEPFLOW_WORKFLOWS")]
        workflows: PathBuf,
    },
    /// Replay a session script against a workflow snapshot.
    Replay {
        /// Path to the workflow snapshot (JSON array of workflows).
        #[arg(env = "STEPFLOW_WORKFLOWS")]
        workflows: PathBuf,
        /// Path to the session script (JSON array of events).
        #[arg(env = "STEPFLOW_SESSION")]
        session: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Inspect { workflows } => {
            let workflows = load_workflows(&workflows).await?;
            let index = build_index(&workflows);

            println!("{}", index.summary());
            let always: Vec<&str> = index
                .always()
                .iter()
                .map(|&r| index.step(r).id.as_str())
                .collect();
            println!("always: {}", always.join(", "));
            for (key, refs) in index.buckets() {
                let steps: Vec<&str> = refs.iter().map(|&r| index.step(r).id.as_str()).collect();
                println!("{key}: {}", steps.join(", "));
            }
        }
        Command::Replay {
            workflows,
            session,
            format,
        } => {
            let workflows = load_workflows(&workflows).await?;
            let content = tokio::fs::read_to_string(&session)
                .await
                .with_context(|| format!("cannot read session {}", session.display()))?;
            let events = script::parse_script(&content)
                .with_context(|| format!("invalid session script {}", session.display()))?;

            info!("replaying {} events", events.len());
            let mut engine = WorkflowEngine::new(&workflows, ConsoleRenderer::new(format.into()));
            engine.start().context("engine failed to start")?;
            script::replay(&mut engine, &events).context("session replay failed")?;

            let fired: Vec<&str> = engine.fired_steps().map(|s| s.id.as_str()).collect();
            println!("fired: {}", fired.join(", "));
        }
    }
    Ok(())
}

async fn load_workflows(path: &Path) -> Result<Vec<Workflow>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read workflows {}", path.display()))?;
    parse_workflows(&content).with_context(|| format!("invalid workflows {}", path.display()))
}
