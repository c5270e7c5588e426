use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_history::{FsHistoryStore, History};
use folio_workflow::{Registry, Situation, WorkflowCatalog};

/// Folio - document lifecycle workflows with persisted history
#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.folio)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Who is acting, recorded with every version
  #[arg(long, global = true)]
  actor: Option<String>,

  /// Role held by the actor (repeatable)
  #[arg(long = "role", global = true)]
  roles: Vec<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Start the history of a document in a workflow's initial state
  Init {
    /// Document location, e.g. docs/en/index
    location: String,

    /// Workflow definition id
    workflow_id: String,
  },

  /// List the events that can be invoked on a document right now
  Events { location: String },

  /// Invoke an event on a document
  Invoke { location: String, event: String },

  /// Print the recorded versions of a document as JSON
  History { location: String },

  /// Relocate a document's history
  Move { location: String, to: String },

  /// Delete a document's history
  Delete { location: String },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".folio"),
  };

  let mut situation = Situation::new();
  situation.actor = cli.actor;
  situation.roles = cli.roles;

  match cli.command {
    Some(command) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run(command, &data_dir, &situation).await })
    }
    None => {
      println!("folio - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run(command: Commands, data_dir: &Path, situation: &Situation) -> Result<()> {
  // Load workflow definitions
  let workflows_dir = data_dir.join("workflows");
  let registry = Registry::with_builtins();
  let mut catalog = WorkflowCatalog::new();
  let loaded = catalog
    .load_dir(&workflows_dir, &registry)
    .await
    .with_context(|| format!("failed to load workflows from {}", workflows_dir.display()))?;
  tracing::debug!(loaded, dir = %workflows_dir.display(), "workflows loaded");

  let store = Arc::new(FsHistoryStore::new(data_dir.join("history")));
  let catalog = Arc::new(catalog);
  let open = |location: &str| History::new(store.clone(), catalog.clone(), location);

  match command {
    Commands::Init {
      location,
      workflow_id,
    } => {
      open(&location)
        .initialize(&workflow_id, situation)
        .await
        .with_context(|| format!("failed to initialize {location}"))?;
      eprintln!("Initialized {location} in workflow {workflow_id}");
    }

    Commands::Events { location } => {
      let mut history = open(&location);
      let instance = history
        .instance()
        .await
        .with_context(|| format!("failed to restore {location}"))?;
      eprintln!("Current state: {}", instance.current_state());
      for event in instance.executable_events(situation)? {
        println!("{event}");
      }
    }

    Commands::Invoke { location, event } => {
      let mut history = open(&location);
      let instance = history
        .instance()
        .await
        .with_context(|| format!("failed to restore {location}"))?;
      let event = instance.workflow().event(&event)?.clone();
      instance
        .invoke(situation, &event)
        .await
        .with_context(|| format!("failed to invoke {event} on {location}"))?;
      println!("{}", instance.current_state());
    }

    Commands::History { location } => {
      let versions = open(&location)
        .versions()
        .await
        .with_context(|| format!("failed to read history of {location}"))?;

      let output: Vec<serde_json::Value> = versions
        .iter()
        .map(|v| {
          serde_json::json!({
            "timestamp": v.timestamp.to_rfc3339(),
            "state": v.state.id(),
            "event": v.event.as_ref().map(|e| e.name()),
            "actor": v.actor,
          })
        })
        .collect();
      println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Commands::Move { location, to } => {
      open(&location)
        .move_to(&to)
        .await
        .with_context(|| format!("failed to move {location} to {to}"))?;
      eprintln!("Moved {location} to {to}");
    }

    Commands::Delete { location } => {
      open(&location)
        .delete()
        .await
        .with_context(|| format!("failed to delete {location}"))?;
      eprintln!("Deleted {location}");
    }
  }

  Ok(())
}
