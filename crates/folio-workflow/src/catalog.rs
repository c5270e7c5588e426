use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::builder::WorkflowBuilder;
use crate::error::{LookupError, PersistenceError, Result};
use crate::registry::Registry;
use crate::workflow::Workflow;

/// Source of built workflows, looked up by workflow id.
///
/// History uses it to find the workflow a persisted record belongs to.
pub trait WorkflowSource: Send + Sync {
  fn workflow(&self, workflow_id: &str) -> Result<Arc<Workflow>, LookupError>;
}

/// In-memory set of built workflows.
#[derive(Debug, Default, Clone)]
pub struct WorkflowCatalog {
  workflows: HashMap<String, Arc<Workflow>>,
}

impl WorkflowCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a workflow, replacing any with the same id.
  pub fn insert(&mut self, workflow: Workflow) -> Arc<Workflow> {
    let workflow = Arc::new(workflow);
    self
      .workflows
      .insert(workflow.workflow_id().to_string(), Arc::clone(&workflow));
    workflow
  }

  pub fn len(&self) -> usize {
    self.workflows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.workflows.is_empty()
  }

  /// Build every `*.json` definition in `dir` and add it.
  ///
  /// Returns the number of workflows loaded. A missing directory loads
  /// nothing; any definition that fails to build fails the whole load.
  pub async fn load_dir(&mut self, dir: &Path, registry: &Registry) -> Result<usize> {
    if !fs::try_exists(dir).await.map_err(PersistenceError::from)? {
      return Ok(0);
    }

    let builder = WorkflowBuilder::new(registry);
    let mut entries = fs::read_dir(dir).await.map_err(PersistenceError::from)?;
    let mut loaded = 0;

    while let Some(entry) = entries.next_entry().await.map_err(PersistenceError::from)? {
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some("json") {
        continue;
      }

      let content = fs::read_to_string(&path)
        .await
        .map_err(PersistenceError::from)?;
      let workflow = builder.build_json(&content)?;
      info!(
        workflow_id = %workflow.workflow_id(),
        path = %path.display(),
        "loaded workflow definition"
      );
      self.insert(workflow);
      loaded += 1;
    }

    Ok(loaded)
  }
}

impl WorkflowSource for WorkflowCatalog {
  fn workflow(&self, workflow_id: &str) -> Result<Arc<Workflow>, LookupError> {
    self
      .workflows
      .get(workflow_id)
      .cloned()
      .ok_or_else(|| LookupError::Workflow(workflow_id.to_string()))
  }
}
