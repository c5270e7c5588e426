use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_workflow::{
  Event, PersistenceError, Result, Situation, State, WorkflowInstance, WorkflowListener,
  WorkflowSource,
};
use tracing::{debug, info, warn};

use crate::{HistoryDocument, HistoryStore, VersionRecord};

/// One entry of a subject's history, resolved against the live workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
  pub timestamp: DateTime<Utc>,
  pub state: State,
  /// `None` for the initial version.
  pub event: Option<Event>,
  pub actor: Option<String>,
}

/// The persisted history of one subject.
///
/// ```text
/// History
/// ├── initialize(workflow_id, situation) - first version in the initial state
/// ├── instance()                         - restore (memoized) from the latest version
/// ├── versions()                         - full read-back
/// ├── move_to(location)                  - copy, then delete the source
/// └── delete()
/// ```
///
/// The restored instance appends a version to the store after every fired
/// transition.
pub struct History {
  store: Arc<dyn HistoryStore>,
  workflows: Arc<dyn WorkflowSource>,
  recorder: Arc<Recorder>,
  instance: Option<WorkflowInstance>,
}

impl History {
  pub fn new(
    store: Arc<dyn HistoryStore>,
    workflows: Arc<dyn WorkflowSource>,
    location: impl Into<String>,
  ) -> Self {
    let recorder = Arc::new(Recorder {
      store: Arc::clone(&store),
      location: RwLock::new(location.into()),
    });

    Self {
      store,
      workflows,
      recorder,
      instance: None,
    }
  }

  /// Where the record currently lives.
  pub fn location(&self) -> String {
    self.recorder.location()
  }

  /// Create the record with a first version in the workflow's initial
  /// state. Fails if a record already exists at this location.
  pub async fn initialize(&self, workflow_id: &str, situation: &Situation) -> Result<()> {
    let workflow = self.workflows.workflow(workflow_id)?;
    let location = self.location();

    let mut document = HistoryDocument::new(workflow_id);
    document.versions.push(VersionRecord::now(
      workflow.initial_state().id(),
      None,
      situation.actor.clone(),
    ));
    document.variables = workflow
      .variables()
      .map(|v| (v.name().to_string(), v.initial_value()))
      .collect();

    self.store.create(&location, &document).await?;
    info!(
      workflow_id,
      location = %location,
      state = %workflow.initial_state(),
      "history initialized"
    );
    Ok(())
  }

  /// Whether a record exists. Store failures count as "no"; `instance`
  /// and `delete` report them instead.
  pub async fn is_initialized(&self) -> bool {
    let location = self.location();
    match self.store.exists(&location).await {
      Ok(exists) => exists,
      Err(e) => {
        warn!(location = %location, error = %e, "history existence check failed");
        false
      }
    }
  }

  /// The workflow instance of this subject, restored from the latest
  /// version on first call and reused afterwards.
  pub async fn instance(&mut self) -> Result<&mut WorkflowInstance> {
    let instance = match self.instance.take() {
      Some(instance) => instance,
      None => self.restore().await?,
    };
    Ok(self.instance.insert(instance))
  }

  async fn restore(&self) -> Result<WorkflowInstance> {
    let location = self.location();
    if !self.store.exists(&location).await? {
      return Err(PersistenceError::NotInitialized(location).into());
    }

    let document = self.store.read(&location).await?;
    let workflow = self.workflows.workflow(&document.workflow_id)?;
    let state = document.latest().map(|v| v.state.as_str());
    if state.is_none() {
      warn!(location = %location, "history has no versions, using initial state");
    }

    let mut instance = WorkflowInstance::restore(workflow, state, &document.variables)?;
    instance.add_listener(Arc::clone(&self.recorder) as Arc<dyn WorkflowListener>);

    debug!(
      location = %location,
      workflow_id = %document.workflow_id,
      state = %instance.current_state(),
      "instance restored"
    );
    Ok(instance)
  }

  /// The raw persisted record.
  pub async fn document(&self) -> Result<HistoryDocument> {
    Ok(self.store.read(&self.location()).await?)
  }

  /// Every persisted version, oldest first.
  ///
  /// Fails with a lookup error when a persisted state or event no longer
  /// exists in the workflow definition.
  pub async fn versions(&self) -> Result<Vec<Version>> {
    let document = self.document().await?;
    let workflow = self.workflows.workflow(&document.workflow_id)?;

    let mut versions = Vec::with_capacity(document.versions.len());
    for record in document.versions {
      let state = workflow.state(&record.state)?.clone();
      let event = match &record.event {
        Some(name) => Some(workflow.event(name)?.clone()),
        None => None,
      };
      versions.push(Version {
        timestamp: record.timestamp,
        state,
        event,
        actor: record.actor,
      });
    }
    Ok(versions)
  }

  /// Relocate the record.
  ///
  /// The document is created at `new_location` first and the source is
  /// deleted afterwards, so a failure at any step leaves at least one
  /// complete copy.
  pub async fn move_to(&mut self, new_location: &str) -> Result<()> {
    let old_location = self.location();
    let document = self.store.read(&old_location).await?;
    self.store.create(new_location, &document).await?;
    self.store.delete(&old_location).await?;
    self.recorder.set_location(new_location);

    info!(from = %old_location, to = %new_location, "history moved");
    Ok(())
  }

  /// Delete the record and forget the restored instance.
  pub async fn delete(&mut self) -> Result<()> {
    let location = self.location();
    if !self.store.exists(&location).await? {
      return Err(PersistenceError::NotInitialized(location).into());
    }

    self.store.delete(&location).await?;
    self.instance = None;
    info!(location = %location, "history deleted");
    Ok(())
  }
}

/// Listener that appends a version for every fired transition.
struct Recorder {
  store: Arc<dyn HistoryStore>,
  location: RwLock<String>,
}

impl Recorder {
  fn location(&self) -> String {
    self
      .location
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn set_location(&self, location: &str) {
    *self.location.write().unwrap_or_else(PoisonError::into_inner) = location.to_string();
  }
}

#[async_trait]
impl WorkflowListener for Recorder {
  async fn transition_fired(
    &self,
    instance: &WorkflowInstance,
    situation: &Situation,
    event: &Event,
  ) -> Result<()> {
    let location = self.location();

    // Re-read so versions written by others since the restore are kept.
    let mut document = self.store.read(&location).await?;
    document.versions.push(VersionRecord::now(
      instance.current_state().id(),
      Some(event.name().to_string()),
      situation.actor.clone(),
    ));
    document.variables = instance.values();
    self.store.write(&location, &document).await?;

    debug!(
      location = %location,
      state = %instance.current_state(),
      event = %event,
      versions = document.versions.len(),
      "version appended"
    );
    Ok(())
  }
}
