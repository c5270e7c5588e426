//! Integration tests for History over the memory and filesystem stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use folio_config::WorkflowDef;
use folio_history::{
  FsHistoryStore, History, HistoryDocument, HistoryStore, MemoryHistoryStore, VersionRecord,
};
use folio_workflow::{
  Event, ExecutionError, LookupError, PersistenceError, Registry, Situation, WorkflowBuilder,
  WorkflowCatalog, WorkflowError, WorkflowSource,
};
use serde_json::json;

fn publication_def() -> WorkflowDef {
  serde_json::from_value(json!({
    "workflow_id": "publication",
    "states": [
      { "id": "draft", "initial": true },
      { "id": "review" },
      { "id": "published" }
    ],
    "variables": [
      { "name": "approved", "value": false },
      { "name": "visible", "value": true }
    ],
    "events": [{ "id": "submit" }, { "id": "approve" }, { "id": "publish" }],
    "transitions": [
      { "source": "draft", "destination": "review", "event": "submit" },
      {
        "source": "review", "destination": "review", "event": "approve",
        "actions": [{ "type": "assign", "variable": "approved", "value": true }]
      },
      {
        "source": "review", "destination": "published", "event": "publish",
        "conditions": [{ "condition": "boolean_variable", "expression": "approved == true" }]
      }
    ]
  }))
  .unwrap()
}

fn catalog_with(def: WorkflowDef) -> Arc<WorkflowCatalog> {
  let registry = Registry::with_builtins();
  let mut catalog = WorkflowCatalog::new();
  catalog.insert(WorkflowBuilder::new(&registry).build(def).unwrap());
  Arc::new(catalog)
}

fn catalog() -> Arc<WorkflowCatalog> {
  catalog_with(publication_def())
}

fn event(catalog: &WorkflowCatalog, name: &str) -> Event {
  catalog
    .workflow("publication")
    .unwrap()
    .event(name)
    .unwrap()
    .clone()
}

fn alice() -> Situation {
  Situation::for_actor("alice").with_role("editor")
}

async fn initialized(store: Arc<dyn HistoryStore>, catalog: Arc<WorkflowCatalog>) -> History {
  let history = History::new(store, catalog, "docs/index");
  history.initialize("publication", &alice()).await.unwrap();
  history
}

fn names(events: &[Event]) -> Vec<&str> {
  events.iter().map(|e| e.name()).collect()
}

#[tokio::test]
async fn test_fresh_history_starts_in_initial_state() {
  let catalog = catalog();
  let mut history = initialized(Arc::new(MemoryHistoryStore::new()), Arc::clone(&catalog)).await;

  let workflow = catalog.workflow("publication").unwrap();
  let instance = history.instance().await.unwrap();
  assert_eq!(instance.current_state(), workflow.initial_state());
  assert!(!instance.value("approved").unwrap());
  assert!(instance.value("visible").unwrap());

  let versions = history.versions().await.unwrap();
  assert_eq!(versions.len(), 1);
  assert_eq!(versions[0].state.id(), "draft");
  assert!(versions[0].event.is_none());
  assert_eq!(versions[0].actor.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_initialize_twice_fails() {
  let catalog = catalog();
  let history = initialized(Arc::new(MemoryHistoryStore::new()), catalog).await;

  assert!(matches!(
    history.initialize("publication", &alice()).await,
    Err(WorkflowError::Persistence(PersistenceError::AlreadyInitialized(_)))
  ));
}

#[tokio::test]
async fn test_initialize_unknown_workflow() {
  let history = History::new(Arc::new(MemoryHistoryStore::new()), catalog(), "docs/index");
  assert!(matches!(
    history.initialize("translation", &alice()).await,
    Err(WorkflowError::Lookup(LookupError::Workflow(_)))
  ));
  assert!(!history.is_initialized().await);
}

#[tokio::test]
async fn test_instance_requires_initialization() {
  let mut history = History::new(Arc::new(MemoryHistoryStore::new()), catalog(), "docs/index");
  assert!(!history.is_initialized().await);
  assert!(matches!(
    history.instance().await,
    Err(WorkflowError::Persistence(PersistenceError::NotInitialized(_)))
  ));
}

#[tokio::test]
async fn test_publication_scenario_persists_four_versions() {
  let catalog = catalog();
  let mut history = initialized(Arc::new(MemoryHistoryStore::new()), Arc::clone(&catalog)).await;
  let situation = alice();

  let instance = history.instance().await.unwrap();
  assert_eq!(names(&instance.executable_events(&situation).unwrap()), ["submit"]);
  instance
    .invoke(&situation, &event(&catalog, "submit"))
    .await
    .unwrap();
  assert_eq!(instance.current_state().id(), "review");

  assert_eq!(names(&instance.executable_events(&situation).unwrap()), ["approve"]);
  instance
    .invoke(&situation, &event(&catalog, "approve"))
    .await
    .unwrap();
  assert!(instance.value("approved").unwrap());

  assert_eq!(
    names(&instance.executable_events(&situation).unwrap()),
    ["approve", "publish"]
  );
  instance
    .invoke(&situation, &event(&catalog, "publish"))
    .await
    .unwrap();
  assert_eq!(instance.current_state().id(), "published");

  let versions = history.versions().await.unwrap();
  let steps: Vec<(&str, Option<&str>)> = versions
    .iter()
    .map(|v| (v.state.id(), v.event.as_ref().map(|e| e.name())))
    .collect();
  assert_eq!(
    steps,
    [
      ("draft", None),
      ("review", Some("submit")),
      ("review", Some("approve")),
      ("published", Some("publish")),
    ]
  );
  assert!(versions.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

  let document = history.document().await.unwrap();
  assert_eq!(document.variables.get("approved"), Some(&true));
  assert_eq!(document.variables.get("visible"), Some(&true));
}

#[tokio::test]
async fn test_restore_round_trip() {
  let catalog = catalog();
  let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
  let mut history = initialized(Arc::clone(&store), Arc::clone(&catalog)).await;

  let instance = history.instance().await.unwrap();
  instance
    .invoke(&alice(), &event(&catalog, "submit"))
    .await
    .unwrap();
  instance
    .invoke(&alice(), &event(&catalog, "approve"))
    .await
    .unwrap();
  let expected_state = instance.current_state().clone();
  let expected_values = instance.values();

  let mut reopened = History::new(store, catalog, "docs/index");
  let restored = reopened.instance().await.unwrap();
  assert_eq!(restored.current_state(), &expected_state);
  assert_eq!(restored.values(), expected_values);
}

#[tokio::test]
async fn test_each_invoke_appends_exactly_one_version() {
  let catalog = catalog();
  let mut history = initialized(Arc::new(MemoryHistoryStore::new()), Arc::clone(&catalog)).await;

  for (expected, name) in [(2, "submit"), (3, "approve"), (4, "approve"), (5, "publish")] {
    let instance = history.instance().await.unwrap();
    instance
      .invoke(&alice(), &event(&catalog, name))
      .await
      .unwrap();
    assert_eq!(history.versions().await.unwrap().len(), expected);
  }
}

#[tokio::test]
async fn test_rejected_invoke_appends_nothing() {
  let catalog = catalog();
  let mut history = initialized(Arc::new(MemoryHistoryStore::new()), Arc::clone(&catalog)).await;

  let instance = history.instance().await.unwrap();
  let result = instance.invoke(&alice(), &event(&catalog, "publish")).await;
  assert!(matches!(
    result,
    Err(WorkflowError::Execution(ExecutionError::NotInvokable { .. }))
  ));
  assert_eq!(history.versions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_append_keeps_versions_written_by_others() {
  let catalog = catalog();
  let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
  let mut history = initialized(Arc::clone(&store), Arc::clone(&catalog)).await;
  history.instance().await.unwrap();

  // Another writer records a version after our instance was restored.
  let mut document = store.read("docs/index").await.unwrap();
  document
    .versions
    .push(VersionRecord::now("draft", Some("submit".to_string()), None));
  store.write("docs/index", &document).await.unwrap();

  let instance = history.instance().await.unwrap();
  instance
    .invoke(&alice(), &event(&catalog, "submit"))
    .await
    .unwrap();
  assert_eq!(history.versions().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_move_preserves_versions() {
  let catalog = catalog();
  let memory = Arc::new(MemoryHistoryStore::new());
  let store: Arc<dyn HistoryStore> = Arc::clone(&memory) as Arc<dyn HistoryStore>;
  let mut history = initialized(Arc::clone(&store), Arc::clone(&catalog)).await;
  history
    .instance()
    .await
    .unwrap()
    .invoke(&alice(), &event(&catalog, "submit"))
    .await
    .unwrap();
  let before = history.versions().await.unwrap();

  history.move_to("archive/index").await.unwrap();
  assert_eq!(history.location(), "archive/index");
  assert_eq!(memory.locations().await, ["archive/index"]);
  assert!(!store.exists("docs/index").await.unwrap());
  assert_eq!(history.versions().await.unwrap(), before);

  // The memoized instance keeps recording at the new location.
  history
    .instance()
    .await
    .unwrap()
    .invoke(&alice(), &event(&catalog, "approve"))
    .await
    .unwrap();
  assert!(!store.exists("docs/index").await.unwrap());
  assert_eq!(history.versions().await.unwrap().len(), before.len() + 1);

  let reopened = History::new(store, catalog, "archive/index");
  assert_eq!(reopened.versions().await.unwrap().len(), before.len() + 1);
}

#[tokio::test]
async fn test_move_onto_existing_record_fails_without_loss() {
  let catalog = catalog();
  let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
  let mut history = initialized(Arc::clone(&store), Arc::clone(&catalog)).await;
  History::new(Arc::clone(&store), Arc::clone(&catalog) as Arc<dyn WorkflowSource>, "docs/other")
    .initialize("publication", &alice())
    .await
    .unwrap();

  assert!(matches!(
    history.move_to("docs/other").await,
    Err(WorkflowError::Persistence(PersistenceError::AlreadyInitialized(_)))
  ));
  assert_eq!(history.location(), "docs/index");
  assert!(history.is_initialized().await);
}

#[tokio::test]
async fn test_move_uninitialized_fails() {
  let mut history = History::new(Arc::new(MemoryHistoryStore::new()), catalog(), "docs/index");
  assert!(matches!(
    history.move_to("archive/index").await,
    Err(WorkflowError::Persistence(PersistenceError::NotInitialized(_)))
  ));
}

#[tokio::test]
async fn test_delete() {
  let catalog = catalog();
  let mut history = initialized(Arc::new(MemoryHistoryStore::new()), catalog).await;
  history.instance().await.unwrap();

  history.delete().await.unwrap();
  assert!(!history.is_initialized().await);
  assert!(history.instance().await.is_err());
  assert!(matches!(
    history.delete().await,
    Err(WorkflowError::Persistence(PersistenceError::NotInitialized(_)))
  ));
}

#[tokio::test]
async fn test_definition_drift_is_a_lookup_error() {
  let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
  let old = catalog();
  let mut history = initialized(Arc::clone(&store), Arc::clone(&old)).await;
  history
    .instance()
    .await
    .unwrap()
    .invoke(&alice(), &event(&old, "submit"))
    .await
    .unwrap();

  // The new definition renames the review state.
  let mut def = publication_def();
  def.states[1].id = "in_review".to_string();
  for transition in &mut def.transitions {
    for id in [&mut transition.source, &mut transition.destination] {
      if *id == "review" {
        *id = "in_review".to_string();
      }
    }
  }
  let drifted = catalog_with(def);

  let history = History::new(Arc::clone(&store), Arc::clone(&drifted) as Arc<dyn WorkflowSource>, "docs/index");
  assert!(matches!(
    history.versions().await,
    Err(WorkflowError::Lookup(LookupError::State(id))) if id == "review"
  ));

  let mut history = History::new(store, drifted, "docs/index");
  assert!(matches!(
    history.instance().await,
    Err(WorkflowError::Lookup(LookupError::State(_)))
  ));
}

#[tokio::test]
async fn test_missing_versions_fall_back_to_initial_state() {
  let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
  let mut document = HistoryDocument::new("publication");
  document.variables.insert("approved".to_string(), true);
  store.create("docs/index", &document).await.unwrap();

  let mut history = History::new(store, catalog(), "docs/index");
  let instance = history.instance().await.unwrap();
  assert_eq!(instance.current_state().id(), "draft");
  assert!(instance.value("approved").unwrap());
  // Absent from the snapshot, so the default applies.
  assert!(instance.value("visible").unwrap());
}

/// Memory store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
  inner: MemoryHistoryStore,
  fail_writes: AtomicBool,
}

#[async_trait]
impl HistoryStore for FlakyStore {
  async fn exists(&self, location: &str) -> Result<bool, PersistenceError> {
    self.inner.exists(location).await
  }

  async fn read(&self, location: &str) -> Result<HistoryDocument, PersistenceError> {
    self.inner.read(location).await
  }

  async fn create(
    &self,
    location: &str,
    document: &HistoryDocument,
  ) -> Result<(), PersistenceError> {
    self.inner.create(location, document).await
  }

  async fn write(&self, location: &str, document: &HistoryDocument) -> Result<(), PersistenceError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(PersistenceError::Io(std::io::Error::other("disk full")));
    }
    self.inner.write(location, document).await
  }

  async fn delete(&self, location: &str) -> Result<(), PersistenceError> {
    self.inner.delete(location).await
  }
}

#[tokio::test]
async fn test_persistence_failure_surfaces_with_state_advanced() {
  let catalog = catalog();
  let store = Arc::new(FlakyStore::default());
  let mut history = initialized(Arc::clone(&store) as Arc<dyn HistoryStore>, Arc::clone(&catalog)).await;
  store.fail_writes.store(true, Ordering::SeqCst);

  let instance = history.instance().await.unwrap();
  let result = instance.invoke(&alice(), &event(&catalog, "submit")).await;

  assert!(matches!(
    result,
    Err(WorkflowError::Persistence(PersistenceError::Io(_)))
  ));
  assert_eq!(instance.current_state().id(), "review");
  assert_eq!(history.versions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fs_store_round_trip() {
  let dir = tempfile::tempdir().unwrap();
  let catalog = catalog();
  let store: Arc<dyn HistoryStore> = Arc::new(FsHistoryStore::new(dir.path()));
  let mut history = initialized(Arc::clone(&store), Arc::clone(&catalog)).await;
  assert!(dir.path().join("docs/index.json").exists());

  let instance = history.instance().await.unwrap();
  instance
    .invoke(&alice(), &event(&catalog, "submit"))
    .await
    .unwrap();
  instance
    .invoke(&alice(), &event(&catalog, "approve"))
    .await
    .unwrap();

  history.move_to("archive/2026/index").await.unwrap();
  assert!(!dir.path().join("docs/index.json").exists());
  assert!(dir.path().join("archive/2026/index.json").exists());

  let mut reopened = History::new(store, catalog, "archive/2026/index");
  assert_eq!(reopened.versions().await.unwrap().len(), 3);
  let restored = reopened.instance().await.unwrap();
  assert_eq!(restored.current_state().id(), "review");
  assert!(restored.value("approved").unwrap());

  reopened.delete().await.unwrap();
  assert!(!reopened.is_initialized().await);
}

#[tokio::test]
async fn test_invalid_location_is_reported() {
  let dir = tempfile::tempdir().unwrap();
  let store: Arc<dyn HistoryStore> = Arc::new(FsHistoryStore::new(dir.path()));
  let mut history = History::new(store, catalog(), "../outside");

  assert!(!history.is_initialized().await);
  assert!(matches!(
    history.instance().await,
    Err(WorkflowError::Persistence(PersistenceError::InvalidLocation(_)))
  ));
  assert!(matches!(
    history.delete().await,
    Err(WorkflowError::Persistence(PersistenceError::InvalidLocation(_)))
  ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_initialize_has_one_winner() {
  let dir = tempfile::tempdir().unwrap();
  let store: Arc<dyn HistoryStore> = Arc::new(FsHistoryStore::new(dir.path()));
  let catalog = catalog();

  let tasks: Vec<_> = ["alice", "bob"]
    .into_iter()
    .map(|actor| {
      let history = History::new(Arc::clone(&store), Arc::clone(&catalog) as Arc<dyn WorkflowSource>, "docs/index");
      tokio::spawn(async move {
        history
          .initialize("publication", &Situation::for_actor(actor))
          .await
      })
    })
    .collect();

  let mut outcomes = Vec::new();
  for task in tasks {
    outcomes.push(task.await.unwrap());
  }

  assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
  assert!(outcomes.iter().any(|r| matches!(
    r,
    Err(WorkflowError::Persistence(PersistenceError::AlreadyInitialized(_)))
  )));

  let history = History::new(store, catalog, "docs/index");
  assert_eq!(history.versions().await.unwrap().len(), 1);
}
