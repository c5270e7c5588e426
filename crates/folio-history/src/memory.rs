use std::collections::HashMap;

use async_trait::async_trait;
use folio_workflow::PersistenceError;
use tokio::sync::RwLock;

use crate::{HistoryDocument, HistoryStore};

/// In-memory history store.
///
/// Useful for tests and for callers that keep history only for the lifetime
/// of the process.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
  documents: RwLock<HashMap<String, HistoryDocument>>,
}

impl MemoryHistoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Locations currently holding a document, sorted.
  pub async fn locations(&self) -> Vec<String> {
    let mut locations: Vec<String> = self.documents.read().await.keys().cloned().collect();
    locations.sort();
    locations
  }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
  async fn exists(&self, location: &str) -> Result<bool, PersistenceError> {
    Ok(self.documents.read().await.contains_key(location))
  }

  async fn read(&self, location: &str) -> Result<HistoryDocument, PersistenceError> {
    self
      .documents
      .read()
      .await
      .get(location)
      .cloned()
      .ok_or_else(|| PersistenceError::NotInitialized(location.to_string()))
  }

  async fn create(
    &self,
    location: &str,
    document: &HistoryDocument,
  ) -> Result<(), PersistenceError> {
    let mut documents = self.documents.write().await;
    if documents.contains_key(location) {
      return Err(PersistenceError::AlreadyInitialized(location.to_string()));
    }
    documents.insert(location.to_string(), document.clone());
    Ok(())
  }

  async fn write(&self, location: &str, document: &HistoryDocument) -> Result<(), PersistenceError> {
    self
      .documents
      .write()
      .await
      .insert(location.to_string(), document.clone());
    Ok(())
  }

  async fn delete(&self, location: &str) -> Result<(), PersistenceError> {
    self
      .documents
      .write()
      .await
      .remove(location)
      .map(|_| ())
      .ok_or_else(|| PersistenceError::NotInitialized(location.to_string()))
  }
}
