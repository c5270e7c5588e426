//! Folio History
//!
//! This crate persists the transitions of workflow instances and restores
//! instances from what was persisted.
//!
//! The [`HistoryStore`] trait is the backend layer: it reads and writes whole
//! [`HistoryDocument`]s at a location. [`History`] sits on top of a store and
//! a [`WorkflowSource`](folio_workflow::WorkflowSource) and provides
//! initialize, restore, version read-back, move and delete for one subject.
//!
//! Restored instances carry a listener that appends a version to the store
//! after every fired transition.

mod document;
mod fs;
mod history;
mod memory;

pub use document::{HistoryDocument, VersionRecord};
pub use fs::FsHistoryStore;
pub use history::{History, Version};
pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use folio_workflow::PersistenceError;

/// History storage trait.
///
/// Implementations provide the durable backend (filesystem, memory, ...).
/// Locations are opaque, slash-separated keys such as `docs/en/index`.
#[async_trait]
pub trait HistoryStore: Send + Sync {
  /// Whether a document exists at `location`.
  async fn exists(&self, location: &str) -> Result<bool, PersistenceError>;

  /// Read the document at `location`.
  ///
  /// Fails with [`PersistenceError::NotInitialized`] when there is none.
  async fn read(&self, location: &str) -> Result<HistoryDocument, PersistenceError>;

  /// Create the document at `location`.
  ///
  /// Fails with [`PersistenceError::AlreadyInitialized`] when one exists.
  async fn create(&self, location: &str, document: &HistoryDocument)
  -> Result<(), PersistenceError>;

  /// Replace the document at `location`.
  ///
  /// The replacement is all-or-nothing: if the write fails, the previous
  /// document is still readable.
  async fn write(&self, location: &str, document: &HistoryDocument) -> Result<(), PersistenceError>;

  /// Delete the document at `location`.
  ///
  /// Fails with [`PersistenceError::NotInitialized`] when there is none.
  async fn delete(&self, location: &str) -> Result<(), PersistenceError>;
}
