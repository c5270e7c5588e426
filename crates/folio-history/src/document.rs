//! The persisted history record.
//!
//! ```json
//! {
//!   "workflow_id": "publication",
//!   "versions": [
//!     { "timestamp": "2026-01-01T09:00:00Z", "state": "draft", "actor": "alice" },
//!     { "timestamp": "2026-01-01T09:05:00Z", "state": "review", "event": "submit", "actor": "alice" }
//!   ],
//!   "variables": { "approved": false }
//! }
//! ```
//!
//! `variables` holds the most recent values only, not one snapshot per
//! version.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
  pub workflow_id: String,
  #[serde(default)]
  pub versions: Vec<VersionRecord>,
  #[serde(default)]
  pub variables: BTreeMap<String, bool>,
}

/// One persisted transition. The first record of a document has no event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
  pub timestamp: DateTime<Utc>,
  pub state: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub event: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actor: Option<String>,
}

impl HistoryDocument {
  pub fn new(workflow_id: impl Into<String>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      versions: Vec::new(),
      variables: BTreeMap::new(),
    }
  }

  /// The most recent version, if any.
  pub fn latest(&self) -> Option<&VersionRecord> {
    self.versions.last()
  }
}

impl VersionRecord {
  /// A record stamped with the current time.
  pub fn now(state: impl Into<String>, event: Option<String>, actor: Option<String>) -> Self {
    Self {
      timestamp: Utc::now(),
      state: state.into(),
      event,
      actor,
    }
  }
}
