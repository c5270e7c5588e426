use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per subject.
///
/// The engine never locks on its own. Callers that may invoke events on the
/// same subject concurrently hold the subject's guard around the whole
/// `instance()` / `invoke()` sequence, at least for transitions reporting
/// [`is_synchronized`](crate::WorkflowInstance::is_synchronized).
#[derive(Debug, Clone, Default)]
pub struct SubjectLocks {
  locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held while a subject is locked. Dropping it releases the lock.
pub type SubjectGuard = OwnedMutexGuard<()>;

impl SubjectLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Wait for and take the lock of `subject`.
  pub async fn lock(&self, subject: &str) -> SubjectGuard {
    let lock = {
      let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
      // Drop entries nobody holds or waits on.
      locks.retain(|_, l| Arc::strong_count(l) > 1);
      Arc::clone(locks.entry(subject.to_string()).or_default())
    };
    lock.lock_owned().await
  }

  /// Number of subjects with a live lock entry.
  pub fn len(&self) -> usize {
    self
      .locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
