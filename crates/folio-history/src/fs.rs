use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use folio_workflow::PersistenceError;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use crate::{HistoryDocument, HistoryStore};

/// Filesystem-based history store.
///
/// Each document is a JSON file at `{base_path}/{location}.json`. Parent
/// directories are created automatically. Writes go to a uniquely named
/// sibling temporary file that is renamed over the target, so a failed write
/// never leaves a half-written document behind. `create` links the
/// temporary file into place instead, which fails if the target exists.
pub struct FsHistoryStore {
  base_path: PathBuf,
}

impl FsHistoryStore {
  /// Create a new filesystem store with the given base path.
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  pub fn base_path(&self) -> &Path {
    &self.base_path
  }

  /// Map a location to its file, rejecting anything that could escape the
  /// base path.
  fn location_to_path(&self, location: &str) -> Result<PathBuf, PersistenceError> {
    let relative = Path::new(location);
    let valid = !location.is_empty()
      && relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !valid {
      return Err(PersistenceError::InvalidLocation(location.to_string()));
    }

    let mut path = self.base_path.join(relative);
    let file_name = format!(
      "{}.json",
      path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PersistenceError::InvalidLocation(location.to_string()))?
    );
    path.set_file_name(file_name);
    Ok(path)
  }

  /// Write `document` to a uniquely named sibling of `path`, synced to
  /// disk, and return the temporary path.
  async fn write_temp(
    &self,
    path: &Path,
    document: &HistoryDocument,
  ) -> Result<PathBuf, PersistenceError> {
    let bytes = serde_json::to_vec_pretty(document)?;

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
    let result = async {
      let mut file = File::create(&tmp_path).await?;
      file.write_all(&bytes).await?;
      file.flush().await?;
      file.sync_all().await
    }
    .await;

    match result {
      Ok(()) => Ok(tmp_path),
      Err(e) => {
        remove_temp(&tmp_path).await;
        Err(e.into())
      }
    }
  }
}

async fn remove_temp(tmp_path: &Path) {
  if let Err(e) = fs::remove_file(tmp_path).await
    && e.kind() != std::io::ErrorKind::NotFound
  {
    warn!(path = %tmp_path.display(), error = %e, "failed to remove temporary history file");
  }
}

#[async_trait]
impl HistoryStore for FsHistoryStore {
  async fn exists(&self, location: &str) -> Result<bool, PersistenceError> {
    let path = self.location_to_path(location)?;
    Ok(fs::try_exists(&path).await?)
  }

  async fn read(&self, location: &str) -> Result<HistoryDocument, PersistenceError> {
    let path = self.location_to_path(location)?;
    let content = fs::read(&path).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        PersistenceError::NotInitialized(location.to_string())
      } else {
        PersistenceError::Io(e)
      }
    })?;
    Ok(serde_json::from_slice(&content)?)
  }

  async fn create(
    &self,
    location: &str,
    document: &HistoryDocument,
  ) -> Result<(), PersistenceError> {
    let path = self.location_to_path(location)?;
    if fs::try_exists(&path).await? {
      return Err(PersistenceError::AlreadyInitialized(location.to_string()));
    }

    // Linking fails if the target appeared meanwhile, unlike rename.
    let tmp_path = self.write_temp(&path, document).await?;
    let result = fs::hard_link(&tmp_path, &path).await;
    remove_temp(&tmp_path).await;
    result.map_err(|e| {
      if e.kind() == std::io::ErrorKind::AlreadyExists {
        PersistenceError::AlreadyInitialized(location.to_string())
      } else {
        PersistenceError::Io(e)
      }
    })
  }

  async fn write(&self, location: &str, document: &HistoryDocument) -> Result<(), PersistenceError> {
    let path = self.location_to_path(location)?;
    let tmp_path = self.write_temp(&path, document).await?;
    if let Err(e) = fs::rename(&tmp_path, &path).await {
      remove_temp(&tmp_path).await;
      return Err(e.into());
    }
    Ok(())
  }

  async fn delete(&self, location: &str) -> Result<(), PersistenceError> {
    let path = self.location_to_path(location)?;
    fs::remove_file(&path).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        PersistenceError::NotInitialized(location.to_string())
      } else {
        PersistenceError::Io(e)
      }
    })
  }
}
