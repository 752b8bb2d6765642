use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// Persistence failures for model blobs and datasets.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model blob could not be encoded or decoded: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// JSON file holding a trained model snapshot.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save<M: Serialize>(&self, model: &M) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_vec(model)?;
        fs::write(&self.path, encoded)?;
        info!(path = %self.path.display(), "model saved");
        Ok(())
    }

    /// Returns `Ok(None)` when nothing has been persisted yet.
    pub fn load<M: DeserializeOwned>(&self) -> Result<Option<M>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "no persisted model found");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let model = serde_json::from_slice(&bytes)?;
        info!(path = %self.path.display(), "model loaded");
        Ok(Some(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        weights: Vec<f64>,
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = ModelStore::new(dir.path().join("absent.json"));
        let loaded: Option<Blob> = store.load().expect("load succeeds");
        assert!(loaded.is_none());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = ModelStore::new(dir.path().join("models").join("forest.json"));
        let blob = Blob {
            weights: vec![0.25, 0.75],
        };

        store.save(&blob).expect("save succeeds");
        let loaded: Option<Blob> = store.load().expect("load succeeds");
        assert_eq!(loaded, Some(blob));
    }

    #[test]
    fn corrupt_blob_is_a_json_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("forest.json");
        fs::write(&path, b"not json").expect("write");

        let err = ModelStore::new(path)
            .load::<Blob>()
            .expect_err("corrupt blob rejected");
        assert!(matches!(err, StoreError::Json(_)));
    }
}
