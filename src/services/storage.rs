// Author: Dustin Pilgrim
// License: MIT

use std::future::Future;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not a JSON object: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Durable key-value storage for the table snapshot.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Values for whichever of `keys` are present.
    fn get(&self, keys: &[&str]) -> impl Future<Output = Result<Map<String, Value>, StorageError>> + Send;

    /// Overwrite the given keys, leaving others untouched.
    fn set(&mut self, values: Map<String, Value>) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// A single JSON object on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Malformed {
                path: self.path.clone(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(StorageError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
        let all = self.load().await?;
        Ok(all
            .into_iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .collect())
    }

    async fn set(&mut self, values: Map<String, Value>) -> Result<(), StorageError> {
        // an unreadable file is replaced rather than blocking every write
        let mut current = self.load().await.unwrap_or_default();
        current.extend(values);

        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let payload = serde_json::to_vec_pretty(&Value::Object(current)).map_err(|e| {
            StorageError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload).await.map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}
