// src/storage/file_storage.rs
//! File-backed storage for the command line wallet.
//!
//! Persists the whole key space as one JSON object on disk:
//! - A missing file reads as empty storage
//! - Every write replaces the file through a temporary sibling and a rename,
//!   so a crash mid-write never leaves a truncated document behind
//! - Access within one process is serialized by an async mutex
//!
//! # Security Considerations
//! Credentials are written in plain JSON. Protect the file with filesystem
//! permissions.

use super::{Storage, StorageMap};
use crate::error::StorageError;
use crate::utils::serialization::{deserialize, serialize_pretty};
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// JSON document storage at a fixed path.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Creates a storage handle. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn load(&self) -> Result<StorageMap, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(StorageMap::new()),
            Ok(text) => Ok(deserialize(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StorageMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn persist(&self, entries: &StorageMap) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serialize_pretty(entries)?)
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!("persisted {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|key| entries.remove(key).map(|value| (key.clone(), value)))
            .collect())
    }

    async fn set(&self, items: StorageMap) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.extend(items);
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries).await
    }
}
