// src/storage/mod.rs
//! Key-value storage backends.
//!
//! The credential store never touches a concrete backend directly. It talks to
//! an injected [`Storage`] so tests can substitute [`MemoryStorage`] for the
//! durable [`FileStorage`].

use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod file_storage;
pub mod memory;

pub use file_storage::FileStorage;
pub use memory::MemoryStorage;

/// A batch of storage entries keyed by string.
pub type StorageMap = Map<String, Value>;

/// Persistent get/set/remove over string keys.
///
/// # Contract
/// - `get` returns only the requested keys that exist; absent keys are simply
///   missing from the result, never an error
/// - `set` writes every entry of the batch, replacing existing values
/// - `remove` of an absent key succeeds and changes nothing
/// - No call is retried; a backend failure is returned as-is
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError>;

    async fn set(&self, items: StorageMap) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
