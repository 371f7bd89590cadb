// src/error.rs
//! Error types for every layer of the wallet.
//!
//! Each layer owns one enum; lower layers convert into higher ones with
//! `#[from]` so failures propagate unchanged to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed decentralized identifier.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("invalid KILT DID: {0:?}")]
    InvalidDid(String),
}

/// Failures of a key-value storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored value could not be read back as the expected record.
    #[error("stored value under {key} is corrupted: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("credential could not be encoded: {0}")]
    Encoding(#[source] serde_json::Error),
}

/// Failures while querying chain state.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("attestation query failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("attestation query for {root_hash} returned HTTP {status}")]
    UnexpectedStatus { root_hash: String, status: u16 },

    #[error("chain unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a pending-status check.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures while loading runtime settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Failures while producing or writing a credential download.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("credential could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not a base64 JSON data URI")]
    InvalidDataUri,

    #[error("data URI payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("download name {0:?} is not a plain file name")]
    InvalidFileName(String),

    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}
