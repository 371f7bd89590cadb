// src/lib.rs

//! # Sporran credential wallet core
//!
//! Holds KILT credentials on behalf of a user and keeps their attestation
//! status current.
//!
//! ## Architecture Overview
//! 1. **Storage Layer**: `Storage` trait with in-memory and file backends
//! 2. **Wallet Layer**: `CredentialStore` (records + key list) and downloads
//! 3. **Services Layer**: revalidation `Notifier` and the `StatusResolver`
//! 4. **Blockchain Layer**: attestation lookups by credential root hash

pub mod blockchain;    // Chain state access
pub mod config;        // Layered settings
pub mod error;         // Error types per layer
pub mod models;        // Data structures
pub mod services;      // Notifications and status resolution
pub mod storage;       // Key-value backends
pub mod utils;         // Helper functions
pub mod wallet;        // Credential persistence and export

pub use models::credential::{AttestationStatus, Credential, SharedCredential};
pub use models::did::DidUri;
pub use services::notifier::{Notifier, Revalidation, Subscription};
pub use services::status_resolver::{AttestationSource, PendingCheck, StatusResolver};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use wallet::credential_export::{credential_download, CredentialDownload};
pub use wallet::credential_storage::CredentialStore;
