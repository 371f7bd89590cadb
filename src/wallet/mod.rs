// src/wallet/mod.rs
//! Wallet-side credential handling: persistence and export.

pub mod credential_export;
pub mod credential_storage;
