// src/services/mod.rs
//! Services layered on top of the credential store.

pub mod notifier;
pub mod status_resolver;
