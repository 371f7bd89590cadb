// src/models/mod.rs
//! Data structures shared across the wallet.

pub mod credential;
pub mod did;
