// src/blockchain/mod.rs
//! Chain state access.

pub mod attestation_client;
