// src/utils/serialization.rs
//! Serialization utilities for the wallet.
//!
//! Provides serialization and deserialization functions for:
//! - JSON documents on disk
//! - Base64-wrapped JSON payloads (data URIs)

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json;

/// Serializes a value to an indented JSON string, for files people may read.
pub fn serialize_pretty<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from a JSON string.
///
/// # Note
/// The lifetime parameter lets the result borrow from the input string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Serializes a value to JSON and encodes the UTF-8 bytes as standard base64.
pub fn json_to_base64<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    Ok(base64::encode(serde_json::to_vec(data)?))
}

/// Reverses [`json_to_base64`].
///
/// # Errors
/// Fails if the payload is not valid base64 or does not hold JSON of type `T`.
pub fn base64_to_json<T: DeserializeOwned>(payload: &str) -> Result<T, crate::error::ExportError> {
    let bytes = base64::decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}
