// src/models/did.rs
//! Decentralized identifier (DID) URIs for KILT identities.

use crate::error::DidError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Method prefix every KILT DID starts with.
pub const KILT_DID_PREFIX: &str = "did:kilt:";

/// A validated KILT DID URI, e.g. `did:kilt:4pehddkhEanexVTTzWAtrrfo2R7xPnePpuiJLC7shQU894aY`.
///
/// Light DIDs (`did:kilt:light:...`) are accepted as-is; only the method
/// prefix and a non-empty, whitespace-free identifier are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DidUri(String);

impl DidUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method-specific part after `did:kilt:`.
    pub fn identifier(&self) -> &str {
        &self.0[KILT_DID_PREFIX.len()..]
    }
}

impl TryFrom<String> for DidUri {
    type Error = DidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let identifier = value
            .strip_prefix(KILT_DID_PREFIX)
            .ok_or_else(|| DidError::InvalidDid(value.clone()))?;
        if identifier.is_empty() || identifier.chars().any(char::is_whitespace) {
            return Err(DidError::InvalidDid(value));
        }
        Ok(DidUri(value))
    }
}

impl FromStr for DidUri {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DidUri::try_from(s.to_string())
    }
}

impl From<DidUri> for String {
    fn from(did: DidUri) -> Self {
        did.0
    }
}

impl fmt::Display for DidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_and_light_dids() {
        let full: DidUri = "did:kilt:4alice".parse().unwrap();
        assert_eq!(full.as_str(), "did:kilt:4alice");
        assert_eq!(full.identifier(), "4alice");

        let light: DidUri = "did:kilt:light:00abc".parse().unwrap();
        assert_eq!(light.identifier(), "light:00abc");
    }

    #[test]
    fn test_rejects_foreign_or_empty_dids() {
        assert!("did:web:example.com".parse::<DidUri>().is_err());
        assert!("did:kilt:".parse::<DidUri>().is_err());
        assert!("did:kilt:4al ice".parse::<DidUri>().is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let did: DidUri = serde_json::from_str("\"did:kilt:4bob\"").unwrap();
        assert_eq!(did.to_string(), "did:kilt:4bob");
        assert!(serde_json::from_str::<DidUri>("\"bob\"").is_err());
    }
}
