// src/models/credential.rs
//! Credential data model.
//!
//! Defines the locally stored representation of a claim together with its
//! attestation status, plus the storage key scheme that ties every record to
//! its content hash.

use crate::models::did::DidUri;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix shared by every credential storage key.
pub const KEY_PREFIX: &str = "credential:";

/// Storage key of the ordered list of stored credential keys.
pub const LIST_KEY: &str = "credential:list";

/// Derives the storage key for a credential content hash.
///
/// # Example
/// ```
/// assert_eq!(sporran::models::credential::credential_key("0xab"), "credential:0xab");
/// ```
pub fn credential_key(hash: &str) -> String {
    format!("{KEY_PREFIX}{hash}")
}

/// Attestation state of a stored credential.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    /// Signed and submitted, no attestation observed on chain yet.
    Pending,
    /// Attested on chain and not revoked.
    Attested,
    /// Attested on chain, later revoked by the attester.
    Revoked,
    /// Rejected or otherwise unusable.
    Invalid,
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttestationStatus::Pending => "pending",
            AttestationStatus::Attested => "attested",
            AttestationStatus::Revoked => "revoked",
            AttestationStatus::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// The claim a credential makes about its owner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Hash of the cType the contents conform to
    pub c_type_hash: String,

    /// Claimed properties, keyed by property name
    pub contents: Map<String, Value>,

    /// DID of the identity the claim is about
    pub owner: DidUri,
}

/// The signed attestation request a credential was created from.
///
/// Only the fields this crate reads are typed. Everything else the SDK put
/// into the record (legitimations, nonces, signatures, ...) is kept verbatim
/// in `extra` so that records survive a read/write cycle unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// The claim being attested
    pub claim: Claim,

    /// Content hash over the claim and its metadata; identifies the
    /// attestation on chain and the record in storage
    pub root_hash: String,

    /// Remaining SDK fields, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A credential as held by the wallet.
///
/// # Serialization
/// Keys are camelCase (`cTypeTitle`, `isDownloaded`) so stored records stay
/// compatible with the browser extension's storage layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Source of truth for ownership and the content hash
    pub request: CredentialRequest,

    /// User-chosen label
    pub name: String,

    /// Human-readable cType name, cached for display
    pub c_type_title: String,

    /// Identifier of the issuing party
    pub attester: String,

    pub status: AttestationStatus,

    /// UI-only marker set once the user exported the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_downloaded: Option<bool>,
}

impl Credential {
    /// Storage key of this credential, `credential:<rootHash>`.
    pub fn storage_key(&self) -> String {
        credential_key(&self.request.root_hash)
    }

    pub fn root_hash(&self) -> &str {
        &self.request.root_hash
    }

    pub fn owner(&self) -> &DidUri {
        &self.request.claim.owner
    }

    pub fn is_pending(&self) -> bool {
        self.status == AttestationStatus::Pending
    }

    /// Returns a copy with only the status replaced.
    pub fn with_status(&self, status: AttestationStatus) -> Self {
        Credential {
            status,
            ..self.clone()
        }
    }

    /// Returns a copy flagged as downloaded.
    pub fn marked_downloaded(&self) -> Self {
        Credential {
            is_downloaded: Some(true),
            ..self.clone()
        }
    }
}

/// A credential together with the claim properties chosen for disclosure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedCredential {
    pub credential: Credential,

    /// Names of the claim properties the holder agreed to reveal
    pub shared_contents: Vec<String>,
}

impl SharedCredential {
    /// Shares every property of the credential's claim.
    pub fn all_contents(credential: Credential) -> Self {
        let shared_contents = credential.request.claim.contents.keys().cloned().collect();
        SharedCredential {
            credential,
            shared_contents,
        }
    }

    /// Claim properties that are actually disclosed, in claim order.
    ///
    /// Names that do not exist in the claim are ignored.
    pub fn disclosed(&self) -> Map<String, Value> {
        self.credential
            .request
            .claim
            .contents
            .iter()
            .filter(|(name, _)| self.shared_contents.iter().any(|shared| shared == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
