// src/blockchain/attestation_client.rs
//! HTTP client for attestation lookups.
//!
//! Queries an attestation endpoint (a chain indexer or a light proxy in front
//! of a KILT node) by credential root hash:
//! - `GET <base>/attestations/<rootHash>`
//! - `200` with a JSON [`Attestation`] body: the attestation exists
//! - `404`: no attestation yet
//! - anything else: [`ChainError::UnexpectedStatus`]

use crate::error::ChainError;
use crate::services::status_resolver::{Attestation, AttestationSource};
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;

/// Attestation lookups over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAttestationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAttestationClient {
    /// Creates a client for the endpoint at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Endpoint root, with or without a trailing slash
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        HttpAttestationClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn attestation_url(&self, root_hash: &str) -> String {
        format!("{}/attestations/{}", self.base_url, root_hash)
    }
}

#[async_trait]
impl AttestationSource for HttpAttestationClient {
    async fn attestation(&self, root_hash: &str) -> Result<Option<Attestation>, ChainError> {
        let url = self.attestation_url(root_hash);
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(ChainError::UnexpectedStatus {
                root_hash: root_hash.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
