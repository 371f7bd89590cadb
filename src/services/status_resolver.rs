// src/services/status_resolver.rs
//! Credential status resolution against chain state.
//!
//! A credential starts out `pending` when its signing flow completes. This
//! module looks up the on-chain attestation for the credential's root hash
//! and moves it to `attested` or `revoked` once one exists. Checks are
//! triggered by the caller observing a credential, never by polling.

use crate::error::{ChainError, ResolveError, StoreError};
use crate::models::credential::{AttestationStatus, Credential};
use crate::wallet::credential_storage::CredentialStore;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// On-chain attestation record for a credential root hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub revoked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attester: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_type_hash: Option<String>,
}

/// Read access to attestations on chain.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    /// Looks up the attestation for `root_hash`; `None` if none exists yet.
    async fn attestation(&self, root_hash: &str) -> Result<Option<Attestation>, ChainError>;
}

/// Result of checking one credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The credential was not pending; the chain was not queried.
    NotPending,
    /// No attestation on chain yet.
    StillPending,
    /// The credential was saved with this new status.
    Updated(AttestationStatus),
}

/// Tally of a batch check over all pending credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub checked: usize,
    pub attested: usize,
    pub revoked: usize,
    pub still_pending: usize,
    pub failed: usize,
}

/// Moves pending credentials to their on-chain status.
pub struct StatusResolver {
    store: Arc<CredentialStore>,
    chain: Arc<dyn AttestationSource>,
}

impl StatusResolver {
    pub fn new(store: Arc<CredentialStore>, chain: Arc<dyn AttestationSource>) -> Self {
        StatusResolver { store, chain }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Checks one credential.
    ///
    /// # Behavior
    /// - Not pending: nothing happens
    /// - No attestation on chain: stays pending, nothing is written
    /// - Attestation with `revoked = true`: saved as `revoked`
    /// - Any other attestation: saved as `attested`
    ///
    /// All other fields are written back unchanged.
    ///
    /// # Errors
    /// Chain or store failures propagate; the stored credential then stays
    /// pending.
    pub async fn check_pending(
        &self,
        credential: &Credential,
    ) -> Result<CheckOutcome, ResolveError> {
        if !credential.is_pending() {
            return Ok(CheckOutcome::NotPending);
        }

        let Some(attestation) = self.chain.attestation(credential.root_hash()).await? else {
            debug!("{} not attested yet", credential.storage_key());
            return Ok(CheckOutcome::StillPending);
        };

        let status = if attestation.revoked {
            AttestationStatus::Revoked
        } else {
            AttestationStatus::Attested
        };
        self.store.save_credential(&credential.with_status(status)).await?;
        info!("{} is now {status}", credential.storage_key());
        Ok(CheckOutcome::Updated(status))
    }

    /// Checks every stored pending credential concurrently.
    ///
    /// A failing check is logged and counted; it does not abort the others.
    ///
    /// # Errors
    /// Only failures to enumerate the stored credentials.
    pub async fn resolve_all_pending(&self) -> Result<ResolveSummary, StoreError> {
        let pending: Vec<Credential> = self
            .store
            .get_all_credentials()
            .await?
            .into_iter()
            .filter(Credential::is_pending)
            .collect();

        let outcomes = join_all(pending.iter().map(|c| self.check_pending(c))).await;

        let mut summary = ResolveSummary {
            checked: pending.len(),
            ..ResolveSummary::default()
        };
        for (credential, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(CheckOutcome::Updated(AttestationStatus::Revoked)) => summary.revoked += 1,
                Ok(CheckOutcome::Updated(_)) => summary.attested += 1,
                Ok(_) => summary.still_pending += 1,
                Err(e) => {
                    warn!("status check for {} failed: {e}", credential.storage_key());
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}

/// Runs a status check whenever the observed credential changes.
///
/// Holds the last credential it saw; observing an identical value again does
/// nothing, so a view can call [`PendingCheck::observe`] on every render. A
/// failed check forgets the observation so the next one retries.
pub struct PendingCheck {
    resolver: Arc<StatusResolver>,
    last_seen: Option<Credential>,
}

impl PendingCheck {
    pub fn new(resolver: Arc<StatusResolver>) -> Self {
        PendingCheck {
            resolver,
            last_seen: None,
        }
    }

    /// Returns `None` when the observation did not change, otherwise the
    /// outcome of the check it triggered.
    pub async fn observe(
        &mut self,
        credential: Option<&Credential>,
    ) -> Result<Option<CheckOutcome>, ResolveError> {
        if self.last_seen.as_ref() == credential {
            return Ok(None);
        }
        self.last_seen = credential.cloned();

        let Some(credential) = credential else {
            return Ok(None);
        };
        match self.resolver.check_pending(credential).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.last_seen = None;
                Err(e)
            }
        }
    }
}
