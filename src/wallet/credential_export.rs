// src/wallet/credential_export.rs
//! Credential downloads.
//!
//! Turns a stored credential into a `{ name, url }` artifact whose URL is a
//! base64 JSON data URI, the format the extension hands to the browser's
//! download prompt. Producing a download has no effect on the store.

use crate::error::ExportError;
use crate::models::credential::Credential;
use crate::utils::serialization::json_to_base64;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Scheme and media type prefix of every download URL.
pub const DATA_URI_PREFIX: &str = "data:text/json;base64,";

/// A downloadable credential artifact.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialDownload {
    /// Suggested file name, `<name>-<cTypeTitle>.json`
    pub name: String,

    /// `data:text/json;base64,<payload>` with the full credential as JSON
    pub url: String,
}

impl CredentialDownload {
    /// Decoded JSON bytes carried by the data URI.
    pub fn payload(&self) -> Result<Vec<u8>, ExportError> {
        let encoded = self
            .url
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or(ExportError::InvalidDataUri)?;
        Ok(base64::decode(encoded)?)
    }
}

/// Builds the download artifact for a credential.
///
/// Name collisions between credentials are not resolved here.
pub fn credential_download(credential: &Credential) -> Result<CredentialDownload, ExportError> {
    let name = format!("{}-{}.json", credential.name, credential.c_type_title);
    let url = format!("{DATA_URI_PREFIX}{}", json_to_base64(credential)?);
    Ok(CredentialDownload { name, url })
}

/// Writes the download into `dir` under its suggested name.
///
/// # Errors
/// Fails if the name contains path components, the URL is not a base64 JSON
/// data URI, or the file cannot be written. Existing files are overwritten.
pub async fn write_download(
    download: &CredentialDownload,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let file_name = Path::new(&download.name)
        .file_name()
        .filter(|name| *name == download.name.as_str())
        .ok_or_else(|| ExportError::InvalidFileName(download.name.clone()))?;

    let payload = download.payload()?;
    fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    fs::write(&path, payload).await?;
    Ok(path)
}
