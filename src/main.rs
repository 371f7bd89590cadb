// src/main.rs

//! # Sporran wallet - command line entry point
//!
//! Operates on the same credential storage layout as the browser extension,
//! backed by a JSON file.
//!
//! ## Environment Variables
//! - `SPORRAN_STORAGE_PATH`: (Optional) storage file (default: sporran-storage.json)
//! - `SPORRAN_ATTESTATION_ENDPOINT`: attestation lookup URL, required by `check`
//! - `SPORRAN_LOG_LEVEL`: (Optional) log filter when `RUST_LOG` is unset (default: info)

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::info;
use sporran::blockchain::attestation_client::HttpAttestationClient;
use sporran::config::Settings;
use sporran::models::credential::{credential_key, KEY_PREFIX};
use sporran::utils::serialization::serialize_pretty;
use sporran::wallet::credential_export::write_download;
use sporran::{
    credential_download, Credential, CredentialStore, DidUri, FileStorage, StatusResolver,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Sporran credential wallet.
#[derive(Parser, Debug)]
#[command(name = "sporran", version, about)]
struct Cli {
    /// Config file (default: ./sporran.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored credentials.
    List {
        /// Only credentials whose claim is about this DID
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print one credential as JSON.
    Show {
        /// Root hash or full storage key
        credential: String,
    },
    /// Store a credential read from a JSON file.
    Import { file: PathBuf },
    /// Write a credential to `<name>-<cTypeTitle>.json`.
    Export {
        credential: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Remove a credential.
    Delete { credential: String },
    /// Update pending credentials from chain state.
    Check,
}

fn to_storage_key(credential: &str) -> String {
    if credential.starts_with(KEY_PREFIX) {
        credential.to_string()
    } else {
        credential_key(credential)
    }
}

async fn find(store: &CredentialStore, credential: &str) -> anyhow::Result<Credential> {
    let key = to_storage_key(credential);
    store
        .get_credential(&key)
        .await?
        .with_context(|| format!("no credential stored under {key}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    let env = env_logger::Env::default().default_filter_or(&settings.log_level);
    env_logger::Builder::from_env(env).init();

    let storage = Arc::new(FileStorage::new(&settings.storage_path));
    info!("using storage at {}", storage.path().display());
    let store = Arc::new(CredentialStore::new(storage));

    match cli.command {
        Command::List { owner } => {
            let credentials = match owner {
                Some(owner) => {
                    let did: DidUri = owner.parse()?;
                    store.identity_credentials(&did).await?
                }
                None => store.get_all_credentials().await?,
            };
            for c in &credentials {
                println!("{}\t{}\t{}\t{}", c.root_hash(), c.status, c.name, c.c_type_title);
            }
        }
        Command::Show { credential } => {
            let credential = find(&store, &credential).await?;
            println!("{}", serialize_pretty(&credential)?);
        }
        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let credential: Credential = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a credential", file.display()))?;
            store.save_credential(&credential).await?;
            println!("stored {}", credential.storage_key());
        }
        Command::Export { credential, out } => {
            let credential = find(&store, &credential).await?;
            let download = credential_download(&credential)?;
            let path = write_download(&download, &out).await?;
            store.save_credential(&credential.marked_downloaded()).await?;
            println!("wrote {}", path.display());
        }
        Command::Delete { credential } => {
            let credential = find(&store, &credential).await?;
            store.delete_credential(&credential).await?;
            println!("deleted {}", credential.storage_key());
        }
        Command::Check => {
            let Some(endpoint) = settings.attestation_endpoint.as_deref() else {
                bail!("attestation_endpoint is not configured");
            };
            let chain = Arc::new(HttpAttestationClient::new(endpoint));
            let resolver = StatusResolver::new(store, chain);
            let summary = resolver.resolve_all_pending().await?;
            println!(
                "checked {}: {} attested, {} revoked, {} pending, {} failed",
                summary.checked,
                summary.attested,
                summary.revoked,
                summary.still_pending,
                summary.failed
            );
        }
    }

    Ok(())
}
