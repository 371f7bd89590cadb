// src/config.rs
//! Runtime configuration.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional config file (`sporran.toml` in the working directory, or
//!    the path given on the command line)
//! 3. `SPORRAN_*` environment variables, including those loaded from `.env`
//!
//! ## Keys
//! - `storage_path`: JSON file holding wallet storage (default `sporran-storage.json`)
//! - `attestation_endpoint`: base URL for attestation lookups (optional)
//! - `log_level`: default log filter when `RUST_LOG` is unset (default `info`)

use crate::error::ConfigError;
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "sporran";
pub const ENV_PREFIX: &str = "SPORRAN";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub storage_path: PathBuf,

    #[serde(default)]
    pub attestation_endpoint: Option<String>,

    pub log_level: String,
}

impl Settings {
    /// Loads settings, reading `file` if given, `sporran.*` otherwise.
    ///
    /// # Errors
    /// Fails if an explicitly named file is missing, any file is malformed,
    /// or a value has the wrong type.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("storage_path", "sporran-storage.json")?
            .set_default("log_level", "info")?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
