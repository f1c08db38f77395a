//! Server configuration
//!
//! Layered as built-in defaults, then an optional `campaign-server.{toml,yaml,json}`
//! in the working directory, then environment variables.

use anyhow::{Context, Result};
use config::{Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/cam";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_FALLBACK_FILE: &str = "fallback_data.json";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub fallback_file: PathBuf,
    pub db_max_connections: u32,
    /// Pool acquire timeout; the driver default applies when unset.
    #[serde(default)]
    pub db_acquire_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            fallback_file: PathBuf::from(DEFAULT_FALLBACK_FILE),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            db_acquire_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        info!("Loading configuration from environment...");
        Self::from_sources(Environment::default())
    }

    fn from_sources(env: Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("fallback_file", DEFAULT_FALLBACK_FILE)?
            .set_default("db_max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .add_source(File::with_name("campaign-server").required(false))
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// The URL with any password masked, for logging.
    pub fn redacted_database_url(&self) -> String {
        match (self.database_url.find("://"), self.database_url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let credentials = &self.database_url[scheme_end + 3..at];
                match credentials.find(':') {
                    Some(colon) => format!(
                        "{}{}:***{}",
                        &self.database_url[..scheme_end + 3],
                        &credentials[..colon],
                        &self.database_url[at..]
                    ),
                    None => self.database_url.clone(),
                }
            }
            _ => self.database_url.clone(),
        }
    }
}
