use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;

const DEFAULT_REFERENCE_TABLE_PATH: &str = "data/processed/occupation_career_clusters.json";
const DEFAULT_DESCRIPTIONS_PATH: &str = "data/processed/occupation_descriptions.json";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub assistant_id: String,
    pub openai_base_url: String,
    pub reference_table_path: PathBuf,
    pub descriptions_path: PathBuf,
    /// Upper bound on one agent call, including run polling.
    pub agent_timeout: Duration,
    pub agent_poll_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            openai_api_key: require("OPENAI_API_KEY")?,
            assistant_id: require("ASSISTANT_ID")
                .context("Create an assistant with file search over the O*NET data and set ASSISTANT_ID")?,
            openai_base_url: or_default("OPENAI_BASE_URL", DEFAULT_API_BASE),
            reference_table_path: or_default("REFERENCE_TABLE_PATH", DEFAULT_REFERENCE_TABLE_PATH)
                .into(),
            descriptions_path: or_default("DESCRIPTIONS_PATH", DEFAULT_DESCRIPTIONS_PATH).into(),
            agent_timeout: Duration::from_secs(
                or_default("AGENT_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("AGENT_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            agent_poll_interval: Duration::from_millis(
                or_default("AGENT_POLL_INTERVAL_MS", "1000")
                    .parse::<u64>()
                    .context("AGENT_POLL_INTERVAL_MS must be a whole number of milliseconds")?,
            ),
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}
