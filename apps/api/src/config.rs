use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Session JSON files live here.
    pub data_dir: PathBuf,
    /// Rendered reports live here.
    pub reports_dir: PathBuf,
    /// Per-call oracle/scorer timeout in seconds.
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            reports_dir: std::env::var("REPORTS_DIR")
                .unwrap_or_else(|_| "reports".to_string())
                .into(),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "6".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECONDS must be an integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
