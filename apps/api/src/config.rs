use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Bearer token guarding the admin list views. Unset means open.
    pub admin_token: Option<String>,
    pub payment_webhook_secret: Option<String>,
    pub newsletter_sync_url: Option<String>,
    pub newsletter_sync_api_key: Option<String>,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            admin_token: optional_env("ADMIN_TOKEN"),
            payment_webhook_secret: optional_env("PAYMENT_WEBHOOK_SECRET"),
            newsletter_sync_url: optional_env("NEWSLETTER_SYNC_URL"),
            newsletter_sync_api_key: optional_env("NEWSLETTER_SYNC_API_KEY"),
            run_migrations: parse_flag(std::env::var("RUN_MIGRATIONS").ok().as_deref()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank values count as unset so `.env` templates can leave keys empty.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
impl Config {
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/founders_test".to_string(),
            data_dir,
            port: 0,
            rust_log: "debug".to_string(),
            admin_token: None,
            payment_webhook_secret: None,
            newsletter_sync_url: None,
            newsletter_sync_api_key: None,
            run_migrations: false,
        }
    }
}
