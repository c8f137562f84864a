use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::sheets::client::SheetsAuth;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheet_id: String,
    pub sheet_name: String,
    pub sheets_api_base: String,
    pub sheets_auth: SheetsAuth,
    pub sheets_timeout: Duration,
    /// Freshness window for the job-description cache.
    pub sheet_cache_ttl: Duration,
    pub baseline_path: PathBuf,
    pub overlay_path: PathBuf,
    pub generator_program: String,
    pub generator_script: Option<String>,
    pub generator_output_path: PathBuf,
    pub generation_timeout: Duration,
    pub dispatch_program: String,
    pub dispatch_script: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let sheets_auth = match (optional_env("GOOGLE_SHEETS_TOKEN"), optional_env("GOOGLE_API_KEY")) {
            (Some(token), _) => SheetsAuth::BearerToken(token),
            (None, Some(key)) => SheetsAuth::ApiKey(key),
            (None, None) => SheetsAuth::None,
        };

        Ok(Config {
            sheet_id: require_env("GOOGLE_SHEET_ID")?,
            sheet_name: env_or("GOOGLE_SHEET_NAME", "Sheet1"),
            sheets_api_base: env_or("SHEETS_API_BASE", "https://sheets.googleapis.com"),
            sheets_auth,
            sheets_timeout: secs_env("SHEETS_TIMEOUT_SECS", 30)?,
            sheet_cache_ttl: secs_env("SHEET_CACHE_TTL_SECS", 60)?,
            baseline_path: PathBuf::from(env_or("BASELINE_PATH", "email_content_mapping.json")),
            overlay_path: PathBuf::from(env_or(
                "OVERLAY_PATH",
                "email_content_mapping_updated.json",
            )),
            generator_program: env_or("GENERATOR_PROGRAM", "python"),
            generator_script: script_env("GENERATOR_SCRIPT", "Email_Tailor_single.py"),
            generator_output_path: PathBuf::from(env_or(
                "GENERATOR_OUTPUT_PATH",
                "email_content_mapping.json",
            )),
            generation_timeout: secs_env("GENERATION_TIMEOUT_SECS", 180)?,
            dispatch_program: env_or("DISPATCH_PROGRAM", "node"),
            dispatch_script: script_env("DISPATCH_SCRIPT", "sendEmails.js"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// An empty value disables the script argument so the program is run on its own.
fn script_env(key: &str, default: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(v),
        Err(_) => Some(default.to_string()),
    }
}

fn secs_env(key: &str, default: u64) -> Result<Duration> {
    let secs = match optional_env(key) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
