use anyhow::{bail, Context, Result};

/// Optional page features. Each used to be a separate copy of the page
/// script; here they are switches on one implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub charts: bool,
    pub multi_file_append: bool,
    pub category_multi_select: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            charts: true,
            multi_file_append: true,
            category_multi_select: true,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub backend_timeout_secs: u64,
    pub max_upload_mb: usize,
    pub capabilities: Capabilities,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_url: require_env("BACKEND_URL")?,
            backend_timeout_secs: optional_env("BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|| "120".to_string())
                .parse::<u64>()
                .context("BACKEND_TIMEOUT_SECS must be a whole number of seconds")?,
            max_upload_mb: optional_env("MAX_UPLOAD_MB")
                .unwrap_or_else(|| "25".to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_MB must be a whole number")?,
            capabilities: Capabilities {
                charts: flag_env("ENABLE_CHARTS", true)?,
                multi_file_append: flag_env("ENABLE_MULTI_FILE_APPEND", true)?,
                category_multi_select: flag_env("ENABLE_CATEGORY_MULTI_SELECT", true)?,
            },
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_env(key: &str, default: bool) -> Result<bool> {
    match optional_env(key) {
        Some(raw) => parse_flag(&raw).with_context(|| format!("{key} must be a boolean flag")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value '{other}'"),
    }
}
