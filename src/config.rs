//! Application configuration loading from environment variables.
//!
//! All configuration is loaded from the environment at startup via standard `std::env::var`,
//! after `dotenvy` has merged an optional `.env` file into the process environment.
//!
//! # Environment Variables
//!
//! ## Required Variables
//! - `TELEGRAM_BOT_TOKEN`: Bot API credential used for the document relay
//! - `TELEGRAM_CHAT_ID`: Channel or chat that receives submissions (e.g. `@channel`)
//!
//! ## Optional Variables
//! - `RUST_LOG`: Logging level (default: "info,ticket_relay=debug,tower_http=debug")
//! - `HOST`: Server bind address (default: "0.0.0.0")
//! - `PORT`: Server port (default: 3000)
//! - `TELEGRAM_API_BASE`: Bot API base URL (default: "https://api.telegram.org")
//! - `RELAY_TIMEOUT_SECONDS`: Upper bound for one relay call (default: 30)
//! - `UPLOAD_DIR`: Scratch directory for uploads in flight (default: "uploads")
//! - `ALLOWED_ORIGINS`: Comma-separated CORS allow-list
//! - `FRONTEND_ORIGIN`: Origin echoed by the submission route (default: "http://127.0.0.1:5500")
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests per client per window (default: 100)
//! - `RATE_LIMIT_WINDOW_SECONDS`: Rate limit window length (default: 3600)
//! - `REDIS_URL`: Use Redis for rate-limit counters instead of process memory
//! - `TRUST_PROXY_HEADERS`: Identify clients by `X-Forwarded-For` / `X-Real-IP` (default: false)

use http::HeaderValue;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost,http://localhost:3000,http://127.0.0.1:5500";

/// Bot API credential. Never printed, not even through `Debug`.
#[derive(Clone)]
pub struct BotToken(String);

impl BotToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken([redacted])")
    }
}

/// Complete server configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Telegram bot credential
    pub bot_token: BotToken,

    /// Target chat for relayed documents
    pub chat_id: String,

    /// Telegram Bot API base URL, without trailing slash
    pub telegram_api_base: String,

    /// Upper bound for a single outbound relay call
    pub relay_timeout_seconds: u64,

    /// Scratch directory for uploads in flight
    pub upload_dir: PathBuf,

    /// Origins admitted by the ingress policy
    pub allowed_origins: Vec<String>,

    /// Origin the submission route advertises in its own CORS headers
    pub frontend_origin: String,

    /// Requests allowed per client within one window
    pub rate_limit_max_requests: u32,

    /// Rate limit window length in seconds
    pub rate_limit_window_seconds: u64,

    /// Redis URL for shared rate-limit counters
    pub redis_url: Option<String>,

    /// Whether proxy headers identify the client for rate limiting
    pub trust_proxy_headers: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value cannot be parsed, or an
    /// origin is not a valid header value.
    pub fn from_env() -> anyhow::Result<Self> {
        let allowed_origins =
            parse_origin_list(&env_or("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS.to_string())?)?;
        let frontend_origin = env_or("FRONTEND_ORIGIN", "http://127.0.0.1:5500".to_string())?;
        ensure_header_value("FRONTEND_ORIGIN", &frontend_origin)?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 3000)?,
            bot_token: BotToken::new(env_required("TELEGRAM_BOT_TOKEN")?),
            chat_id: env_required("TELEGRAM_CHAT_ID")?,
            telegram_api_base: env_or(
                "TELEGRAM_API_BASE",
                "https://api.telegram.org".to_string(),
            )?
            .trim_end_matches('/')
            .to_string(),
            relay_timeout_seconds: env_or("RELAY_TIMEOUT_SECONDS", 30)?,
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads".to_string())?),
            allowed_origins,
            frontend_origin,
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window_seconds: env_or("RATE_LIMIT_WINDOW_SECONDS", 3600)?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            trust_proxy_headers: env_or("TRUST_PROXY_HEADERS", false)?,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks and validating each entry.
///
/// # Errors
///
/// Returns an error if an entry cannot be used as an HTTP header value.
pub fn parse_origin_list(raw: &str) -> anyhow::Result<Vec<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            ensure_header_value("ALLOWED_ORIGINS", origin)?;
            Ok(origin.to_string())
        })
        .collect()
}

fn ensure_header_value(key: &str, value: &str) -> anyhow::Result<()> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("Invalid origin in {}: {:?} ({})", key, value, e))
}

/// Load a required environment variable.
///
/// # Errors
///
/// Returns an error if the variable is not set or is blank.
fn env_required(key: &str) -> anyhow::Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {}", key))
}

/// Load an environment variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
