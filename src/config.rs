use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;

/// Cross-origin policy for the token endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    /// `CORS_ALLOWED_ORIGINS=*`
    Any,
    /// Explicit allow-list. Empty means no cross-origin access.
    List(Vec<HeaderValue>),
}

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,

    // ── OAuth Provider Credentials ──────────────────────────────────────
    pub client_id: String,
    pub client_secret: String,
    /// First entry of `REDIRECT_URIS`; the callback registered with Google.
    pub redirect_uri: String,

    // ── Behavior ────────────────────────────────────────────────────────
    /// Launch the system browser on `GET /auth`.
    pub open_browser: bool,
    /// Tick of the background refresh daemon. `None` disables it.
    pub refresh_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let redirect_uris = lookup("REDIRECT_URIS")
            .context("REDIRECT_URIS is required (comma-separated callback URLs)")?;

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .context("Invalid PORT")?,
            allowed_origins: parse_origins(&lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default())?,

            client_id: lookup("CLIENT_ID").context("CLIENT_ID is required")?,
            client_secret: lookup("CLIENT_SECRET").context("CLIENT_SECRET is required")?,
            redirect_uri: first_redirect_uri(&redirect_uris)?,

            open_browser: lookup("OPEN_BROWSER").map_or(true, |v| parse_flag(&v)),
            refresh_interval: match lookup("TOKEN_REFRESH_INTERVAL_SECS") {
                Some(v) => {
                    let secs: u64 = v
                        .trim()
                        .parse()
                        .context("Invalid TOKEN_REFRESH_INTERVAL_SECS")?;
                    (secs > 0).then(|| Duration::from_secs(secs))
                }
                None => None,
            },
        })
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn first_redirect_uri(raw: &str) -> Result<String> {
    match raw.split(',').map(str::trim).find(|s| !s.is_empty()) {
        Some(uri) => Ok(uri.to_string()),
        None => bail!("REDIRECT_URIS contains no callback URL"),
    }
}

fn parse_origins(raw: &str) -> Result<AllowedOrigins> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if entries.contains(&"*") {
        return Ok(AllowedOrigins::Any);
    }

    let origins = entries
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid origin in CORS_ALLOWED_ORIGINS: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AllowedOrigins::List(origins))
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
