use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_API_VERSION: &str = "2023-10-16";
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/webhook";
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;
pub const HEALTH_PATH: &str = "/healthz";
const DEFAULT_BIND: &str = "0.0.0.0:8090";

/// Process-wide settings, built once at startup and shared read-only by handlers.
#[derive(Debug)]
pub struct WebhookConfig {
    /// API credential for outbound provider calls. Verification does not use it.
    pub api_key: SecretString,
    pub webhook_secret: SecretString,
    pub api_version: String,
    pub webhook_path: String,
    pub tolerance: Duration,
    pub addr: SocketAddr,
}

impl WebhookConfig {
    /// Config with the two secrets set and every other field at its default.
    pub fn new(api_key: impl Into<SecretString>, webhook_secret: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            webhook_secret: webhook_secret.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            tolerance: Duration::from_secs(DEFAULT_TOLERANCE_SECS),
            addr: SocketAddr::from(([0, 0, 0, 0], 8090)),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, "STRIPE_SECRET_KEY")?;
        let webhook_secret = required(&lookup, "STRIPE_WEBHOOK_SECRET")?;
        let api_version = optional(&lookup, "STRIPE_API_VERSION")
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let webhook_path = optional(&lookup, "STRIPE_WEBHOOK_PATH")
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            bail!("STRIPE_WEBHOOK_PATH must start with '/', got {webhook_path:?}");
        }
        if webhook_path == HEALTH_PATH {
            bail!("STRIPE_WEBHOOK_PATH must not shadow {HEALTH_PATH}");
        }
        // The router would read these as captures or wildcards.
        if webhook_path.contains([':', '{', '}', '*']) {
            bail!("STRIPE_WEBHOOK_PATH must be a literal path, got {webhook_path:?}");
        }

        let tolerance_secs = match optional(&lookup, "STRIPE_WEBHOOK_TOLERANCE_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("STRIPE_WEBHOOK_TOLERANCE_SECS must be whole seconds, got {raw:?}")
            })?,
            None => DEFAULT_TOLERANCE_SECS,
        };

        let addr: SocketAddr = optional(&lookup, "BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .context("invalid BIND address")?;

        Ok(Self {
            api_key,
            webhook_secret,
            api_version,
            webhook_path,
            tolerance: Duration::from_secs(tolerance_secs),
            addr,
        })
    }

    /// `live`, `test` or `unknown`, judged from the API key prefix.
    pub fn key_mode(&self) -> &'static str {
        let key = self.api_key.expose_secret();
        if key.starts_with("sk_live_") || key.starts_with("rk_live_") {
            "live"
        } else if key.starts_with("sk_test_") || key.starts_with("rk_test_") {
            "test"
        } else {
            "unknown"
        }
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, key) {
        Some(value) => Ok(SecretString::from(value)),
        None => bail!("{key} required"),
    }
}
