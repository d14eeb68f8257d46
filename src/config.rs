//! Service configuration from environment variables.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::context::{DEFAULT_MAX_FILE_BYTES, DEFAULT_STANDARDS_PATH};
use crate::patch::DEFAULT_MODELS;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ALIASES: &str = "@bot,/bot";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Configuration errors. Reported at startup; the process exits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the service reads from its environment.
#[derive(Clone)]
pub struct Config {
    pub app_id: u64,
    /// PKCS#8 PEM, possibly with escaped newlines.
    pub private_key: String,
    pub webhook_secret: String,
    pub anthropic_api_key: String,
    /// Overrides the repository's reported default branch.
    pub default_branch: Option<String>,
    /// Deadline for every outbound call.
    pub request_timeout: Duration,
    /// Activation phrases, most preferred first.
    pub aliases: Vec<String>,
    /// Model ids, most preferred first.
    pub models: Vec<String>,
    pub standards_path: String,
    pub max_file_bytes: usize,
    pub github_api_url: Option<String>,
    pub anthropic_api_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let app_id = parse_number(required("GITHUB_APP_ID")?, "GITHUB_APP_ID")?;
        let private_key = required("GITHUB_APP_PRIVATE_KEY")?;
        let webhook_secret = required("GITHUB_WEBHOOK_SECRET")?;
        let anthropic_api_key = required("ANTHROPIC_API_KEY")?;

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_number(raw, "REQUEST_TIMEOUT_SECS")?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "REQUEST_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let aliases = split_list(&get("BOT_ALIASES").unwrap_or_else(|| DEFAULT_ALIASES.to_string()));
        let models = match get("MODEL_PRIORITY") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        if models.is_empty() {
            return Err(ConfigError::Invalid {
                name: "MODEL_PRIORITY",
                reason: "must name at least one model".to_string(),
            });
        }

        let max_file_bytes = match get("MAX_FILE_BYTES") {
            Some(raw) => parse_number(raw, "MAX_FILE_BYTES")?,
            None => DEFAULT_MAX_FILE_BYTES,
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e| ConfigError::Invalid {
            name: "BIND_ADDR",
            reason: format!("`{}`: {}", bind_raw, e),
        })?;

        Ok(Config {
            app_id,
            private_key,
            webhook_secret,
            anthropic_api_key,
            default_branch: get("DEFAULT_BRANCH").map(|b| b.trim().to_string()),
            request_timeout,
            aliases,
            models,
            standards_path: get("STANDARDS_PATH")
                .unwrap_or_else(|| DEFAULT_STANDARDS_PATH.to_string()),
            max_file_bytes,
            github_api_url: get("GITHUB_API_URL"),
            anthropic_api_url: get("ANTHROPIC_API_URL"),
            bind_addr,
        })
    }
}

fn parse_number<T>(raw: String, name: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: format!("`{}`: {}", raw.trim(), e),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("private_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("anthropic_api_key", &"<redacted>")
            .field("default_branch", &self.default_branch)
            .field("request_timeout", &self.request_timeout)
            .field("aliases", &self.aliases)
            .field("models", &self.models)
            .field("standards_path", &self.standards_path)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("github_api_url", &self.github_api_url)
            .field("anthropic_api_url", &self.anthropic_api_url)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
