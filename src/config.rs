// src/config.rs
// Environment-driven settings for the server and the resolution policy.

use std::path::PathBuf;
use std::time::Duration;

use crate::brain::DEFAULT_BASE_URL;
use crate::error::ConfigError;
use crate::link::{GOV_MARKER, ORG_MARKER};
use crate::matcher::MatchPolicy;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIER_MODELS: &str = "gpt-3.5-turbo,gpt-4o";
pub const DEFAULT_TIER_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_FALLBACK_URL: &str = "https://www.usa.gov/";

/// One escalation step: which model to ask and which link markers it may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTier {
    pub model: String,
    pub trusted_markers: Vec<String>,
}

impl ModelTier {
    pub fn new(model: &str, trusted_markers: &[&str]) -> Self {
        Self {
            model: model.to_string(),
            trusted_markers: trusted_markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Builds tiers from model names. Every tier but the last is `.gov`-only.
pub fn tiers_from_models(models: &[&str]) -> Vec<ModelTier> {
    let last = models.len().saturating_sub(1);
    models
        .iter()
        .enumerate()
        .map(|(i, model)| {
            if i == last {
                ModelTier::new(model, &[GOV_MARKER, ORG_MARKER])
            } else {
                ModelTier::new(model, &[GOV_MARKER])
            }
        })
        .collect()
}

/// Knobs of the match-then-escalate policy.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub policy: MatchPolicy,
    pub tiers: Vec<ModelTier>,
    pub tier_timeout: Duration,
    pub fallback_url: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        let models: Vec<&str> = DEFAULT_TIER_MODELS.split(',').collect();
        Self {
            policy: MatchPolicy::default(),
            tiers: tiers_from_models(&models),
            tier_timeout: Duration::from_secs(DEFAULT_TIER_TIMEOUT_SECS),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub curated_path: Option<PathBuf>,
    pub query_log_path: Option<PathBuf>,
    pub resolver: ResolverSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through `lookup`, so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("GOVLINK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get("GOVLINK_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "GOVLINK_PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let models_raw = get("GOVLINK_TIER_MODELS").unwrap_or_else(|| DEFAULT_TIER_MODELS.to_string());
        let models: Vec<&str> = models_raw
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "GOVLINK_TIER_MODELS",
                value: models_raw.clone(),
                reason: "at least one model is required".to_string(),
            });
        }

        let tier_timeout = match get("GOVLINK_TIER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    key: "GOVLINK_TIER_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "GOVLINK_TIER_TIMEOUT_SECS",
                        value: raw,
                        reason: "timeout must be positive".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIER_TIMEOUT_SECS),
        };

        let policy = match get("GOVLINK_MATCH_POLICY") {
            Some(raw) => raw.parse::<MatchPolicy>().map_err(|reason| ConfigError::InvalidValue {
                key: "GOVLINK_MATCH_POLICY",
                value: raw.clone(),
                reason,
            })?,
            None => MatchPolicy::default(),
        };

        let fallback_url = get("GOVLINK_FALLBACK_URL").unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_string());

        Ok(Self {
            host,
            port,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            curated_path: get("GOVLINK_CURATED_PATH").map(PathBuf::from),
            query_log_path: get("GOVLINK_QUERY_LOG_PATH").map(PathBuf::from),
            resolver: ResolverSettings {
                policy,
                tiers: tiers_from_models(&models),
                tier_timeout,
                fallback_url,
            },
        })
    }
}
