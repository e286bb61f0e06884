use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use reqwest::Url;
use tracing::info;

use crate::error::ConfigError;

pub const API_URL: &str = "QUOTE_CARD_API_URL";
pub const REQUEST_TIMEOUT_MS: &str = "QUOTE_CARD_REQUEST_TIMEOUT_MS";
pub const PROBE_TIMEOUT_MS: &str = "QUOTE_CARD_PROBE_TIMEOUT_MS";
pub const LEDGER_PATH: &str = "QUOTE_CARD_LEDGER_PATH";
pub const TOP_COUNT: &str = "QUOTE_CARD_TOP_COUNT";
pub const LOG: &str = "QUOTE_CARD_LOG";

const DEFAULT_API_URL: &str = "http://0.0.0.0:8000/";
const DEFAULT_REQUEST_TIMEOUT_MS: &str = "10000";
const DEFAULT_PROBE_TIMEOUT_MS: &str = "3000";
const DEFAULT_TOP_COUNT: &str = "5";
const DEFAULT_LOG: &str = "quote_card=info";

/// Runtime settings, read from `QUOTE_CARD_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: Url,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// `None` uses the platform data directory
    pub ledger_path: Option<PathBuf>,
    pub top_count: usize,
    /// Used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: try_load(&lookup, API_URL, DEFAULT_API_URL)?,
            request_timeout: Duration::from_millis(try_load(
                &lookup,
                REQUEST_TIMEOUT_MS,
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?),
            probe_timeout: Duration::from_millis(try_load(
                &lookup,
                PROBE_TIMEOUT_MS,
                DEFAULT_PROBE_TIMEOUT_MS,
            )?),
            ledger_path: lookup(LEDGER_PATH)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            top_count: try_load(&lookup, TOP_COUNT, DEFAULT_TOP_COUNT)?,
            log_filter: lookup(LOG).unwrap_or_else(|| DEFAULT_LOG.to_string()),
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}
