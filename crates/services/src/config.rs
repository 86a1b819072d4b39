use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_SITE_NAME: &str = "Octagnosis personality test";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the scoring service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoringConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// Retry policy for result reads. Submissions are never retried.
    pub result_retry: RetryPolicy,
}

impl ScoringConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            result_retry: RetryPolicy::default(),
        }
    }

    /// Reads `OCTA_API_BASE_URL`, `OCTA_REQUEST_TIMEOUT_SECS`,
    /// `OCTA_RESULT_MAX_RETRIES` and `OCTA_RESULT_RETRY_DELAY_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ScoringConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = url_var(&lookup, "OCTA_API_BASE_URL", DEFAULT_API_BASE_URL)?;
        let timeout_secs = number_var(&lookup, "OCTA_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let defaults = RetryPolicy::default();
        let max_retries = number_var(&lookup, "OCTA_RESULT_MAX_RETRIES", defaults.max_retries)?;
        let delay_secs = number_var(
            &lookup,
            "OCTA_RESULT_RETRY_DELAY_SECS",
            defaults.delay.as_secs(),
        )?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            result_retry: RetryPolicy::fixed(max_retries, Duration::from_secs(delay_secs)),
        })
    }
}

/// Where shared links point and how the site is named in share cards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareConfig {
    pub public_origin: Url,
    pub site_name: String,
}

impl ShareConfig {
    #[must_use]
    pub fn new(public_origin: Url, site_name: impl Into<String>) -> Self {
        Self {
            public_origin,
            site_name: site_name.into(),
        }
    }

    /// Reads `OCTA_PUBLIC_ORIGIN` and `OCTA_SITE_NAME`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` for an unparsable origin.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` for an unparsable origin.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let public_origin = url_var(&lookup, "OCTA_PUBLIC_ORIGIN", DEFAULT_PUBLIC_ORIGIN)?;
        let site_name = lookup("OCTA_SITE_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());
        Ok(Self {
            public_origin,
            site_name,
        })
    }
}

fn url_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<Url, ConfigError> {
    let value = lookup(var)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    let url = Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: value.clone(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl { var, value });
    }
    Ok(url)
}

fn number_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
