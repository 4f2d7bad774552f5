//! Dashboard configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. Built-in defaults (documented in `config/dashboard.toml`).
//! 2. An optional TOML file.
//! 3. Environment variables (`CRIME_DASHBOARD_API_URL`,
//!    `CRIME_DASHBOARD_PAGE_SIZE`).

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use crime_dashboard_client::http::ClientConfig;
use crime_dashboard_client::retry::RetryPolicy;
use crime_dashboard_models::HeatPoint;
use serde::Deserialize;

use crate::DashboardError;

/// Environment variable overriding [`DashboardConfig::api_base_url`].
pub const API_URL_ENV: &str = "CRIME_DASHBOARD_API_URL";

/// Environment variable overriding [`DashboardConfig::page_size`].
pub const PAGE_SIZE_ENV: &str = "CRIME_DASHBOARD_PAGE_SIZE";

/// Reference configuration file shipped with the crate.
pub const REFERENCE_CONFIG: &str = include_str!("../config/dashboard.toml");

/// Runtime configuration of the dashboard controller and its HTTP client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the analytics service.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries for transient transport failures.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Upper bound for the trend analysis request, in seconds.
    pub trend_timeout_secs: u64,
    /// Initial table page size.
    pub page_size: NonZeroUsize,
    /// Number of crime types shown in the distribution chart.
    pub type_chart_limit: usize,
    /// Map point shown when no heat map data is available.
    pub fallback_point: HeatPoint,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            request_timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 500,
            trend_timeout_secs: 30,
            page_size: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            type_chart_limit: 10,
            fallback_point: HeatPoint::new(41.8781, -87.6298),
        }
    }
}

impl DashboardConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Toml`] if the document is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, DashboardError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads the configuration from `path` (if given) and applies the
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the file cannot be read or parsed, or
    /// an environment override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if the page size override is not
    /// a positive integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(size) = lookup(PAGE_SIZE_ENV) {
            self.page_size = size
                .trim()
                .parse()
                .map_err(|_| DashboardError::Config {
                    message: format!("{PAGE_SIZE_ENV} must be a positive integer, got {size:?}"),
                })?;
        }
        Ok(())
    }

    /// Upper bound for the trend analysis request.
    #[must_use]
    pub const fn trend_timeout(&self) -> Duration {
        Duration::from_secs(self.trend_timeout_secs)
    }

    /// Settings for the HTTP client.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_config_matches_defaults() {
        let parsed = DashboardConfig::from_toml_str(REFERENCE_CONFIG).unwrap();
        assert_eq!(parsed, DashboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed = DashboardConfig::from_toml_str("page_size = 25\n").unwrap();
        assert_eq!(parsed.page_size.get(), 25);
        assert_eq!(parsed.trend_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(DashboardConfig::from_toml_str("page_size = 0\n").is_err());
    }

    #[test]
    fn environment_overrides_apply() {
        let mut config = DashboardConfig::default();
        config
            .apply_overrides(|key| match key {
                API_URL_ENV => Some("http://example.test/api".to_string()),
                PAGE_SIZE_ENV => Some("50".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.api_base_url, "http://example.test/api");
        assert_eq!(config.page_size.get(), 50);
        assert_eq!(config.client_config().retry.max_retries, 2);
    }

    #[test]
    fn invalid_page_size_override_fails() {
        let mut config = DashboardConfig::default();
        let err = config
            .apply_overrides(|key| (key == PAGE_SIZE_ENV).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Config { .. }));
    }
}
