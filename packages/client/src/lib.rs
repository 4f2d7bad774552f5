#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the crime analytics service.
//!
//! The dashboard talks to the service only through the
//! [`RemoteDataService`] trait. [`http::HttpDataService`] is the `reqwest`
//! implementation; tests and alternative front ends can substitute their
//! own.

pub mod http;
pub mod retry;
pub mod sanitize;

use async_trait::async_trait;
use crime_dashboard_models::{
    ClusterResult, CrimeRecord, HeatPoint, PredictionResult, SummaryStats, TimeSeriesPoint,
    TrendReport,
};

/// Errors that can occur while talking to the analytics service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Final response status.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// The response body did not have the expected shape.
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Client construction failed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl ClientError {
    /// Whether the failure is a payload problem rather than a transport one.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Whether the transport gave up waiting for the service.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Query-string parameters for a filtered request.
///
/// Parameters keep insertion order; only parameters that were actually
/// pushed are sent, so an unset filter never appears as an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    params: Vec<(&'static str, String)>,
}

impl FilterQuery {
    /// Creates an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.params.push((key, value.into()));
    }

    /// The parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Value of the parameter named `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// The analytics service endpoints the dashboard consumes.
///
/// Implementations return the parsed payload or a [`ClientError`]; they do
/// not substitute defaults. Degrading a view on failure is the caller's
/// job.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// `GET /years`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn years(&self) -> Result<Vec<String>, ClientError>;

    /// `GET /crime-types`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn crime_types(&self) -> Result<Vec<String>, ClientError>;

    /// `GET /districts`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn districts(&self) -> Result<Vec<String>, ClientError>;

    /// `GET /crime-data?{year,type,district}`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn crime_data(&self, query: &FilterQuery) -> Result<Vec<CrimeRecord>, ClientError>;

    /// `GET /heatmap-data?{year,type,district}`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn heatmap_data(&self, query: &FilterQuery) -> Result<Vec<HeatPoint>, ClientError>;

    /// `GET /crime-summary`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn crime_summary(&self) -> Result<SummaryStats, ClientError>;

    /// `GET /time-series?{year,type,district}`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn time_series(&self, query: &FilterQuery)
    -> Result<Vec<TimeSeriesPoint>, ClientError>;

    /// `GET /clusters?{year,type}`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn clusters(&self, query: &FilterQuery) -> Result<ClusterResult, ClientError>;

    /// `GET /arrest-prediction?{year,type}`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn arrest_prediction(&self, query: &FilterQuery)
    -> Result<PredictionResult, ClientError>;

    /// `GET /crime-trends`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or parsing fails.
    async fn crime_trends(&self) -> Result<TrendReport, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_query_keeps_insertion_order() {
        let mut query = FilterQuery::new();
        assert!(query.is_empty());
        query.push("year", "2023");
        query.push("district", "12");
        assert_eq!(
            query.params(),
            [("year", "2023".to_string()), ("district", "12".to_string())]
        );
        assert_eq!(query.get("district"), Some("12"));
        assert_eq!(query.get("type"), None);
    }

    #[test]
    fn malformed_errors_are_distinguished() {
        let err: ClientError = serde_json::from_str::<Vec<u8>>("{")
            .map_err(ClientError::from)
            .unwrap_err();
        assert!(err.is_malformed());
        assert!(!err.is_timeout());
    }
}
