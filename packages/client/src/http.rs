//! `reqwest` implementation of [`RemoteDataService`].

use std::time::Duration;

use async_trait::async_trait;
use crime_dashboard_models::{
    ClusterResult, CrimeRecord, HeatPoint, PredictionResult, SummaryStats, TimeSeriesPoint,
    TrendReport, value_to_text,
};
use serde::de::DeserializeOwned;

use crate::retry::{self, RetryPolicy};
use crate::sanitize::replace_non_standard_numbers;
use crate::{ClientError, FilterQuery, RemoteDataService};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Connection settings for [`HttpDataService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    /// (e.g. `"http://127.0.0.1:5000/api"`).
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
}

/// Talks to the analytics service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDataService {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpDataService {
    /// Builds a client for the service at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL is empty, or
    /// [`ClientError::Http`] if the underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Config {
                message: "API base URL is empty".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry: config.retry,
        })
    }

    /// Full URL of an endpoint path.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetches `path` with `query`, repairs non-standard number literals,
    /// and parses the body as `T`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &FilterQuery,
    ) -> Result<T, ClientError> {
        let url = self.endpoint_url(path);
        log::debug!("GET {url} {:?}", query.params());

        let text = retry::send_text(self.retry, || {
            self.client.get(&url).query(query.params())
        })
        .await?;

        let cleaned = replace_non_standard_numbers(&text);
        serde_json::from_str(&cleaned).map_err(|e| {
            let preview = if cleaned.len() > BODY_PREVIEW_LEN {
                let end = cleaned
                    .char_indices()
                    .map(|(i, _)| i)
                    .take_while(|i| *i <= BODY_PREVIEW_LEN)
                    .last()
                    .unwrap_or(0);
                format!("{}...", &cleaned[..end])
            } else {
                cleaned.to_string()
            };
            log::warn!(
                "Malformed payload from {url}\n  \
                 received: {} bytes\n  \
                 parse error: {e}\n  \
                 body preview: {preview}",
                text.len(),
            );
            ClientError::Json(e)
        })
    }

    /// Fetches an option list. The service sends years and districts as
    /// numbers, crime types as strings; all are rendered to text.
    async fn get_options(&self, path: &str) -> Result<Vec<String>, ClientError> {
        let values: Vec<serde_json::Value> = self.get_json(path, &FilterQuery::new()).await?;
        Ok(values.iter().filter_map(value_to_text).collect())
    }
}

#[async_trait]
impl RemoteDataService for HttpDataService {
    async fn years(&self) -> Result<Vec<String>, ClientError> {
        self.get_options("years").await
    }

    async fn crime_types(&self) -> Result<Vec<String>, ClientError> {
        self.get_options("crime-types").await
    }

    async fn districts(&self) -> Result<Vec<String>, ClientError> {
        self.get_options("districts").await
    }

    async fn crime_data(&self, query: &FilterQuery) -> Result<Vec<CrimeRecord>, ClientError> {
        self.get_json("crime-data", query).await
    }

    async fn heatmap_data(&self, query: &FilterQuery) -> Result<Vec<HeatPoint>, ClientError> {
        self.get_json("heatmap-data", query).await
    }

    async fn crime_summary(&self) -> Result<SummaryStats, ClientError> {
        self.get_json("crime-summary", &FilterQuery::new()).await
    }

    async fn time_series(
        &self,
        query: &FilterQuery,
    ) -> Result<Vec<TimeSeriesPoint>, ClientError> {
        self.get_json("time-series", query).await
    }

    async fn clusters(&self, query: &FilterQuery) -> Result<ClusterResult, ClientError> {
        self.get_json("clusters", query).await
    }

    async fn arrest_prediction(
        &self,
        query: &FilterQuery,
    ) -> Result<PredictionResult, ClientError> {
        self.get_json("arrest-prediction", query).await
    }

    async fn crime_trends(&self) -> Result<TrendReport, ClientError> {
        self.get_json("crime-trends", &FilterQuery::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::NONE,
        }
    }

    #[test]
    fn joins_endpoint_paths() {
        let service = HttpDataService::new(&config("http://localhost:5000/api/")).unwrap();
        assert_eq!(
            service.endpoint_url("/crime-data"),
            "http://localhost:5000/api/crime-data"
        );
        assert_eq!(
            service.endpoint_url("years"),
            "http://localhost:5000/api/years"
        );
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = HttpDataService::new(&config("  ")).unwrap_err();
        assert!(matches!(err, ClientError::Config { .. }));
    }
}
