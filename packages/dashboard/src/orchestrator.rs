//! Concurrent fetch cycle behind every dashboard load.
//!
//! One cycle issues the records, heat map, summary and time-series requests
//! at once and resolves each on its own. Every settled result is handed to a
//! [`FetchSink`] tagged with the cycle's generation, so the sink can drop
//! results from a cycle that a newer load has superseded.

use crime_dashboard_client::{ClientError, FilterQuery, RemoteDataService};
use crime_dashboard_models::{CrimeRecord, HeatPoint, MonthlyCount, SummaryStats};

/// Whether a sink accepted a sub-result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result belonged to the latest load and was applied.
    Current,
    /// A newer load started; the result was dropped.
    Stale,
}

/// Receiver of settled sub-results.
///
/// Each method applies (and renders) one result atomically, or reports it
/// stale if `generation` is no longer the latest.
pub trait FetchSink: Send + Sync {
    /// `Some` replaces the dataset; `None` clears it after a failed fetch.
    fn apply_records(&self, generation: u64, records: Option<Vec<CrimeRecord>>) -> Applied;

    /// Never empty: failures are already replaced by the fallback point.
    fn apply_heat(&self, generation: u64, points: Vec<HeatPoint>) -> Applied;

    /// Failures arrive as the zeroed summary.
    fn apply_summary(&self, generation: u64, summary: SummaryStats) -> Applied;

    /// Failures arrive as an empty series.
    fn apply_time_series(&self, generation: u64, months: Vec<MonthlyCount>) -> Applied;
}

/// How a load cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The records were applied.
    Applied {
        /// Number of records loaded.
        records: usize,
    },
    /// A newer load started before the records settled.
    Superseded,
}

/// Runs load cycles against a [`RemoteDataService`].
#[derive(Debug, Clone, Copy)]
pub struct FetchOrchestrator {
    fallback_point: HeatPoint,
}

impl FetchOrchestrator {
    /// Creates an orchestrator showing `fallback_point` when the heat map
    /// has no data.
    #[must_use]
    pub const fn new(fallback_point: HeatPoint) -> Self {
        Self { fallback_point }
    }

    /// Runs one cycle for `query` and feeds every sub-result to `sink`.
    ///
    /// Only the records fetch decides the outcome; the other three degrade
    /// to their defaults and log a warning.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of a failed records fetch, unless the
    /// cycle was already superseded.
    pub async fn run(
        &self,
        service: &dyn RemoteDataService,
        generation: u64,
        query: &FilterQuery,
        sink: &dyn FetchSink,
    ) -> Result<LoadOutcome, ClientError> {
        let records = async {
            match service.crime_data(query).await {
                Ok(records) => {
                    let count = records.len();
                    Ok(match sink.apply_records(generation, Some(records)) {
                        Applied::Current => {
                            log::debug!("Load #{generation}: applied {count} records");
                            LoadOutcome::Applied { records: count }
                        }
                        Applied::Stale => LoadOutcome::Superseded,
                    })
                }
                Err(e) => match sink.apply_records(generation, None) {
                    Applied::Current => {
                        log::error!("Load #{generation}: crime data request failed: {e}");
                        Err(e)
                    }
                    Applied::Stale => Ok(LoadOutcome::Superseded),
                },
            }
        };

        let heat = async {
            let points = match service.heatmap_data(query).await {
                Ok(points) => self.heat_or_fallback(points),
                Err(e) => {
                    log::warn!("Load #{generation}: heat map request failed: {e}");
                    vec![self.fallback_point]
                }
            };
            sink.apply_heat(generation, points);
        };

        let summary = async {
            let summary = service.crime_summary().await.unwrap_or_else(|e| {
                log::warn!("Load #{generation}: summary request failed: {e}");
                SummaryStats::default()
            });
            sink.apply_summary(generation, summary);
        };

        let time_series = async {
            let months = match service.time_series(query).await {
                Ok(points) => MonthlyCount::group(&points),
                Err(e) => {
                    log::warn!("Load #{generation}: time series request failed: {e}");
                    Vec::new()
                }
            };
            sink.apply_time_series(generation, months);
        };

        let (records, (), (), ()) = futures::join!(records, heat, summary, time_series);
        records
    }

    fn heat_or_fallback(&self, points: Vec<HeatPoint>) -> Vec<HeatPoint> {
        let total = points.len();
        let points: Vec<HeatPoint> = points.into_iter().filter(HeatPoint::is_finite).collect();
        if points.len() < total {
            log::debug!("Dropped {} non-finite heat points", total - points.len());
        }
        if points.is_empty() {
            vec![self.fallback_point]
        } else {
            points
        }
    }
}
