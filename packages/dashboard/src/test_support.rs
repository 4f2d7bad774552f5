//! Scripted service and recording collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crime_dashboard_client::{ClientError, FilterQuery, RemoteDataService};
use crime_dashboard_models::{
    ClusterResult, CrimeRecord, FilterOptions, HeatPoint, MonthlyCount, PredictionResult,
    SummaryStats, TimeSeriesPoint, TrendReport, TypeCount,
};

use crate::render::{
    AnalysisPanel, ChartLayer, Collaborators, FilterControls, MapLayer, NoticeLevel, Notifier,
    SummaryPanel, TableRenderer,
};
use crate::table::TablePage;
use crate::trends::TrendDisplay;

pub fn record(date: &str, primary_type: &str) -> CrimeRecord {
    CrimeRecord::new(Some(date), Some(primary_type))
}

/// One scripted answer.
pub enum Reply<T> {
    Ok(T),
    /// Transport failure.
    Fail,
    /// Unparsable body.
    Malformed,
}

/// Queue of answers for one endpoint. An exhausted queue fails.
pub struct Script<T> {
    replies: Mutex<VecDeque<(Duration, Reply<T>)>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T: Send> Script<T> {
    pub fn push(&self, reply: Reply<T>) {
        self.push_after(Duration::ZERO, reply);
    }

    pub fn push_after(&self, delay: Duration, reply: Reply<T>) {
        self.replies.lock().unwrap().push_back((delay, reply));
    }

    async fn answer(&self) -> Result<T, ClientError> {
        let next = self.replies.lock().unwrap().pop_front();
        let (delay, reply) = next.unwrap_or((Duration::ZERO, Reply::Fail));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Ok(value) => Ok(value),
            Reply::Fail => Err(ClientError::Config {
                message: "connection refused".to_string(),
            }),
            Reply::Malformed => Err(serde_json::from_str::<()>("{").unwrap_err().into()),
        }
    }
}

#[derive(Default)]
pub struct MockService {
    pub years: Script<Vec<String>>,
    pub crime_types: Script<Vec<String>>,
    pub districts: Script<Vec<String>>,
    pub records: Script<Vec<CrimeRecord>>,
    pub heat: Script<Vec<HeatPoint>>,
    pub summary: Script<SummaryStats>,
    pub time_series: Script<Vec<TimeSeriesPoint>>,
    pub clusters: Script<ClusterResult>,
    pub prediction: Script<PredictionResult>,
    pub trends: Script<TrendReport>,
    pub queries: Mutex<Vec<(&'static str, FilterQuery)>>,
}

impl MockService {
    fn log_query(&self, endpoint: &'static str, query: &FilterQuery) {
        self.queries.lock().unwrap().push((endpoint, query.clone()));
    }

    pub fn query_for(&self, endpoint: &str) -> Option<FilterQuery> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, q)| q.clone())
    }
}

#[async_trait]
impl RemoteDataService for MockService {
    async fn years(&self) -> Result<Vec<String>, ClientError> {
        self.years.answer().await
    }

    async fn crime_types(&self) -> Result<Vec<String>, ClientError> {
        self.crime_types.answer().await
    }

    async fn districts(&self) -> Result<Vec<String>, ClientError> {
        self.districts.answer().await
    }

    async fn crime_data(&self, query: &FilterQuery) -> Result<Vec<CrimeRecord>, ClientError> {
        self.log_query("crime-data", query);
        self.records.answer().await
    }

    async fn heatmap_data(&self, query: &FilterQuery) -> Result<Vec<HeatPoint>, ClientError> {
        self.log_query("heatmap-data", query);
        self.heat.answer().await
    }

    async fn crime_summary(&self) -> Result<SummaryStats, ClientError> {
        self.summary.answer().await
    }

    async fn time_series(
        &self,
        query: &FilterQuery,
    ) -> Result<Vec<TimeSeriesPoint>, ClientError> {
        self.log_query("time-series", query);
        self.time_series.answer().await
    }

    async fn clusters(&self, query: &FilterQuery) -> Result<ClusterResult, ClientError> {
        self.log_query("clusters", query);
        self.clusters.answer().await
    }

    async fn arrest_prediction(
        &self,
        query: &FilterQuery,
    ) -> Result<PredictionResult, ClientError> {
        self.log_query("arrest-prediction", query);
        self.prediction.answer().await
    }

    async fn crime_trends(&self) -> Result<TrendReport, ClientError> {
        self.trends.answer().await
    }
}

/// Collaborator fake that keeps every call.
#[derive(Default)]
pub struct RecordingView {
    pub heat: Mutex<Vec<Vec<HeatPoint>>>,
    pub clusters: Mutex<Vec<ClusterResult>>,
    pub type_charts: Mutex<Vec<Vec<TypeCount>>>,
    pub time_series: Mutex<Vec<Vec<MonthlyCount>>>,
    pub tables: Mutex<Vec<TablePage>>,
    pub summaries: Mutex<Vec<SummaryStats>>,
    pub options: Mutex<Vec<FilterOptions>>,
    pub predictions: Mutex<Vec<PredictionResult>>,
    pub trends: Mutex<Vec<TrendDisplay>>,
    pub notices: Mutex<Vec<(NoticeLevel, String)>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingView {
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            map: self.clone(),
            charts: self.clone(),
            table: self.clone(),
            summary: self.clone(),
            filters: self.clone(),
            analysis: self.clone(),
            notifier: self.clone(),
        }
    }

    pub fn last<T: Clone>(calls: &Mutex<Vec<T>>) -> Option<T> {
        calls.lock().unwrap().last().cloned()
    }
}

impl MapLayer for RecordingView {
    fn update_heat(&self, points: &[HeatPoint]) {
        self.heat.lock().unwrap().push(points.to_vec());
    }

    fn show_clusters(&self, result: &ClusterResult) {
        self.clusters.lock().unwrap().push(result.clone());
    }
}

impl ChartLayer for RecordingView {
    fn update_type_distribution(&self, types: &[TypeCount]) {
        self.type_charts.lock().unwrap().push(types.to_vec());
    }

    fn update_time_series(&self, months: &[MonthlyCount]) {
        self.time_series.lock().unwrap().push(months.to_vec());
    }
}

impl TableRenderer for RecordingView {
    fn render_table(&self, page: &TablePage) {
        self.tables.lock().unwrap().push(page.clone());
    }
}

impl SummaryPanel for RecordingView {
    fn show_summary(&self, summary: &SummaryStats) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}

impl FilterControls for RecordingView {
    fn populate_options(&self, options: &FilterOptions) {
        self.options.lock().unwrap().push(options.clone());
    }
}

impl AnalysisPanel for RecordingView {
    fn show_prediction(&self, result: &PredictionResult) {
        self.predictions.lock().unwrap().push(result.clone());
    }

    fn show_trends(&self, trends: &TrendDisplay) {
        self.trends.lock().unwrap().push(trends.clone());
    }
}

impl Notifier for RecordingView {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}
