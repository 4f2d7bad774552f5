//! The dashboard controller.
//!
//! [`DashboardController`] owns the filter, the loaded dataset and the table
//! settings, and turns user [`Intent`]s into service calls and collaborator
//! updates. Every intent takes `&self`; state lives behind a mutex that is
//! only held while a result is applied and rendered, never across an
//! `.await`.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crime_dashboard_client::{ClientError, RemoteDataService};
use crime_dashboard_models::{
    ClusterResult, CrimeRecord, FilterOptions, HeatPoint, MonthlyCount, PredictionResult,
    PredictionStatus, SummaryStats,
};

use crate::DashboardError;
use crate::config::DashboardConfig;
use crate::filter::{FilterSelection, FilterState};
use crate::orchestrator::{Applied, FetchOrchestrator, FetchSink, LoadOutcome};
use crate::render::{
    AnalysisPanel, ChartLayer, Collaborators, FilterControls, MapLayer, NoticeLevel, Notifier,
    SummaryPanel, TableRenderer,
};
use crate::sort::SortSpec;
use crate::table::{TablePage, TableState, compute_page};
use crate::trends::TrendDisplay;

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Load the filter options, reset the view and run the first load.
    Init,
    /// Reload everything for the current filter.
    Load,
    /// Replace the filter and reload.
    ApplyFilter(FilterSelection),
    /// Clear the filter and reload.
    ResetFilter,
    /// Column-header click on the named field.
    ChangeSort(String),
    /// Set column and direction explicitly.
    SetSort(SortSpec),
    /// Go to a page (1-based).
    ChangePage(usize),
    /// Change the rows per page.
    ChangePageSize(usize),
    /// Run the clustering analysis for the current year and type.
    RunClustering,
    /// Run the arrest prediction for the current year and type.
    RunPrediction,
    /// Fetch the crime trend analysis.
    AnalyzeTrends,
}

impl Intent {
    fn failure_message(&self) -> &'static str {
        match self {
            Self::Init | Self::Load | Self::ApplyFilter(_) | Self::ResetFilter => {
                "Failed to load crime data"
            }
            Self::ChangeSort(_) | Self::SetSort(_) | Self::ChangePage(_) => "Failed to update table",
            Self::ChangePageSize(_) => "Page size not changed",
            Self::RunClustering => "Clustering failed",
            Self::RunPrediction => "Arrest prediction failed",
            Self::AnalyzeTrends => "Trend analysis failed",
        }
    }
}

#[derive(Debug)]
struct DashboardState {
    filter: FilterState,
    dataset: Vec<CrimeRecord>,
    table: TableState,
    options: FilterOptions,
}

impl DashboardState {
    fn new(page_size: NonZeroUsize) -> Self {
        Self {
            filter: FilterState::default(),
            dataset: Vec::new(),
            table: TableState::new(page_size),
            options: FilterOptions::default(),
        }
    }
}

/// Drives the dashboard.
pub struct DashboardController {
    service: Arc<dyn RemoteDataService>,
    view: Collaborators,
    orchestrator: FetchOrchestrator,
    page_size: NonZeroUsize,
    type_chart_limit: usize,
    trend_timeout: Duration,
    generation: AtomicU64,
    state: Mutex<DashboardState>,
}

impl std::fmt::Debug for DashboardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DashboardController {
    /// Starts building a controller that talks to `service`.
    #[must_use]
    pub fn builder(service: Arc<dyn RemoteDataService>) -> DashboardControllerBuilder {
        DashboardControllerBuilder::new(service)
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state if `generation` is still the latest load.
    fn lock_current(&self, generation: u64, what: &str) -> Option<MutexGuard<'_, DashboardState>> {
        let state = self.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            Some(state)
        } else {
            log::debug!("Dropping stale {what} from load #{generation}");
            None
        }
    }

    /// Runs `intent` and reports a failure to the user.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying intent method after it has been
    /// shown through the notifier.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), DashboardError> {
        log::debug!("Dispatching {intent:?}");
        let result = match &intent {
            Intent::Init => self.init().await.map(|_| ()),
            Intent::Load => self.load().await.map(|_| ()),
            Intent::ApplyFilter(selection) => self.apply_filter(selection).await.map(|_| ()),
            Intent::ResetFilter => self.reset_filter().await.map(|_| ()),
            Intent::ChangeSort(field) => {
                self.change_sort(field);
                Ok(())
            }
            Intent::SetSort(sort) => {
                self.set_sort(sort.clone());
                Ok(())
            }
            Intent::ChangePage(page) => {
                self.change_page(*page);
                Ok(())
            }
            Intent::ChangePageSize(size) => self.change_page_size(*size).map(|_| ()),
            Intent::RunClustering => self.run_clustering().await.map(|_| ()),
            Intent::RunPrediction => self.run_prediction().await.map(|_| ()),
            Intent::AnalyzeTrends => self.analyze_trends().await.map(|_| ()),
        };

        if let Err(e) = &result {
            let level = match e {
                DashboardError::InvalidPageSize { .. } => NoticeLevel::Warning,
                _ => NoticeLevel::Error,
            };
            self.view
                .notifier
                .notify(level, &format!("{}: {e}", intent.failure_message()));
        }
        result
    }

    /// Loads the filter option lists, resets the view and runs the first
    /// load. A failed option list is logged and shown empty.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the records fetch fails.
    pub async fn init(&self) -> Result<LoadOutcome, DashboardError> {
        log::info!("Initializing dashboard");
        let (years, crime_types, districts) = futures::join!(
            self.service.years(),
            self.service.crime_types(),
            self.service.districts(),
        );
        let options = FilterOptions {
            years: option_list("years", years),
            crime_types: option_list("crime types", crime_types),
            districts: option_list("districts", districts),
        };

        {
            let mut state = self.lock();
            *state = DashboardState::new(self.page_size);
            self.view.filters.populate_options(&options);
            state.options = options;
        }

        self.load().await
    }

    /// Reloads every view for the current filter.
    ///
    /// The load's generation and filter snapshot are taken when this is
    /// called, not when the future is first polled. A newer load makes the
    /// results of this one stale; they are dropped as they arrive.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the records fetch fails.
    pub fn load(&self) -> impl Future<Output = Result<LoadOutcome, DashboardError>> + Send + '_ {
        let (generation, query) = {
            let state = self.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, state.filter.to_query())
        };
        log::info!(
            "Load #{generation} started with {} filter(s)",
            query.params().len()
        );

        async move {
            let outcome = self
                .orchestrator
                .run(self.service.as_ref(), generation, &query, self)
                .await?;
            match outcome {
                LoadOutcome::Applied { records } => {
                    log::info!("Load #{generation} settled with {records} records");
                }
                LoadOutcome::Superseded => log::debug!("Load #{generation} was superseded"),
            }
            Ok(outcome)
        }
    }

    /// Replaces the filter with `selection` and reloads.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the records fetch fails.
    pub fn apply_filter(
        &self,
        selection: &FilterSelection,
    ) -> impl Future<Output = Result<LoadOutcome, DashboardError>> + Send + '_ {
        self.lock().filter.apply(selection);
        self.load()
    }

    /// Clears the filter and reloads.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the records fetch fails.
    pub fn reset_filter(
        &self,
    ) -> impl Future<Output = Result<LoadOutcome, DashboardError>> + Send + '_ {
        self.lock().filter.reset();
        self.load()
    }

    /// Column-header click: flips the direction of the current column or
    /// sorts ascending by a new one, then shows page 1.
    pub fn change_sort(&self, field: &str) -> TablePage {
        self.update_table(|table| table.toggle_sort(field))
    }

    /// Sets column and direction. Only a column change returns to page 1.
    pub fn set_sort(&self, sort: SortSpec) -> TablePage {
        self.update_table(|table| table.set_sort(sort))
    }

    /// Shows `page`, clamped to the available pages.
    pub fn change_page(&self, page: usize) -> TablePage {
        self.update_table(|table| table.set_page(page))
    }

    /// Changes the rows per page and shows page 1.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidPageSize`] for a size of 0; the table
    /// is left unchanged.
    pub fn change_page_size(&self, size: usize) -> Result<TablePage, DashboardError> {
        let size = NonZeroUsize::new(size).ok_or(DashboardError::InvalidPageSize { size })?;
        Ok(self.update_table(|table| table.set_page_size(size)))
    }

    fn update_table(&self, update: impl FnOnce(&mut TableState)) -> TablePage {
        let mut guard = self.lock();
        let state = &mut *guard;
        update(&mut state.table);
        let page = state.table.view(&state.dataset);
        self.view.table.render_table(&page);
        page
    }

    /// Fetches clusters for the current year and type and shows them on the
    /// map. Zero clusters clears the markers and tells the user.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the request fails; the previous
    /// markers stay.
    pub async fn run_clustering(&self) -> Result<ClusterResult, DashboardError> {
        let query = self.lock().filter.to_analysis_query();
        log::info!("Running clustering for {:?}", query.params());
        let result = self.service.clusters(&query).await?;

        self.view.map.show_clusters(&result);
        if result.cluster_count == 0 || result.centers.is_empty() {
            self.view
                .notifier
                .notify(NoticeLevel::Info, "No clusters found for the selected filters");
        }
        Ok(result)
    }

    /// Fetches an arrest prediction for the current year and type.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Client`] if the request fails and
    /// [`DashboardError::Analysis`] if the service reports an error status.
    /// The previous prediction stays in both cases.
    pub async fn run_prediction(&self) -> Result<PredictionResult, DashboardError> {
        let query = self.lock().filter.to_analysis_query();
        log::info!("Running arrest prediction for {:?}", query.params());
        let result = self.service.arrest_prediction(&query).await?;

        if result.status == PredictionStatus::Error {
            return Err(DashboardError::Analysis {
                message: result
                    .error
                    .unwrap_or_else(|| "the service could not build a model".to_string()),
            });
        }
        self.view.analysis.show_prediction(&result);
        Ok(result)
    }

    /// Fetches the trend analysis, bounded by the configured timeout.
    ///
    /// A timeout or malformed response clears both lists; any other
    /// transport failure leaves them. A report carrying an `error` shows
    /// its lists and then fails.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Timeout`], [`DashboardError::Client`] or
    /// [`DashboardError::Analysis`].
    pub async fn analyze_trends(&self) -> Result<TrendDisplay, DashboardError> {
        log::info!("Analyzing crime trends");
        let report =
            match tokio::time::timeout(self.trend_timeout, self.service.crime_trends()).await {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    if e.is_malformed() || e.is_timeout() {
                        self.view.analysis.show_trends(&TrendDisplay::default());
                    }
                    return Err(e.into());
                }
                Err(_) => {
                    log::warn!(
                        "Trend analysis did not answer within {}s",
                        self.trend_timeout.as_secs()
                    );
                    self.view.analysis.show_trends(&TrendDisplay::default());
                    return Err(DashboardError::Timeout {
                        seconds: self.trend_timeout.as_secs(),
                    });
                }
            };

        let display = TrendDisplay::from_report(&report);
        self.view.analysis.show_trends(&display);
        if let Some(message) = &display.service_error {
            return Err(DashboardError::Analysis {
                message: message.clone(),
            });
        }
        Ok(display)
    }

    /// Current filter.
    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.lock().filter.clone()
    }

    /// Filter option lists loaded by [`Self::init`].
    #[must_use]
    pub fn options(&self) -> FilterOptions {
        self.lock().options.clone()
    }

    /// Records of the last applied load.
    #[must_use]
    pub fn dataset(&self) -> Vec<CrimeRecord> {
        self.lock().dataset.clone()
    }

    /// Current sort.
    #[must_use]
    pub fn sort(&self) -> SortSpec {
        self.lock().table.sort.clone()
    }

    /// The table page currently shown.
    #[must_use]
    pub fn table_page(&self) -> TablePage {
        let state = self.lock();
        compute_page(&state.dataset, &state.table.sort, state.table.page)
    }
}

fn option_list(name: &str, result: Result<Vec<String>, ClientError>) -> Vec<String> {
    result.unwrap_or_else(|e| {
        log::warn!("Failed to load {name} options: {e}");
        Vec::new()
    })
}

impl FetchSink for DashboardController {
    fn apply_records(&self, generation: u64, records: Option<Vec<CrimeRecord>>) -> Applied {
        let Some(mut guard) = self.lock_current(generation, "records") else {
            return Applied::Stale;
        };
        let state = &mut *guard;
        state.dataset = records.unwrap_or_default();
        let page = state.table.view(&state.dataset);
        self.view.table.render_table(&page);
        Applied::Current
    }

    fn apply_heat(&self, generation: u64, points: Vec<HeatPoint>) -> Applied {
        let Some(_state) = self.lock_current(generation, "heat map") else {
            return Applied::Stale;
        };
        self.view.map.update_heat(&points);
        Applied::Current
    }

    fn apply_summary(&self, generation: u64, summary: SummaryStats) -> Applied {
        let Some(_state) = self.lock_current(generation, "summary") else {
            return Applied::Stale;
        };
        self.view.summary.show_summary(&summary);
        self.view
            .charts
            .update_type_distribution(&summary.top_types(self.type_chart_limit));
        Applied::Current
    }

    fn apply_time_series(&self, generation: u64, months: Vec<MonthlyCount>) -> Applied {
        let Some(_state) = self.lock_current(generation, "time series") else {
            return Applied::Stale;
        };
        self.view.charts.update_time_series(&months);
        Applied::Current
    }
}

/// Builder for [`DashboardController`].
///
/// Every collaborator is required; [`Self::build`] fails (and raises a
/// blocking alert, if a notifier was given) when one is missing.
pub struct DashboardControllerBuilder {
    service: Arc<dyn RemoteDataService>,
    config: DashboardConfig,
    map: Option<Arc<dyn MapLayer>>,
    charts: Option<Arc<dyn ChartLayer>>,
    table: Option<Arc<dyn TableRenderer>>,
    summary: Option<Arc<dyn SummaryPanel>>,
    filters: Option<Arc<dyn FilterControls>>,
    analysis: Option<Arc<dyn AnalysisPanel>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl DashboardControllerBuilder {
    fn new(service: Arc<dyn RemoteDataService>) -> Self {
        Self {
            service,
            config: DashboardConfig::default(),
            map: None,
            charts: None,
            table: None,
            summary: None,
            filters: None,
            analysis: None,
            notifier: None,
        }
    }

    /// Page size, chart limit, trend timeout and fallback point.
    #[must_use]
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets every collaborator at once.
    #[must_use]
    pub fn collaborators(self, view: Collaborators) -> Self {
        self.map(view.map)
            .charts(view.charts)
            .table(view.table)
            .summary(view.summary)
            .filters(view.filters)
            .analysis(view.analysis)
            .notifier(view.notifier)
    }

    #[must_use]
    pub fn map(mut self, map: Arc<dyn MapLayer>) -> Self {
        self.map = Some(map);
        self
    }

    #[must_use]
    pub fn charts(mut self, charts: Arc<dyn ChartLayer>) -> Self {
        self.charts = Some(charts);
        self
    }

    #[must_use]
    pub fn table(mut self, table: Arc<dyn TableRenderer>) -> Self {
        self.table = Some(table);
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: Arc<dyn SummaryPanel>) -> Self {
        self.summary = Some(summary);
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: Arc<dyn FilterControls>) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn analysis(mut self, analysis: Arc<dyn AnalysisPanel>) -> Self {
        self.analysis = Some(analysis);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Builds the controller.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::MissingCollaborator`] naming the first
    /// collaborator that was not set.
    pub fn build(self) -> Result<DashboardController, DashboardError> {
        let alert_target = self.notifier.clone();
        let missing = |name: &str| {
            let err = DashboardError::MissingCollaborator {
                name: name.to_string(),
            };
            log::error!("Dashboard cannot start: {err}");
            if let Some(notifier) = &alert_target {
                notifier.alert(&format!("The dashboard cannot start: {err}"));
            }
            err
        };

        let view = Collaborators {
            map: self.map.ok_or_else(|| missing("map"))?,
            charts: self.charts.ok_or_else(|| missing("charts"))?,
            table: self.table.ok_or_else(|| missing("table"))?,
            summary: self.summary.ok_or_else(|| missing("summary"))?,
            filters: self.filters.ok_or_else(|| missing("filters"))?,
            analysis: self.analysis.ok_or_else(|| missing("analysis"))?,
            notifier: self.notifier.ok_or_else(|| missing("notifier"))?,
        };

        let config = self.config;
        Ok(DashboardController {
            service: self.service,
            view,
            orchestrator: FetchOrchestrator::new(config.fallback_point),
            page_size: config.page_size,
            type_chart_limit: config.type_chart_limit,
            trend_timeout: config.trend_timeout(),
            generation: AtomicU64::new(0),
            state: Mutex::new(DashboardState::new(config.page_size)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crime_dashboard_models::{ClusterCenter, TrendEntry, TrendReport};

    use super::*;
    use crate::sort::SortDirection;
    use crate::test_support::{MockService, RecordingView, Reply, record};

    const FALLBACK: HeatPoint = HeatPoint::new(41.8781, -87.6298);

    fn setup(service: MockService) -> (DashboardController, Arc<MockService>, Arc<RecordingView>) {
        let service = Arc::new(service);
        let view = Arc::new(RecordingView::default());
        let controller = DashboardController::builder(service.clone())
            .collaborators(view.collaborators())
            .build()
            .unwrap();
        (controller, service, view)
    }

    /// `n` records dated on consecutive days of March 2024.
    fn records(n: usize) -> Vec<CrimeRecord> {
        (1..=n)
            .map(|day| record(&format!("2024-03-{day:02}T12:00:00"), "THEFT"))
            .collect()
    }

    fn errors(view: &RecordingView) -> Vec<String> {
        view.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == NoticeLevel::Error)
            .map(|(_, message)| message.clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn load_survives_failed_side_fetches() {
        let service = MockService::default();
        service.records.push(Reply::Ok(records(2)));
        service.heat.push(Reply::Fail);
        service.summary.push(Reply::Fail);
        service.time_series.push(Reply::Malformed);
        let (controller, _, view) = setup(service);

        controller.dispatch(Intent::Load).await.unwrap();

        assert_eq!(RecordingView::last(&view.heat), Some(vec![FALLBACK]));
        assert_eq!(
            RecordingView::last(&view.summaries),
            Some(SummaryStats::default())
        );
        assert_eq!(RecordingView::last(&view.type_charts), Some(Vec::new()));
        assert_eq!(RecordingView::last(&view.time_series), Some(Vec::new()));
        assert_eq!(RecordingView::last(&view.tables).unwrap().total_count, 2);
        assert!(errors(&view).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_records_clear_table_and_notify_once() {
        let service = MockService::default();
        service.records.push(Reply::Ok(records(4)));
        let (controller, _, view) = setup(service);
        controller.load().await.unwrap();
        assert_eq!(controller.dataset().len(), 4);

        let err = controller.dispatch(Intent::Load).await.unwrap_err();

        assert!(matches!(err, DashboardError::Client(_)));
        assert!(controller.dataset().is_empty());
        let table = RecordingView::last(&view.tables).unwrap();
        assert_eq!(table.total_count, 0);
        assert_eq!(table.start_index, 0);
        assert_eq!(errors(&view).len(), 1);
        assert!(errors(&view)[0].starts_with("Failed to load crime data"));
    }

    #[tokio::test(start_paused = true)]
    async fn older_load_resolving_last_is_dropped() {
        let service = MockService::default();
        service.records.push_after(
            Duration::from_secs(5),
            Reply::Ok(vec![record("2024-01-01T00:00:00", "OLD"); 3]),
        );
        service.records.push_after(
            Duration::from_secs(1),
            Reply::Ok(vec![record("2024-02-01T00:00:00", "NEW")]),
        );
        let (controller, _, view) = setup(service);

        let older = controller.load();
        let newer = controller.load();
        let (older, newer) = futures::join!(older, newer);

        assert_eq!(older.unwrap(), LoadOutcome::Superseded);
        assert_eq!(newer.unwrap(), LoadOutcome::Applied { records: 1 });
        let dataset = controller.dataset();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset[0].primary_type.as_deref(), Some("NEW"));
        assert_eq!(RecordingView::last(&view.tables).unwrap().total_count, 1);
        assert_eq!(view.tables.lock().unwrap().len(), 1);
        assert_eq!(view.heat.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn init_tolerates_missing_option_lists() {
        let service = MockService::default();
        service.years.push(Reply::Fail);
        service
            .crime_types
            .push(Reply::Ok(vec!["BATTERY".to_string(), "THEFT".to_string()]));
        service.districts.push(Reply::Ok(vec!["1".to_string()]));
        service.records.push(Reply::Ok(records(3)));
        let (controller, _, view) = setup(service);

        let outcome = controller.init().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Applied { records: 3 });
        let options = RecordingView::last(&view.options).unwrap();
        assert!(options.years.is_empty());
        assert_eq!(options.crime_types, ["BATTERY", "THEFT"]);
        assert_eq!(controller.options(), options);
        assert_eq!(controller.sort(), SortSpec::default());
    }

    #[tokio::test(start_paused = true)]
    async fn filter_selection_reaches_the_service() {
        let service = MockService::default();
        service.records.push(Reply::Ok(Vec::new()));
        service.clusters.push(Reply::Ok(ClusterResult::default()));
        let (controller, service, _) = setup(service);

        controller
            .apply_filter(&FilterSelection {
                year: Some("2023".to_string()),
                crime_type: Some("THEFT".to_string()),
                district: Some("12".to_string()),
            })
            .await
            .unwrap();
        let query = service.query_for("crime-data").unwrap();
        assert_eq!(query.get("year"), Some("2023"));
        assert_eq!(query.get("type"), Some("THEFT"));
        assert_eq!(query.get("district"), Some("12"));

        controller.run_clustering().await.unwrap();
        let query = service.query_for("clusters").unwrap();
        assert_eq!(query.get("year"), Some("2023"));
        assert_eq!(query.get("district"), None);

        controller.reset_filter().await.unwrap_err();
        assert!(controller.filter().is_empty());
        assert!(service.query_for("crime-data").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn paging_past_the_end_clamps() {
        let service = MockService::default();
        service.records.push(Reply::Ok(records(23)));
        let (controller, _, view) = setup(service);
        controller.load().await.unwrap();

        controller.dispatch(Intent::ChangePage(5)).await.unwrap();

        let page = RecordingView::last(&view.tables).unwrap();
        assert_eq!(page.max_page, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!((page.start_index, page.end_index), (21, 23));
        assert_eq!(controller.table_page(), page);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_page_size_is_rejected_without_state_change() {
        let service = MockService::default();
        service.records.push(Reply::Ok(records(30)));
        let (controller, _, view) = setup(service);
        controller.load().await.unwrap();
        controller.change_page(2);
        let before = controller.table_page();

        let err = controller
            .dispatch(Intent::ChangePageSize(0))
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::InvalidPageSize { size: 0 }));
        assert_eq!(controller.table_page(), before);
        let notices = view.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, NoticeLevel::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn sorting_needs_no_network() {
        let service = MockService::default();
        service.records.push(Reply::Ok(records(12)));
        let (controller, service, _) = setup(service);
        controller.load().await.unwrap();
        let calls = service.queries.lock().unwrap().len();

        controller.change_page(2);
        let page = controller.change_sort("date");
        assert_eq!(page.current_page, 1);
        assert_eq!(controller.sort().direction, SortDirection::Asc);
        assert_eq!(page.rows[0].date.as_deref(), Some("2024-03-01T12:00:00"));

        controller.change_page(2);
        let page = controller.set_sort(SortSpec::new("date", SortDirection::Desc));
        assert_eq!(page.current_page, 2);

        assert_eq!(service.queries.lock().unwrap().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_clusters_clear_markers_with_message() {
        let service = MockService::default();
        service.clusters.push(Reply::Ok(ClusterResult::default()));
        let (controller, _, view) = setup(service);

        controller.dispatch(Intent::RunClustering).await.unwrap();

        assert_eq!(view.clusters.lock().unwrap().len(), 1);
        let notices = view.notices.lock().unwrap();
        assert_eq!(notices[0].0, NoticeLevel::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn clustering_failure_keeps_markers() {
        let service = MockService::default();
        service.clusters.push(Reply::Ok(ClusterResult {
            cluster_count: 1,
            crime_type_filter: None,
            centers: vec![ClusterCenter {
                cluster_id: 0,
                lat: 41.88,
                lon: -87.63,
                count: 12,
            }],
            cluster_counts: BTreeMap::from([("0".to_string(), 12)]),
        }));
        service.clusters.push(Reply::Fail);
        let (controller, _, view) = setup(service);

        controller.run_clustering().await.unwrap();
        controller.dispatch(Intent::RunClustering).await.unwrap_err();

        assert_eq!(view.clusters.lock().unwrap().len(), 1);
        assert!(errors(&view)[0].starts_with("Clustering failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn prediction_error_status_is_reported() {
        let service = MockService::default();
        service.prediction.push(Reply::Ok(PredictionResult {
            status: PredictionStatus::Error,
            train_accuracy: None,
            test_accuracy: None,
            top_features: Vec::new(),
            error: Some("Not enough data".to_string()),
        }));
        let (controller, _, view) = setup(service);

        let err = controller
            .dispatch(Intent::RunPrediction)
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::Analysis { ref message } if message == "Not enough data"));
        assert!(view.predictions.lock().unwrap().is_empty());
        assert_eq!(errors(&view).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_trend_analysis_times_out_and_clears() {
        let service = MockService::default();
        service.trends.push(Reply::Ok(TrendReport {
            increasing: vec![TrendEntry {
                crime_type: "THEFT".to_string(),
                avg_monthly_change_percent: 5.0,
            }],
            ..TrendReport::default()
        }));
        service
            .trends
            .push_after(Duration::from_secs(31), Reply::Ok(TrendReport::default()));
        let (controller, _, view) = setup(service);

        let shown = controller.analyze_trends().await.unwrap();
        assert_eq!(shown.increasing.len(), 1);

        let err = controller.analyze_trends().await.unwrap_err();
        assert!(matches!(err, DashboardError::Timeout { seconds: 30 }));
        assert!(RecordingView::last(&view.trends).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_trends_clear_but_transport_errors_keep() {
        let service = MockService::default();
        service.trends.push(Reply::Malformed);
        service.trends.push(Reply::Fail);
        let (controller, _, view) = setup(service);

        controller.analyze_trends().await.unwrap_err();
        assert_eq!(view.trends.lock().unwrap().len(), 1);

        controller.analyze_trends().await.unwrap_err();
        assert_eq!(view.trends.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn trend_service_error_shows_lists_then_fails() {
        let service = MockService::default();
        service.trends.push(Reply::Ok(TrendReport {
            decreasing: vec![TrendEntry {
                crime_type: "ARSON".to_string(),
                avg_monthly_change_percent: -999.0,
            }],
            error: Some("partial data".to_string()),
            ..TrendReport::default()
        }));
        let (controller, _, view) = setup(service);

        let err = controller
            .dispatch(Intent::AnalyzeTrends)
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::Analysis { .. }));
        let shown = RecordingView::last(&view.trends).unwrap();
        assert_eq!(shown.decreasing[0].label, "-999.0%");
        assert!(errors(&view)[0].contains("partial data"));
    }

    #[test]
    fn missing_collaborator_raises_alert() {
        let view = Arc::new(RecordingView::default());
        let err = DashboardController::builder(Arc::new(MockService::default()))
            .notifier(view.clone())
            .map(view.clone())
            .build()
            .unwrap_err();

        assert!(matches!(err, DashboardError::MissingCollaborator { ref name } if name == "charts"));
        assert_eq!(view.alerts.lock().unwrap().len(), 1);
    }

    #[test]
    fn config_sets_initial_page_size() {
        let view = Arc::new(RecordingView::default());
        let config = DashboardConfig {
            page_size: NonZeroUsize::new(25).unwrap(),
            ..DashboardConfig::default()
        };
        let controller = DashboardController::builder(Arc::new(MockService::default()))
            .config(config)
            .collaborators(view.collaborators())
            .build()
            .unwrap();
        assert_eq!(controller.table_page().page_size, 25);
    }
}
