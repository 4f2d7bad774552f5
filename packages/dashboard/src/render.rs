//! Rendering collaborators.
//!
//! The controller never draws anything itself. It pushes derived state to
//! these traits, which a front end implements (the terminal front end in
//! `crime_dashboard_cli`, recording fakes in tests). Calls happen while the
//! controller state is locked, so implementations must not call back into
//! the controller.

use std::sync::Arc;

use crime_dashboard_models::{
    ClusterResult, FilterOptions, HeatPoint, MonthlyCount, PredictionResult, SummaryStats,
    TypeCount,
};
use strum_macros::{AsRefStr, Display};

use crate::table::TablePage;
use crate::trends::TrendDisplay;

/// Map with a heat layer and a cluster marker layer.
pub trait MapLayer: Send + Sync {
    /// Replaces the heat layer. Every point has intensity
    /// [`HeatPoint::INTENSITY`].
    fn update_heat(&self, points: &[HeatPoint]);

    /// Replaces the cluster markers; zero clusters clears them.
    fn show_clusters(&self, result: &ClusterResult);
}

/// The two dashboard charts.
pub trait ChartLayer: Send + Sync {
    /// Replaces the crime-type distribution chart.
    fn update_type_distribution(&self, types: &[TypeCount]);

    /// Replaces the monthly time-series chart; empty clears it.
    fn update_time_series(&self, months: &[MonthlyCount]);
}

/// The incident table with its pagination control.
pub trait TableRenderer: Send + Sync {
    /// Draws one page.
    fn render_table(&self, page: &TablePage);
}

/// Headline statistics.
pub trait SummaryPanel: Send + Sync {
    /// Shows the totals and rates.
    fn show_summary(&self, summary: &SummaryStats);
}

/// The year, crime type and district selects.
pub trait FilterControls: Send + Sync {
    /// Fills the three selects.
    fn populate_options(&self, options: &FilterOptions);
}

/// Results of the one-shot analyses.
pub trait AnalysisPanel: Send + Sync {
    /// Shows an arrest prediction.
    fn show_prediction(&self, result: &PredictionResult);

    /// Shows both trend lists; empty lists clear the panel.
    fn show_trends(&self, trends: &TrendDisplay);
}

/// Severity of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something was degraded.
    Warning,
    /// An action failed.
    Error,
}

/// User-facing messages.
pub trait Notifier: Send + Sync {
    /// Shows a non-blocking message.
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Shows a blocking alert. Used only when the dashboard cannot start.
    fn alert(&self, message: &str);
}

/// Every collaborator the controller renders through.
#[derive(Clone)]
pub struct Collaborators {
    /// Map layers.
    pub map: Arc<dyn MapLayer>,
    /// Charts.
    pub charts: Arc<dyn ChartLayer>,
    /// Incident table.
    pub table: Arc<dyn TableRenderer>,
    /// Summary statistics.
    pub summary: Arc<dyn SummaryPanel>,
    /// Filter selects.
    pub filters: Arc<dyn FilterControls>,
    /// Analysis results.
    pub analysis: Arc<dyn AnalysisPanel>,
    /// User messages.
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
