//! Display rules for the trend analysis panel.

use crime_dashboard_models::{TrendEntry, TrendReport};

/// Changes smaller than this (in percent, either sign) are not shown.
pub const MIN_DISPLAYED_CHANGE: f64 = 0.1;

/// One row of a trend list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendDisplayEntry {
    /// Primary crime type.
    pub crime_type: String,
    /// Change shown, in percent.
    pub change_percent: f64,
    /// Formatted change, e.g. `+12.3%`.
    pub label: String,
}

/// Both trend lists as shown to the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendDisplay {
    /// Rising crime types.
    pub increasing: Vec<TrendDisplayEntry>,
    /// Falling crime types.
    pub decreasing: Vec<TrendDisplayEntry>,
    /// Error reported by the service alongside the lists.
    pub service_error: Option<String>,
}

impl TrendDisplay {
    /// Applies the display rules to a service report.
    ///
    /// Entries with `|change| < MIN_DISPLAYED_CHANGE` are dropped from both
    /// lists. A non-positive value in the increasing list is shown as
    /// `0.0%`; the decreasing list shows values as reported.
    #[must_use]
    pub fn from_report(report: &TrendReport) -> Self {
        Self {
            increasing: visible(&report.increasing)
                .map(|entry| display_entry(entry, entry.avg_monthly_change_percent.max(0.0)))
                .collect(),
            decreasing: visible(&report.decreasing)
                .map(|entry| display_entry(entry, entry.avg_monthly_change_percent))
                .collect(),
            service_error: report.error.clone(),
        }
    }

    /// Whether neither list has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.increasing.is_empty() && self.decreasing.is_empty()
    }
}

fn visible(entries: &[TrendEntry]) -> impl Iterator<Item = &TrendEntry> {
    entries
        .iter()
        .filter(|entry| entry.avg_monthly_change_percent.abs() >= MIN_DISPLAYED_CHANGE)
}

fn display_entry(entry: &TrendEntry, change_percent: f64) -> TrendDisplayEntry {
    TrendDisplayEntry {
        crime_type: entry.crime_type.clone(),
        change_percent,
        label: format_change(change_percent),
    }
}

/// Formats a percentage with one decimal and a `+` for positive values.
#[must_use]
pub fn format_change(change_percent: f64) -> String {
    if change_percent > 0.0 {
        format!("+{change_percent:.1}%")
    } else {
        format!("{change_percent:.1}%")
    }
}
