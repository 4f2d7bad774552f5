//! Terminal rendering of the dashboard views.

use std::sync::Arc;

use crime_dashboard::render::{
    AnalysisPanel, ChartLayer, Collaborators, FilterControls, MapLayer, NoticeLevel, Notifier,
    SummaryPanel, TableRenderer,
};
use crime_dashboard::table::TablePage;
use crime_dashboard::trends::TrendDisplay;
use crime_dashboard_models::{
    ClusterResult, CrimeRecord, FilterOptions, HeatPoint, MonthlyCount, PredictionResult,
    SummaryStats, TypeCount,
};

/// Width of the longest bar in the text charts.
const BAR_WIDTH: u64 = 40;

/// Prints every view to stdout.
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    /// All collaborators backed by this view.
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
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = usize::try_from(count * BAR_WIDTH / max).unwrap_or(0);
    "#".repeat(len)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn text(value: Option<&String>) -> &str {
    value.map_or("-", String::as_str)
}

fn print_row(record: &CrimeRecord) {
    println!(
        "{:<22} {:<24} {:<30} {:<24} {:<6} {}",
        truncate(text(record.date.as_ref()), 22),
        truncate(text(record.primary_type.as_ref()), 24),
        truncate(text(record.description.as_ref()), 30),
        truncate(text(record.location_description.as_ref()), 24),
        yes_no(record.arrest),
        yes_no(record.domestic),
    );
}

impl MapLayer for TerminalView {
    fn update_heat(&self, points: &[HeatPoint]) {
        println!("\nMap: {} heat point(s)", points.len());
        if let [only] = points {
            println!("  centred on ({:.4}, {:.4})", only.lat, only.lon);
        }
    }

    fn show_clusters(&self, result: &ClusterResult) {
        println!("\nHotspots: {} cluster(s)", result.cluster_count);
        if let Some(crime_type) = &result.crime_type_filter {
            println!("  crime type: {crime_type}");
        }
        for center in &result.centers {
            println!(
                "  #{:<3} ({:.4}, {:.4})  {} incident(s)",
                center.cluster_id, center.lat, center.lon, center.count
            );
        }
    }
}

impl ChartLayer for TerminalView {
    fn update_type_distribution(&self, types: &[TypeCount]) {
        println!("\nCrimes by type");
        if types.is_empty() {
            println!("  (no data)");
            return;
        }
        let max = types.iter().map(|t| t.count).max().unwrap_or(0);
        for entry in types {
            println!(
                "  {:<28} {:>8} {}",
                truncate(&entry.crime_type, 28),
                entry.count,
                bar(entry.count, max)
            );
        }
    }

    fn update_time_series(&self, months: &[MonthlyCount]) {
        println!("\nCrimes per month");
        if months.is_empty() {
            println!("  (no data)");
            return;
        }
        let max = months.iter().map(|m| m.count).max().unwrap_or(0);
        for month in months {
            println!(
                "  {} {:>8} {}",
                month.label(),
                month.count,
                bar(month.count, max)
            );
        }
    }
}

impl TableRenderer for TerminalView {
    fn render_table(&self, page: &TablePage) {
        println!();
        println!(
            "{:<22} {:<24} {:<30} {:<24} {:<6} DOMESTIC",
            "DATE", "TYPE", "DESCRIPTION", "LOCATION", "ARREST"
        );
        println!("{}", "-".repeat(120));
        if page.rows.is_empty() {
            println!("No incidents match the selected filters.");
        }
        for record in &page.rows {
            print_row(record);
        }

        let links: Vec<String> = page
            .pagination
            .pages
            .iter()
            .map(|link| {
                if link.active {
                    format!("[{}]", link.page)
                } else {
                    link.page.to_string()
                }
            })
            .collect();
        println!(
            "\nShowing {}-{} of {}  |  {}{}{}",
            page.start_index,
            page.end_index,
            page.total_count,
            if page.pagination.has_previous { "< " } else { "" },
            links.join(" "),
            if page.pagination.has_next { " >" } else { "" },
        );
    }
}

impl SummaryPanel for TerminalView {
    fn show_summary(&self, summary: &SummaryStats) {
        println!("\nSummary");
        println!("  Total crimes:  {}", summary.total_crimes);
        println!("  Arrest rate:   {:.1}%", summary.arrest_rate_percent);
        println!("  Domestic rate: {:.1}%", summary.domestic_rate_percent);
    }
}

impl FilterControls for TerminalView {
    fn populate_options(&self, options: &FilterOptions) {
        println!(
            "Filters: {} year(s), {} crime type(s), {} district(s)",
            options.years.len(),
            options.crime_types.len(),
            options.districts.len()
        );
    }
}

impl AnalysisPanel for TerminalView {
    fn show_prediction(&self, result: &PredictionResult) {
        println!("\nArrest prediction");
        if let Some(accuracy) = result.train_accuracy {
            println!("  Training accuracy: {:.1}%", accuracy * 100.0);
        }
        if let Some(accuracy) = result.test_accuracy {
            println!("  Test accuracy:     {:.1}%", accuracy * 100.0);
        }
        for feature in &result.top_features {
            println!("  {:<40} {:.3}", truncate(&feature.feature, 40), feature.importance);
        }
    }

    fn show_trends(&self, trends: &TrendDisplay) {
        println!("\nIncreasing");
        if trends.increasing.is_empty() {
            println!("  (none)");
        }
        for entry in &trends.increasing {
            println!("  {:<30} {}", entry.crime_type, entry.label);
        }
        println!("Decreasing");
        if trends.decreasing.is_empty() {
            println!("  (none)");
        }
        for entry in &trends.decreasing {
            println!("  {:<30} {}", entry.crime_type, entry.label);
        }
    }
}

impl Notifier for TerminalView {
    fn notify(&self, level: NoticeLevel, message: &str) {
        println!("\n[{level}] {message}");
    }

    fn alert(&self, message: &str) {
        eprintln!("\n!! {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("THEFT", 10), "THEFT");
        assert_eq!(truncate("DECEPTIVE PRACTICE", 10), "DECEPTI...");
        assert_eq!(truncate("ÉÉÉÉÉÉÉÉÉÉÉÉ", 5), "ÉÉ...");
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        assert_eq!(bar(10, 10).len(), 40);
        assert_eq!(bar(5, 10).len(), 20);
        assert!(bar(3, 0).is_empty());
    }
}
