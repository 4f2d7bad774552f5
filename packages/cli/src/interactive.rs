//! Menu loop that turns user choices into dashboard intents.

use crime_dashboard::{DashboardController, FilterField, FilterSelection, Intent};
use crime_dashboard_models::RecordField;
use dialoguer::{Confirm, Input, Select};

/// Label of the "no constraint" entry in the filter selects.
const ANY: &str = "(any)";

/// Top-level dashboard actions.
enum Action {
    ApplyFilter,
    ResetFilter,
    Sort,
    Page,
    PageSize,
    Reload,
    Clusters,
    Prediction,
    Trends,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ApplyFilter,
        Self::ResetFilter,
        Self::Sort,
        Self::Page,
        Self::PageSize,
        Self::Reload,
        Self::Clusters,
        Self::Prediction,
        Self::Trends,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ApplyFilter => "Apply filters",
            Self::ResetFilter => "Reset filters",
            Self::Sort => "Sort table",
            Self::Page => "Go to page",
            Self::PageSize => "Change page size",
            Self::Reload => "Reload data",
            Self::Clusters => "Find hotspots (clustering)",
            Self::Prediction => "Predict arrests",
            Self::Trends => "Analyze trends",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the dashboard until the user quits.
///
/// Failed intents are already reported through the notifier, so they do
/// not end the loop.
///
/// # Errors
///
/// Returns an error if a prompt fails (e.g. the terminal is closed).
pub async fn run(controller: &DashboardController) -> Result<(), Box<dyn std::error::Error>> {
    if controller.dispatch(Intent::Init).await.is_err() {
        println!("The dashboard started without data. Choose \"Reload data\" to retry.");
    }

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt("Dashboard")
            .items(&labels)
            .default(0)
            .interact()?;

        let intent = match Action::ALL[idx] {
            Action::ApplyFilter => Intent::ApplyFilter(pick_filters(controller)?),
            Action::ResetFilter => Intent::ResetFilter,
            Action::Sort => Intent::ChangeSort(pick_sort_field(controller)?),
            Action::Page => {
                let current = controller.table_page();
                let page: usize = Input::new()
                    .with_prompt(format!("Page (1-{})", current.max_page))
                    .default(current.current_page)
                    .interact_text()?;
                Intent::ChangePage(page)
            }
            Action::PageSize => {
                let size: usize = Input::new()
                    .with_prompt("Rows per page")
                    .default(controller.table_page().page_size)
                    .interact_text()?;
                Intent::ChangePageSize(size)
            }
            Action::Reload => Intent::Load,
            Action::Clusters => Intent::RunClustering,
            Action::Prediction => Intent::RunPrediction,
            Action::Trends => Intent::AnalyzeTrends,
            Action::Quit => {
                if Confirm::new()
                    .with_prompt("Leave the dashboard?")
                    .default(true)
                    .interact()?
                {
                    break;
                }
                continue;
            }
        };

        if let Err(e) = controller.dispatch(intent).await {
            log::debug!("Intent failed: {e}");
        }
    }

    Ok(())
}

/// Prompts for all three filters, preselecting the current values.
fn pick_filters(
    controller: &DashboardController,
) -> Result<FilterSelection, Box<dyn std::error::Error>> {
    let options = controller.options();
    let current = controller.filter();

    let pick = |field: FilterField, prompt: &str, values: &[String]| {
        pick_one(prompt, values, current.get(field))
    };

    Ok(FilterSelection {
        year: pick(FilterField::Year, "Year", &options.years)?,
        crime_type: pick(FilterField::CrimeType, "Crime type", &options.crime_types)?,
        district: pick(FilterField::District, "District", &options.districts)?,
    })
}

fn pick_one(
    prompt: &str,
    values: &[String],
    current: Option<&str>,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut items: Vec<&str> = vec![ANY];
    items.extend(values.iter().map(String::as_str));
    let default = current
        .and_then(|c| items.iter().position(|item| *item == c))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default)
        .interact()?;

    Ok((idx > 0).then(|| items[idx].to_string()))
}

fn pick_sort_field(
    controller: &DashboardController,
) -> Result<String, Box<dyn std::error::Error>> {
    let sort = controller.sort();
    let fields = RecordField::all();
    let labels: Vec<String> = fields
        .iter()
        .map(|field| {
            if sort.same_field(field.as_ref()) {
                format!("{} ({})", field.display_name(), sort.direction)
            } else {
                field.display_name().to_string()
            }
        })
        .collect();
    let default = fields
        .iter()
        .position(|field| sort.same_field(field.as_ref()))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Sort by (choosing the current column flips direction)")
        .items(&labels)
        .default(default)
        .interact()?;

    Ok(fields[idx].to_string())
}
