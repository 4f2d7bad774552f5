#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive terminal front end for the crime analytics dashboard.
//!
//! ```text
//! crime_dashboard [--config dashboard.toml] [--api-url URL] [--page-size N]
//! ```
//!
//! Connects to the analytics service, loads the dashboard and presents a
//! menu of filter, table and analysis actions. Command-line flags override
//! the configuration file and the `CRIME_DASHBOARD_*` environment
//! variables.

mod interactive;
mod terminal;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crime_dashboard::{DashboardConfig, DashboardController};
use crime_dashboard_client::http::HttpDataService;

use crate::terminal::TerminalView;

#[derive(Parser)]
#[command(
    name = "crime_dashboard",
    about = "Interactive crime analytics dashboard"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the analytics service
    #[arg(long)]
    api_url: Option<String>,

    /// Table rows per page
    #[arg(long)]
    page_size: Option<NonZeroUsize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(size) = cli.page_size {
        config.page_size = size;
    }
    log::info!("Using analytics service at {}", config.api_base_url);

    let service = HttpDataService::new(&config.client_config())?;
    let view = Arc::new(TerminalView);
    let controller = DashboardController::builder(Arc::new(service))
        .config(config)
        .collaborators(view.collaborators())
        .build()?;

    println!("Crime Dashboard");
    println!();

    interactive::run(&controller).await
}
