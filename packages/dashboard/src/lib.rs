#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data and view-state controller for the crime analytics dashboard.
//!
//! [`controller::DashboardController`] keeps a map heat layer, cluster
//! markers, two charts, a summary panel and a sortable, paginated incident
//! table consistent with the selected filters. Data comes from a
//! [`crime_dashboard_client::RemoteDataService`]; drawing is delegated to
//! the collaborator traits in [`render`].

pub mod config;
pub mod controller;
pub mod filter;
pub mod orchestrator;
pub mod render;
pub mod sort;
pub mod table;
pub mod trends;

#[cfg(test)]
mod test_support;

use crime_dashboard_client::ClientError;

pub use config::DashboardConfig;
pub use controller::{DashboardController, DashboardControllerBuilder, Intent};
pub use filter::{FilterField, FilterSelection, FilterState};
pub use orchestrator::LoadOutcome;
pub use sort::{SortDirection, SortSpec};
pub use table::{PageSpec, TablePage};

/// Errors that can occur while driving the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// A service request failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A rendering collaborator was not provided.
    #[error("Missing collaborator: {name}")]
    MissingCollaborator {
        /// Collaborator name.
        name: String,
    },

    /// A page size of zero was requested.
    #[error("Invalid page size {size}: must be at least 1")]
    InvalidPageSize {
        /// Requested size.
        size: usize,
    },

    /// The service did not answer in time.
    #[error("Timed out after {seconds}s")]
    Timeout {
        /// Configured limit.
        seconds: u64,
    },

    /// The service reported that an analysis could not be computed.
    #[error("{message}")]
    Analysis {
        /// Message from the service.
        message: String,
    },

    /// Invalid configuration value.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML.
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}
