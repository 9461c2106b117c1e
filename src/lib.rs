//! # Spotify ETL
//!
//! Extract-load jobs that copy a Spotify account's library into a data
//! warehouse.
//!
//! ## Quick Start
//!
//! Jobs are run through the [`EtlRunner`], which wires a [`Fetcher`], a
//! [`WarehouseLoader`] and a [`Notifier`]:
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use spotify_etl::notify::LogNotifier;
//! use spotify_etl::warehouse::NdjsonLoader;
//! use spotify_etl::{EtlRunner, Job, JobSettings, SpotifyApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = EtlRunner::new(
//!         SpotifyApi::new("access-token")?,
//!         NdjsonLoader::new("warehouse"),
//!         LogNotifier,
//!         JobSettings::default(),
//!     );
//!
//!     // Saved albums, then the tracks of every saved album
//!     let report = runner.run(Job::SavedAlbums, Utc::now()).await?;
//!     for stage in &report.stages {
//!         println!("{}: {:?}", stage.table, stage.outcome);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`paginator::fetch_all`] walks every page of a resource
//! - [`converters::map_record`] flattens each raw item into a typed [`Row`]
//! - [`validator::validate`] rejects empty, duplicated, null or stale data
//! - [`warehouse`] writes the rows (BigQuery or local NDJSON files)
//! - [`notify`] reports the outcome

pub mod api;
pub mod config;
pub mod converters;
pub mod error;
pub mod models;
pub mod notify;
pub mod paginator;
pub mod runner;
pub mod validator;
pub mod warehouse;

// Main interface
pub use runner::{EtlRunner, Job, JobReport, JobSettings, StageOutcome, StageReport};

// Collaborators
pub use api::{Fetcher, SpotifyApi};
pub use config::Settings;
pub use error::{IntegrityError, PipelineError};
pub use models::{Resource, ResourceKind, Row};
pub use notify::Notifier;
pub use warehouse::{WarehouseLoader, WriteMode};
