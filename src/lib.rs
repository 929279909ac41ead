//! Datapages: search a directory of chart specifications and aggregate a
//! tabular dataset according to the one selected.
//!
//! - [`search`]: text normalization, query building, directory search and result resolution
//! - [`aggregation`]: dataset loading, grouping plans, aggregation and chart export
//! - [`explorer`]: the search, select and visualize session
//! - [`ingest`]: spec submission and dataset bootstrap

pub mod aggregation;
pub mod config;
pub mod error;
pub mod explorer;
pub mod ingest;
pub mod search;

pub use config::Config;
pub use error::{AppError, Result};
pub use explorer::{Explorer, SearchOutcome};
