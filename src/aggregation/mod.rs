//! Aggregation of the explored dataset into chartable tables
//!
//! Every spec carries [`AggregationInstructions`] describing how the dataset
//! should be summarized:
//!
//! - **Time series**: rows bucketed by month or day over a timestamp column,
//!   with empty buckets kept so the series is contiguous
//! - **Categories**: rows grouped by a categorical column, ordered by an
//!   aggregated field (largest first) and cut to a limit
//! - **Operations**: count, sum, mean, median
//!
//! Aggregation runs in two stages. [`plan`] projects the dataset to the
//! instructed dimensions and groups it; [`aggregate`] reduces the groups.
//!
//! # Example
//!
//! ```no_run
//! use datapages::aggregation::{aggregate, plan, AggregationInstructions, Dataset};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::from_csv_path(Path::new("data/olist/data.csv"))?;
//!     let instructions = AggregationInstructions::category(
//!         &["seller_id", "price"],
//!         "seller_id",
//!         "sum",
//!         "price",
//!     );
//!
//!     let handle = plan(&instructions, &dataset)?;
//!     let table = aggregate(&handle, &instructions, 10)?;
//!     print!("{}", table.to_csv()?);
//!
//!     Ok(())
//! }
//! ```

mod dataset;
mod engine;
mod error;
mod instructions;
mod statistics;
mod table;

pub use dataset::{Cell, Column, ColumnKind, Dataset};
pub use engine::{aggregate, parse_timestamp, plan, GroupingHandle, GroupingKind, BUCKET_LABEL_FORMAT};
pub use error::{AggregationError, AggregationResult};
pub use instructions::{
    AggOperation, AggregationInstructions, Grouping, PlotType, TimeUnit, ValidatedInstructions,
};
pub use statistics::{mean, median, sum};
pub use table::{AggregatedTable, ChartView, DOWNLOAD_FILE_NAME};
