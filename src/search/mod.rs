//! Full-text search over the spec directory, powered by Tantivy
//!
//! This module covers the path from raw search-bar text to a selectable set of
//! spec records:
//!
//! - **Normalization**: accents folded, non-ASCII dropped
//! - **Query building**: multi-field boosted or single-field fuzzy descriptors
//! - **Execution**: exhaustive, relevance-ordered scroll over a named index
//! - **Resolution**: the first N hits keyed by title
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  normalize() → QueryStrategy::build()            │
//! │              → QueryDescriptor                   │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service                         │
//! ├─────────────────────────────────────────────────┤
//! │  - execute()  (QueryCompiler + paged TopDocs)   │
//! │  - submit()   (upsert by spec_id)               │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │  Tantivy index <root>/<name>                     │
//! │  - title, description (ASCII-folded text)       │
//! │  - spec_id (raw), source (stored JSON)          │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//!            resolve(hits, limit) → ResultIndex
//! ```
//!
//! # Example
//!
//! ```no_run
//! use datapages::search::{build_multi_field_query, resolve, SearchConfig, SearchService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SearchService::new(SearchConfig::default());
//!
//!     let query = build_multi_field_query("vendédor", ("title", "description"), 2)?;
//!     let hits = service.execute(&query, "directory").await?;
//!     let references = resolve(&hits, 5)?;
//!     println!("Found {} specs", references.len());
//!
//!     Ok(())
//! }
//! ```

mod config;
mod document;
mod error;
mod index;
mod normalize;
mod query;
mod resolver;
mod service;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{build_directory_schema, SearchDocument, SpecRecord};
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats};
pub use normalize::normalize;
pub use query::{
    build_multi_field_query, build_single_field_query, QueryCompiler, QueryDescriptor,
    QueryStrategy, WeightedField, MAX_EXPANSIONS, MAX_FUZZINESS,
};
pub use resolver::{resolve, ResultIndex};
pub use service::{SearchRecord, SearchService};
