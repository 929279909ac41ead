//! Search, select and visualize session over the spec directory

use crate::aggregation::{aggregate, plan, ChartView, Dataset};
use crate::config::Config;
use crate::error::Result;
use crate::ingest::load_dataset;
use crate::search::{normalize, resolve, QueryStrategy, ResultIndex, SearchConfig, SearchService, SpecRecord};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// What a search bar entry produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Nothing in the directory matched
    NoMatches { query: String },

    /// Matches were found; `references` holds the leading ones keyed by title
    Matches {
        query: String,
        total: usize,
        truncated: bool,
        references: ResultIndex,
    },
}

impl SearchOutcome {
    pub fn references(&self) -> Option<&ResultIndex> {
        match self {
            SearchOutcome::NoMatches { .. } => None,
            SearchOutcome::Matches { references, .. } => Some(references),
        }
    }
}

/// One user's exploration session.
///
/// The dataset is loaded once and shared read-only by every visualization.
pub struct Explorer {
    service: SearchService,
    strategy: QueryStrategy,
    spec_index: String,
    result_limit: usize,
    chart_limit: usize,
    dataset: Arc<Dataset>,
}

impl Explorer {
    /// Validate `config`, select the query strategy and load the dataset from its store
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let dataset = load_dataset(&config.directory.index_address, &config.directory.data_index_name)?;
        Self::with_dataset(config, Arc::new(dataset))
    }

    /// Build a session over an already loaded dataset
    pub fn with_dataset(config: &Config, dataset: Arc<Dataset>) -> Result<Self> {
        config.validate()?;
        let strategy = QueryStrategy::from_settings(&config.search)?;

        Ok(Self {
            service: SearchService::new(SearchConfig::from(config)),
            strategy,
            spec_index: config.directory.spec_index_name.clone(),
            result_limit: config.explorer.result_limit,
            chart_limit: config.explorer.chart_limit,
            dataset,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn strategy(&self) -> &QueryStrategy {
        &self.strategy
    }

    /// Run a search bar entry against the spec directory
    pub async fn search(&self, text: &str) -> Result<SearchOutcome> {
        let descriptor = self.strategy.build(text)?;
        let hits = self.service.execute(&descriptor, &self.spec_index).await?;
        let query = normalize(text);

        if hits.is_empty() {
            tracing::info!(query = query.as_str(), "no specs matched");
            return Ok(SearchOutcome::NoMatches { query });
        }

        let references = resolve(&hits, self.result_limit)?;
        tracing::info!(
            query = query.as_str(),
            total = hits.len(),
            kept = references.len(),
            "specs matched"
        );

        Ok(SearchOutcome::Matches {
            query,
            total: hits.len(),
            truncated: hits.len() > self.result_limit,
            references,
        })
    }

    /// Aggregate the dataset according to a selected spec
    pub fn visualize(&self, record: &SpecRecord) -> Result<ChartView> {
        let handle = plan(&record.instructions, &self.dataset)?;
        let table = aggregate(&handle, &record.instructions, self.chart_limit)?;

        tracing::info!(
            spec_id = record.spec_id.as_str(),
            rows = table.len(),
            "visualization prepared"
        );

        Ok(ChartView {
            spec_id: record.spec_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            table,
            specs: record.specs.clone(),
        })
    }
}
