//! Mapping of search hits to selectable spec records

use crate::search::document::SpecRecord;
use crate::search::error::{SearchError, SearchResult};
use crate::search::service::SearchRecord;
use serde::Serialize;

/// Title-keyed lookup of the spec records a search surfaced.
///
/// Titles keep the position of their first appearance. A later hit with the same
/// title replaces the earlier record, so one of two same-titled specs is hidden.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultIndex {
    entries: Vec<(String, SpecRecord)>,
}

impl ResultIndex {
    /// Insert a record under its title, replacing any record with the same title
    pub fn insert(&mut self, record: SpecRecord) {
        match self.entries.iter_mut().find(|(title, _)| *title == record.title) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((record.title.clone(), record)),
        }
    }

    /// Look up a record by display title
    pub fn get(&self, title: &str) -> Option<&SpecRecord> {
        self.entries
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, record)| record)
    }

    /// Titles in selection order
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|(title, _)| title.as_str()).collect()
    }

    /// Records in selection order
    pub fn records(&self) -> impl Iterator<Item = &SpecRecord> {
        self.entries.iter().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keep the first `limit` results, in the order given, keyed by title
pub fn resolve(results: &[SearchRecord], limit: usize) -> SearchResult<ResultIndex> {
    if limit == 0 {
        return Err(SearchError::InvalidConfiguration(
            "result limit must be a positive integer".to_string(),
        ));
    }

    let mut index = ResultIndex::default();
    for result in results.iter().take(limit) {
        index.insert(SpecRecord::from_record(result)?);
    }
    Ok(index)
}
