//! Search executor over the directory index

use crate::search::config::SearchConfig;
use crate::search::document::{SpecRecord, SOURCE_FIELD};
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{IndexManager, IndexStats};
use crate::search::query::{QueryCompiler, QueryDescriptor};
use tantivy::collector::TopDocs;
use tantivy::schema::{Schema, Value};
use tantivy::TantivyDocument;

/// A flat search hit: field name to value, always carrying `title` and `description`
pub type SearchRecord = serde_json::Map<String, serde_json::Value>;

/// Runs descriptors against named indexes and writes spec records into them
pub struct SearchService {
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run `query` against `index` and return every match in relevance order.
    ///
    /// Pages through the whole match set `scroll_page_size` documents at a time; there
    /// is no cap here, so very broad queries against large indexes are slow. Callers
    /// bound what they keep (see [`crate::search::resolve`]). Zero matches is `Ok(vec![])`.
    pub async fn execute(&self, query: &QueryDescriptor, index: &str) -> SearchResult<Vec<SearchRecord>> {
        let start_time = std::time::Instant::now();

        let manager = IndexManager::open(&self.config, index)?;
        let searcher = manager.reader().searcher();

        let compiler = QueryCompiler::new(manager.index(), &searcher);
        let tantivy_query = compiler.compile(query)?;

        let page_size = self.config.scroll_page_size.max(1);
        let schema = manager.schema();
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let collector = TopDocs::with_limit(page_size).and_offset(offset);
            let page = searcher
                .search(&*tantivy_query, &collector)
                .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

            let fetched = page.len();
            for (_score, doc_address) in page {
                let retrieved_doc: TantivyDocument = searcher
                    .doc(doc_address)
                    .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;
                records.push(doc_to_record(&retrieved_doc, schema)?);
            }

            if fetched < page_size {
                break;
            }
            offset += fetched;
        }

        tracing::debug!(
            index,
            query = query.text(),
            hits = records.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "search completed"
        );

        Ok(records)
    }

    /// Upsert spec records into `index`, creating it if needed
    pub async fn submit(&self, records: &[SpecRecord], index: &str) -> SearchResult<usize> {
        let manager = IndexManager::open_or_create(&self.config, index)?;
        let indexed = manager.index_documents(records).await?;

        for record in records {
            tracing::info!(spec_id = %record.spec_id, index, "specification submitted");
        }

        Ok(indexed)
    }

    /// Get statistics for `index`
    pub fn stats(&self, index: &str) -> SearchResult<IndexStats> {
        IndexManager::open(&self.config, index)?.get_stats()
    }
}

/// Convert a stored Tantivy document back into its flat record
fn doc_to_record(doc: &TantivyDocument, schema: &Schema) -> SearchResult<SearchRecord> {
    let source = schema
        .get_field(SOURCE_FIELD)
        .ok()
        .and_then(|field| doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string))
        .ok_or_else(|| SearchError::MalformedDocument("stored document has no source".to_string()))?;

    let record: SearchRecord = serde_json::from_str(&source)
        .map_err(|e| SearchError::MalformedDocument(format!("stored source is not an object: {}", e)))?;

    for required in ["title", "description"] {
        if !record.contains_key(required) {
            return Err(SearchError::MalformedDocument(format!(
                "stored record has no '{}' field",
                required
            )));
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::SearchConfigBuilder;
    use crate::search::query::build_multi_field_query;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_service(temp_dir: &TempDir) -> SearchService {
        SearchService::new(
            SearchConfigBuilder::new()
                .index_root(temp_dir.path().to_path_buf())
                .scroll_page_size(2)
                .build(),
        )
    }

    fn create_test_record(id: &str, title: &str, description: &str) -> SpecRecord {
        serde_json::from_value(json!({
            "spec_id": id,
            "title": title,
            "description": description,
            "instructions": {
                "type": "category",
                "dimensions": ["seller_id", "price"],
                "cat_field": "seller_id",
                "agg_operation": "count",
                "agg_field": "price"
            },
            "specs": {}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_index_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir);
        let query = build_multi_field_query("orders", ("title", "description"), 2).unwrap();

        let result = service.execute(&query, "directory").await;
        assert!(matches!(result, Err(SearchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_scroll_returns_every_match() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir);

        // Page size is 2, so five matches take three pages
        let records: Vec<_> = (0..5)
            .map(|i| create_test_record(&format!("spec-{}", i), &format!("Orders view {}", i), "orders"))
            .collect();
        service.submit(&records, "directory").await.unwrap();

        let query = build_multi_field_query("orders", ("title", "description"), 2).unwrap();
        let hits = service.execute(&query, "directory").await.unwrap();
        assert_eq!(hits.len(), 5);
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir);
        service
            .submit(&[create_test_record("a", "Top sellers", "sellers by revenue")], "directory")
            .await
            .unwrap();

        let query = build_multi_field_query("freight", ("title", "description"), 2).unwrap();
        let hits = service.execute(&query, "directory").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_resubmission_replaces_record() {
        let temp_dir = TempDir::new().unwrap();
        let service = create_test_service(&temp_dir);
        service
            .submit(&[create_test_record("a", "Top sellers", "old")], "directory")
            .await
            .unwrap();
        service
            .submit(&[create_test_record("a", "Top sellers", "new")], "directory")
            .await
            .unwrap();

        assert_eq!(service.stats("directory").unwrap().total_documents, 1);

        let query = build_multi_field_query("sellers", ("title", "description"), 2).unwrap();
        let hits = service.execute(&query, "directory").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["description"], "new");
    }
}
