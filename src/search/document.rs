//! Spec record documents and the directory index schema

use crate::aggregation::AggregationInstructions;
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

/// Name under which the directory analyzer is registered on every opened index
pub const ANALYZER_NAME: &str = "directory_text";

/// Stored field holding the full JSON document
pub const SOURCE_FIELD: &str = "source";

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> SearchResult<TantivyDocument>;

    /// Get document ID
    fn document_id(&self) -> String;
}

/// A stored description of one explorable visualization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecRecord {
    /// Unique identifier, also the index upsert key
    pub spec_id: String,

    /// Display name, key of the result lookup
    pub title: String,

    /// Free text matched by searches
    pub description: String,

    /// Grouping and aggregation plan
    pub instructions: AggregationInstructions,

    /// Chart rendering description, passed through untouched
    #[serde(default)]
    pub specs: serde_json::Value,
}

impl SpecRecord {
    /// Read a spec record back from a flat search result
    pub fn from_record(record: &serde_json::Map<String, serde_json::Value>) -> SearchResult<Self> {
        serde_json::from_value(serde_json::Value::Object(record.clone())).map_err(|e| {
            let id = record
                .get("spec_id")
                .map(|v| v.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            SearchError::MalformedDocument(format!("record {} is not a spec record: {}", id, e))
        })
    }
}

impl SearchDocument for SpecRecord {
    fn to_tantivy_doc(&self, schema: &Schema) -> SearchResult<TantivyDocument> {
        let mut doc = TantivyDocument::new();

        // ID field
        if let Ok(field) = schema.get_field("spec_id") {
            doc.add_text(field, &self.spec_id);
        }

        // Title field (indexed and stored)
        if let Ok(field) = schema.get_field("title") {
            doc.add_text(field, &self.title);
        }

        // Description field (indexed and stored)
        if let Ok(field) = schema.get_field("description") {
            doc.add_text(field, &self.description);
        }

        // Full document, returned verbatim on search
        if let Ok(field) = schema.get_field(SOURCE_FIELD) {
            let source = serde_json::to_string(self).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to serialize {}: {}", self.spec_id, e))
            })?;
            doc.add_text(field, &source);
        }

        Ok(doc)
    }

    fn document_id(&self) -> String {
        self.spec_id.clone()
    }
}

/// Build the directory schema for spec records
pub fn build_directory_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(ANALYZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default()
        .set_indexing_options(text_indexing)
        .set_stored();

    // ID - stored, indexed as string
    schema_builder.add_text_field("spec_id", STRING | STORED);

    // Title - full-text indexed, stored
    schema_builder.add_text_field("title", text_options.clone());

    // Description - full-text indexed, stored
    schema_builder.add_text_field("description", text_options);

    // Source - stored only
    schema_builder.add_text_field(SOURCE_FIELD, STORED);

    schema_builder.build()
}

/// Register the accent-folding analyzer used by the text fields
pub fn register_analyzer(index: &Index) {
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();
    index.tokenizers().register(ANALYZER_NAME, analyzer);
}
