//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{build_directory_schema, register_analyzer, SearchDocument};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages one named Tantivy index under the configured root
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer, present only when opened for ingest
    writer: Option<Arc<RwLock<IndexWriter>>>,

    /// Index reader
    reader: IndexReader,

    /// Location on disk
    path: PathBuf,
}

impl IndexManager {
    /// Open an existing index for searching
    pub fn open(config: &SearchConfig, name: &str) -> SearchResult<Self> {
        let path = config.index_path(name);

        if !Self::index_exists(&path) {
            return Err(SearchError::Unavailable(format!(
                "index '{}' does not exist at {}",
                name,
                path.display()
            )));
        }

        let index = Index::open_in_dir(&path).map_err(|e| {
            SearchError::Unavailable(format!("Failed to open index '{}': {}", name, e))
        })?;
        register_analyzer(&index);

        let schema = index.schema();
        let reader = Self::build_reader(&index)?;

        Ok(Self {
            index,
            schema,
            writer: None,
            reader,
            path,
        })
    }

    /// Open an index for writing, creating it if needed
    pub fn open_or_create(config: &SearchConfig, name: &str) -> SearchResult<Self> {
        let path = config.index_path(name);

        std::fs::create_dir_all(&path).map_err(|e| {
            SearchError::IndexingFailed(format!("Failed to create index directory: {}", e))
        })?;

        let index = if Self::index_exists(&path) {
            Index::open_in_dir(&path).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(&path, build_directory_schema()).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to create new index: {}", e))
            })?
        };
        register_analyzer(&index);

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to create writer: {}", e)))?;

        let schema = index.schema();
        let reader = Self::build_reader(&index)?;

        Ok(Self {
            index,
            schema,
            writer: Some(Arc::new(RwLock::new(writer))),
            reader,
            path,
        })
    }

    fn build_reader(index: &Index) -> SearchResult<IndexReader> {
        index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Unavailable(format!("Failed to create reader: {}", e)))
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    fn writer(&self) -> SearchResult<&Arc<RwLock<IndexWriter>>> {
        self.writer.as_ref().ok_or_else(|| {
            SearchError::IndexingFailed(format!("index at {} is open read-only", self.path.display()))
        })
    }

    /// Upsert documents by ID and commit them
    pub async fn index_documents<D: SearchDocument>(&self, documents: &[D]) -> SearchResult<usize> {
        let mut writer = self.writer()?.write().await;
        let id_field = self.schema.get_field("spec_id").ok();
        let mut indexed = 0;

        for document in documents {
            let tantivy_doc = document.to_tantivy_doc(&self.schema)?;

            // Delete existing document with same ID
            if let Some(id_field) = id_field {
                let term = tantivy::Term::from_field_text(id_field, &document.document_id());
                writer.delete_term(term);
            }

            writer.add_document(tantivy_doc).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to add document {}: {}", indexed, e))
            })?;

            indexed += 1;
        }

        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit batch: {}", e)))?;

        self.reader
            .reload()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to reload reader: {}", e)))?;

        Ok(indexed)
    }

    /// Get index statistics
    pub fn get_stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        // Count total documents
        let total_documents = searcher
            .search(&tantivy::query::AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        // Calculate approximate index size
        let index_size_bytes = std::fs::read_dir(&self.path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents,
            index_size_bytes,
            num_segments,
        })
    }
}
