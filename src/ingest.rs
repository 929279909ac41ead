//! Loading spec records and the explored dataset into their stores

use crate::aggregation::{AggregationError, AggregationResult, Dataset};
use crate::error::{AppError, Result};
use crate::search::{SearchService, SpecRecord};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the dataset inside its data store directory
pub const DATA_FILE_NAME: &str = "data.csv";

/// Location of the dataset CSV for `data_index_name`
pub fn data_store_path(index_address: &Path, data_index_name: &str) -> PathBuf {
    index_address.join(data_index_name).join(DATA_FILE_NAME)
}

/// Load the explored dataset from its data store
pub fn load_dataset(index_address: &Path, data_index_name: &str) -> AggregationResult<Dataset> {
    let path = data_store_path(index_address, data_index_name);
    if !path.exists() {
        return Err(AggregationError::DatasetUnavailable(format!(
            "no data store '{}' under {}",
            data_index_name,
            index_address.display()
        )));
    }

    let dataset = Dataset::from_csv_path(&path)?;
    tracing::info!(
        data_index = data_index_name,
        rows = dataset.row_count(),
        columns = dataset.columns().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Replace the data store `data_index_name` with the contents of `csv_path`.
///
/// The CSV is parsed before anything is written, so a malformed file leaves the
/// existing store untouched. Returns the number of data rows.
pub async fn bootstrap_dataset(csv_path: &Path, index_address: &Path, data_index_name: &str) -> Result<usize> {
    let bytes = fs::read(csv_path).await?;
    let dataset = Dataset::from_reader(bytes.as_slice())?;

    let target = data_store_path(index_address, data_index_name);
    let directory = index_address.join(data_index_name);
    fs::create_dir_all(&directory).await?;

    let staging = directory.join(format!("{}.tmp", DATA_FILE_NAME));
    fs::write(&staging, &bytes).await?;
    fs::rename(&staging, &target).await?;

    tracing::info!(
        data_index = data_index_name,
        rows = dataset.row_count(),
        source = %csv_path.display(),
        "data store replaced"
    );
    Ok(dataset.row_count())
}

/// Read spec records from a JSON file holding one record or an array of records
pub async fn read_spec_file(path: &Path) -> Result<Vec<SpecRecord>> {
    let content = fs::read_to_string(path).await?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    let records = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<SpecRecord>, _>>()?,
        other => vec![serde_json::from_value(other)?],
    };

    if records.is_empty() {
        return Err(AppError::Serialization(format!(
            "{} contains no spec records",
            path.display()
        )));
    }
    Ok(records)
}

/// Upsert the spec records in `path` into `index`
pub async fn submit_spec_file(service: &SearchService, path: &Path, index: &str) -> Result<usize> {
    let records = read_spec_file(path).await?;
    Ok(service.submit(&records, index).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchConfigBuilder;
    use serde_json::json;
    use tempfile::TempDir;

    const CSV: &str = "order_id,price\no1,10\no2,12.5\n";

    #[tokio::test]
    async fn test_bootstrap_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("orders.csv");
        std::fs::write(&source, CSV).unwrap();

        let rows = bootstrap_dataset(&source, temp_dir.path(), "olist").await.unwrap();
        assert_eq!(rows, 2);

        let dataset = load_dataset(temp_dir.path(), "olist").unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.column_names(), vec!["order_id", "price"]);
    }

    #[tokio::test]
    async fn test_bootstrap_replaces_existing_store() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.csv");
        let second = temp_dir.path().join("second.csv");
        std::fs::write(&first, CSV).unwrap();
        std::fs::write(&second, "order_id,price\no9,1\n").unwrap();

        bootstrap_dataset(&first, temp_dir.path(), "olist").await.unwrap();
        bootstrap_dataset(&second, temp_dir.path(), "olist").await.unwrap();

        let dataset = load_dataset(temp_dir.path(), "olist").unwrap();
        assert_eq!(dataset.row_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_csv_keeps_store() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.csv");
        let bad = temp_dir.path().join("bad.csv");
        std::fs::write(&good, CSV).unwrap();
        std::fs::write(&bad, "order_id,price\no1,10,extra\n").unwrap();

        bootstrap_dataset(&good, temp_dir.path(), "olist").await.unwrap();
        let err = bootstrap_dataset(&bad, temp_dir.path(), "olist").await.unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));

        assert_eq!(load_dataset(temp_dir.path(), "olist").unwrap().row_count(), 2);
    }

    #[test]
    fn test_missing_store_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_dataset(temp_dir.path(), "olist").unwrap_err();
        assert!(matches!(err, AggregationError::DatasetUnavailable(_)));
        assert!(matches!(AppError::from(err), AppError::SearchUnavailable(_)));
    }

    #[tokio::test]
    async fn test_submit_spec_file_accepts_arrays() {
        let temp_dir = TempDir::new().unwrap();
        let service = SearchService::new(
            SearchConfigBuilder::new()
                .index_root(temp_dir.path().to_path_buf())
                .build(),
        );

        let spec = |id: &str| {
            json!({
                "spec_id": id,
                "title": format!("Spec {}", id),
                "description": "orders per month",
                "instructions": {
                    "type": "timeseries",
                    "dimensions": ["order_purchase_timestamp", "order_id"],
                    "time_field": "order_purchase_timestamp",
                    "time_unit": "month",
                    "agg_operation": "count"
                }
            })
        };
        let path = temp_dir.path().join("specs.json");
        std::fs::write(&path, json!([spec("a"), spec("b")]).to_string()).unwrap();

        let submitted = submit_spec_file(&service, &path, "directory").await.unwrap();
        assert_eq!(submitted, 2);
        assert_eq!(service.stats("directory").unwrap().total_documents, 2);
    }

    #[tokio::test]
    async fn test_invalid_spec_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spec.json");
        std::fs::write(&path, r#"{"spec_id": "a"}"#).unwrap();

        let err = read_spec_file(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
