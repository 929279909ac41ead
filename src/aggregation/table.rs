//! Aggregated tables and the chart views built from them

use crate::aggregation::dataset::Cell;
use crate::aggregation::error::{AggregationError, AggregationResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// File name offered for downloads
pub const DOWNLOAD_FILE_NAME: &str = "analysis.csv";

/// Result of an aggregation: the key column followed by aggregated columns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl AggregatedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> AggregationResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AggregationError::FieldNotFound(name.to_string()))
    }

    /// All values of a column, in row order
    pub fn column_values(&self, name: &str) -> AggregationResult<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Stable sort, largest first, nulls last
    pub(crate) fn sort_descending_by(&mut self, name: &str) -> AggregationResult<()> {
        let index = self.column_index(name)?;
        self.rows.sort_by(|a, b| match (&a[index], &b[index]) {
            (Cell::Null, Cell::Null) => std::cmp::Ordering::Equal,
            (Cell::Null, _) => std::cmp::Ordering::Greater,
            (_, Cell::Null) => std::cmp::Ordering::Less,
            (x, y) => y.total_cmp(x),
        });
        Ok(())
    }

    pub(crate) fn truncate(&mut self, limit: usize) {
        self.rows.truncate(limit);
    }

    /// One JSON object per row, keyed by column name
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell_to_json(cell)))
                    .collect();
                Value::Object(record)
            })
            .collect()
    }

    /// CSV with a header row and no index column
    pub fn to_csv(&self) -> AggregationResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| AggregationError::ExportFailed(format!("CSV header failed: {}", e)))?;

        for row in &self.rows {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(|e| AggregationError::ExportFailed(format!("CSV row failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AggregationError::ExportFailed(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AggregationError::ExportFailed(format!("CSV is not UTF-8: {}", e)))
    }

    /// `data:` URI carrying the CSV export
    pub fn download_link(&self) -> AggregationResult<String> {
        let csv = self.to_csv()?;
        Ok(format!("data:file/csv;base64,{}", STANDARD.encode(csv.as_bytes())))
    }
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Cell::Text(s) => Value::String(s.clone()),
    }
}

/// A selected spec together with its aggregated data
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub spec_id: String,
    pub title: String,
    pub description: String,
    pub table: AggregatedTable,
    /// Presentation hints stored with the spec
    pub specs: Value,
}

impl ChartView {
    /// Vega-Lite document: the stored hints with the table inlined as `data.values`
    pub fn to_vega_lite(&self) -> Value {
        let data = json!({ "values": self.table.to_records() });
        match &self.specs {
            Value::Object(hints) => {
                let mut document = hints.clone();
                document
                    .entry("title")
                    .or_insert_with(|| Value::String(self.title.clone()));
                document.insert("data".to_string(), data);
                Value::Object(document)
            }
            _ => json!({ "title": self.title, "data": data }),
        }
    }
}
