//! In-memory tabular dataset explored by the aggregation engine

use crate::aggregation::error::{AggregationError, AggregationResult};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A single value in a dataset or aggregated table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Total order used for grouping and sorting: numbers, then text, then nulls
    pub fn total_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Number(_), _) => Ordering::Less,
            (_, Cell::Number(_)) => Ordering::Greater,
            (Cell::Text(_), Cell::Null) => Ordering::Less,
            (Cell::Null, Cell::Text(_)) => Ordering::Greater,
            (Cell::Null, Cell::Null) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every non-empty value parses as a number
    Numeric,
    Text,
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Cell>,
}

impl Column {
    /// Build a column from raw strings, inferring its kind
    pub fn from_raw(name: impl Into<String>, raw: Vec<String>) -> Self {
        let non_empty: Vec<&str> = raw.iter().map(|v| v.trim()).filter(|v| !v.is_empty()).collect();
        let numeric = !non_empty.is_empty() && non_empty.iter().all(|v| v.parse::<f64>().is_ok());

        let values = raw
            .into_iter()
            .map(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Cell::Null
                } else if numeric {
                    trimmed.parse::<f64>().map(Cell::Number).unwrap_or(Cell::Null)
                } else {
                    Cell::Text(value)
                }
            })
            .collect();

        Self {
            name: name.into(),
            kind: if numeric { ColumnKind::Numeric } else { ColumnKind::Text },
            values,
        }
    }

    /// Non-null numeric values at the given rows
    pub fn numbers_at(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter()
            .filter_map(|&row| self.values.get(row).and_then(Cell::as_number))
            .collect()
    }
}

/// Read-only table of named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from a header row and string records
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> AggregationResult<Self> {
        let row_count = records.len();
        let mut raw: Vec<Vec<String>> = vec![Vec::with_capacity(row_count); headers.len()];

        for (line, record) in records.into_iter().enumerate() {
            if record.len() != headers.len() {
                return Err(AggregationError::Dataset(format!(
                    "record {} has {} fields, expected {}",
                    line + 1,
                    record.len(),
                    headers.len()
                )));
            }
            for (column, value) in raw.iter_mut().zip(record) {
                column.push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column::from_raw(name, values))
            .collect();

        Ok(Self { columns, row_count })
    }

    /// Parse CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> AggregationResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Self::from_records(headers, records)
    }

    /// Parse a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> AggregationResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AggregationError::Dataset(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> AggregationResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AggregationError::FieldNotFound(name.to_string()))
    }

    /// Copy of the dataset restricted to `dimensions`, in that order
    pub fn project(&self, dimensions: &[String]) -> AggregationResult<Dataset> {
        let columns = dimensions
            .iter()
            .map(|name| self.column(name).cloned())
            .collect::<AggregationResult<Vec<_>>>()?;

        Ok(Dataset {
            columns,
            row_count: self.row_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = "order_id,seller_id,price,purchased_at\n\
                          o1,s1,10.5,2018-01-03 10:00:00\n\
                          o2,s2,,2018-01-04 11:30:00\n\
                          o3,s1,4,2018-02-01 09:15:00\n";

    #[test]
    fn test_csv_kinds_are_inferred() {
        let dataset = Dataset::from_reader(ORDERS.as_bytes()).unwrap();
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column("price").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(dataset.column("seller_id").unwrap().kind, ColumnKind::Text);
        assert_eq!(dataset.column("price").unwrap().values[1], Cell::Null);
    }

    #[test]
    fn test_projection_keeps_dimension_order() {
        let dataset = Dataset::from_reader(ORDERS.as_bytes()).unwrap();
        let projected = dataset
            .project(&["price".to_string(), "order_id".to_string()])
            .unwrap();
        assert_eq!(projected.column_names(), vec!["price", "order_id"]);
        assert_eq!(projected.row_count(), 3);
    }

    #[test]
    fn test_projection_of_missing_column() {
        let dataset = Dataset::from_reader(ORDERS.as_bytes()).unwrap();
        let err = dataset.project(&["freight_value".to_string()]).unwrap_err();
        assert!(matches!(err, AggregationError::FieldNotFound(name) if name == "freight_value"));
    }

    #[test]
    fn test_ragged_records_are_rejected() {
        let err = Dataset::from_records(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["1".to_string()]],
        )
        .unwrap_err();
        assert!(matches!(err, AggregationError::Dataset(_)));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Text("s1".to_string()).to_string(), "s1");
    }

    #[test]
    fn test_cell_ordering() {
        let mut cells = vec![
            Cell::Null,
            Cell::Text("b".to_string()),
            Cell::Number(2.0),
            Cell::Text("a".to_string()),
            Cell::Number(-1.0),
        ];
        cells.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            cells,
            vec![
                Cell::Number(-1.0),
                Cell::Number(2.0),
                Cell::Text("a".to_string()),
                Cell::Text("b".to_string()),
                Cell::Null,
            ]
        );
    }
}
