//! Grouping and reduction of a dataset according to a spec's instructions

use crate::aggregation::dataset::{Cell, Column, ColumnKind, Dataset};
use crate::aggregation::error::{AggregationError, AggregationResult};
use crate::aggregation::instructions::{AggOperation, AggregationInstructions, Grouping, PlotType, TimeUnit};
use crate::aggregation::statistics;
use crate::aggregation::table::AggregatedTable;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Date format used for time bucket labels
pub const BUCKET_LABEL_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Bucketing applied to the projected rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKind {
    TimeBuckets(TimeUnit),
    Categories,
}

impl GroupingKind {
    fn plot_type(&self) -> PlotType {
        match self {
            GroupingKind::TimeBuckets(_) => PlotType::Timeseries,
            GroupingKind::Categories => PlotType::Category,
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    key: Cell,
    rows: Vec<usize>,
}

/// Projected rows partitioned into ordered groups, ready to be reduced
#[derive(Debug, Clone)]
pub struct GroupingHandle {
    kind: GroupingKind,
    key_field: String,
    columns: Vec<Column>,
    groups: Vec<Group>,
}

impl GroupingHandle {
    pub fn kind(&self) -> GroupingKind {
        self.kind
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group keys in output order before any sorting
    pub fn keys(&self) -> Vec<&Cell> {
        self.groups.iter().map(|g| &g.key).collect()
    }
}

/// Project the dataset to the instructed dimensions and group it.
///
/// Time series rows fall into contiguous month or day buckets covering the
/// earliest through the latest timestamp; empty buckets in between are kept.
/// Categories are grouped by exact value in ascending key order. Rows with
/// an empty key are dropped.
pub fn plan(instructions: &AggregationInstructions, dataset: &Dataset) -> AggregationResult<GroupingHandle> {
    let validated = instructions.validate()?;
    let projected = dataset.project(&validated.dimensions)?;

    let handle = match &validated.grouping {
        Grouping::Timeseries { time_field, time_unit } => plan_time_buckets(&projected, time_field, *time_unit)?,
        Grouping::Category { cat_field, .. } => plan_categories(&projected, cat_field)?,
    };

    tracing::debug!(
        plot_type = %validated.grouping.plot_type(),
        key = handle.key_field.as_str(),
        rows = projected.row_count(),
        groups = handle.groups.len(),
        "grouping planned"
    );

    Ok(handle)
}

/// Reduce every group with the instructed operation.
///
/// `count` covers every non-key column; `sum`, `mean` and `median` cover numeric
/// non-key columns only. Category results are then ordered by `agg_field`,
/// largest first, and cut to `limit` rows. Time series keep every bucket in
/// chronological order regardless of `limit`.
pub fn aggregate(
    handle: &GroupingHandle,
    instructions: &AggregationInstructions,
    limit: usize,
) -> AggregationResult<AggregatedTable> {
    if limit == 0 {
        return Err(AggregationError::InvalidConfiguration(
            "chart limit must be a positive integer".to_string(),
        ));
    }

    let validated = instructions.validate()?;
    if validated.grouping.plot_type() != handle.kind.plot_type() {
        return Err(AggregationError::InstructionMismatch(format!(
            "grouping was planned for {} but instructions are {}",
            handle.kind.plot_type(),
            validated.grouping.plot_type()
        )));
    }
    if validated.grouping.key_field() != handle.key_field {
        return Err(AggregationError::InstructionMismatch(format!(
            "grouping is keyed by '{}' but instructions name '{}'",
            handle.key_field,
            validated.grouping.key_field()
        )));
    }

    let operation = validated.operation;
    let value_columns: Vec<&Column> = handle
        .columns
        .iter()
        .filter(|c| c.name != handle.key_field)
        .filter(|c| operation == AggOperation::Count || c.kind == ColumnKind::Numeric)
        .collect();

    let mut names = Vec::with_capacity(value_columns.len() + 1);
    names.push(handle.key_field.clone());
    names.extend(value_columns.iter().map(|c| c.name.clone()));
    let mut table = AggregatedTable::new(names);

    for group in &handle.groups {
        let mut row = Vec::with_capacity(value_columns.len() + 1);
        row.push(group.key.clone());
        for column in &value_columns {
            row.push(reduce(operation, column, &group.rows));
        }
        table.push_row(row);
    }

    if let Grouping::Category { agg_field, .. } = &validated.grouping {
        table.sort_descending_by(agg_field)?;
        table.truncate(limit);
    }

    tracing::debug!(
        operation = %operation,
        columns = table.columns().len(),
        rows = table.len(),
        "aggregation completed"
    );

    Ok(table)
}

fn reduce(operation: AggOperation, column: &Column, rows: &[usize]) -> Cell {
    match operation {
        AggOperation::Count => Cell::Number(rows.len() as f64),
        AggOperation::Sum => Cell::Number(statistics::sum(&column.numbers_at(rows))),
        AggOperation::Mean => statistics::mean(&column.numbers_at(rows)).map_or(Cell::Null, Cell::Number),
        AggOperation::Median => statistics::median(&column.numbers_at(rows)).map_or(Cell::Null, Cell::Number),
    }
}

fn plan_time_buckets(projected: &Dataset, time_field: &str, unit: TimeUnit) -> AggregationResult<GroupingHandle> {
    let column = projected.column(time_field)?;

    let mut stamped: Vec<(NaiveDate, usize)> = Vec::new();
    for (row, cell) in column.values.iter().enumerate() {
        let date = match cell {
            Cell::Null => continue,
            other => {
                let raw = other.to_string();
                parse_timestamp(&raw)
                    .ok_or_else(|| AggregationError::InvalidTimestamp {
                        field: time_field.to_string(),
                        value: raw,
                    })?
                    .date()
            }
        };
        stamped.push((bucket_of(date, unit), row));
    }

    let mut groups = Vec::new();
    if let (Some(first), Some(last)) = (
        stamped.iter().map(|(d, _)| *d).min(),
        stamped.iter().map(|(d, _)| *d).max(),
    ) {
        let mut positions: HashMap<NaiveDate, usize> = HashMap::new();
        let mut bucket = first;
        loop {
            positions.insert(bucket, groups.len());
            groups.push(Group {
                key: Cell::Text(bucket.format(BUCKET_LABEL_FORMAT).to_string()),
                rows: Vec::new(),
            });
            if bucket >= last {
                break;
            }
            bucket = match next_bucket(bucket, unit) {
                Some(next) => next,
                None => break,
            };
        }

        for (date, row) in stamped {
            if let Some(&position) = positions.get(&date) {
                groups[position].rows.push(row);
            }
        }
    }

    Ok(GroupingHandle {
        kind: GroupingKind::TimeBuckets(unit),
        key_field: time_field.to_string(),
        columns: projected.columns().to_vec(),
        groups,
    })
}

fn plan_categories(projected: &Dataset, cat_field: &str) -> AggregationResult<GroupingHandle> {
    let column = projected.column(cat_field)?;

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (row, cell) in column.values.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        let position = *positions.entry(cell.to_string()).or_insert_with(|| {
            groups.push(Group {
                key: cell.clone(),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].rows.push(row);
    }
    groups.sort_by(|a, b| a.key.total_cmp(&b.key));

    Ok(GroupingHandle {
        kind: GroupingKind::Categories,
        key_field: cat_field.to_string(),
        columns: projected.columns().to_vec(),
        groups,
    })
}

/// Parse the timestamp layouts found in exported order data
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Bucket label date: the day itself, or the last day of its month
fn bucket_of(date: NaiveDate, unit: TimeUnit) -> NaiveDate {
    match unit {
        TimeUnit::Day => date,
        TimeUnit::Month => month_end(date.year(), date.month()).unwrap_or(date),
    }
}

fn next_bucket(bucket: NaiveDate, unit: TimeUnit) -> Option<NaiveDate> {
    match unit {
        TimeUnit::Day => bucket.succ_opt(),
        TimeUnit::Month => {
            let (year, month) = if bucket.month() == 12 {
                (bucket.year() + 1, 1)
            } else {
                (bucket.year(), bucket.month() + 1)
            };
            month_end(year, month)
        }
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
