//! Aggregation instructions carried by every spec record

use crate::aggregation::error::{AggregationError, AggregationResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// How rows are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PlotType {
    /// Time buckets over a timestamp column
    Timeseries,
    /// Groups keyed by a categorical column
    Category,
}

/// Bucket granularity for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    Month,
    Day,
}

/// Reduction applied to every group
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AggOperation {
    Count,
    Sum,
    Mean,
    Median,
}

/// Instructions as stored alongside a spec.
///
/// Fields are kept as plain strings so that records with unsupported values
/// can still be indexed and listed; [`AggregationInstructions::validate`] turns
/// them into a typed form and reports what is wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationInstructions {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_operation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_field: Option<String>,
}

/// Grouping portion of validated instructions
#[derive(Debug, Clone, PartialEq)]
pub enum Grouping {
    Timeseries { time_field: String, time_unit: TimeUnit },
    Category { cat_field: String, agg_field: String },
}

impl Grouping {
    pub fn plot_type(&self) -> PlotType {
        match self {
            Grouping::Timeseries { .. } => PlotType::Timeseries,
            Grouping::Category { .. } => PlotType::Category,
        }
    }

    /// Column the groups are keyed by
    pub fn key_field(&self) -> &str {
        match self {
            Grouping::Timeseries { time_field, .. } => time_field,
            Grouping::Category { cat_field, .. } => cat_field,
        }
    }
}

/// Instructions with every required field present and every enum value supported
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInstructions {
    pub dimensions: Vec<String>,
    pub grouping: Grouping,
    pub operation: AggOperation,
}

impl AggregationInstructions {
    /// Time series instructions
    pub fn timeseries(
        dimensions: &[&str],
        time_field: &str,
        time_unit: &str,
        agg_operation: &str,
    ) -> Self {
        Self {
            plot_type: Some(PlotType::Timeseries.to_string()),
            dimensions: Some(dimensions.iter().map(|d| d.to_string()).collect()),
            time_field: Some(time_field.to_string()),
            time_unit: Some(time_unit.to_string()),
            agg_operation: Some(agg_operation.to_string()),
            ..Default::default()
        }
    }

    /// Category instructions
    pub fn category(
        dimensions: &[&str],
        cat_field: &str,
        agg_operation: &str,
        agg_field: &str,
    ) -> Self {
        Self {
            plot_type: Some(PlotType::Category.to_string()),
            dimensions: Some(dimensions.iter().map(|d| d.to_string()).collect()),
            cat_field: Some(cat_field.to_string()),
            agg_operation: Some(agg_operation.to_string()),
            agg_field: Some(agg_field.to_string()),
            ..Default::default()
        }
    }

    /// Check required fields and parse enum values
    pub fn validate(&self) -> AggregationResult<ValidatedInstructions> {
        let raw_type = self.plot_type.as_deref().ok_or_else(|| AggregationError::MissingInstruction {
            plot_type: "instructions".to_string(),
            field: "type".to_string(),
        })?;
        let plot_type = PlotType::from_str(raw_type)
            .map_err(|_| AggregationError::UnsupportedPlotType(raw_type.to_string()))?;

        let dimensions = require(plot_type, "dimensions", self.dimensions.as_ref())?.clone();

        let grouping = match plot_type {
            PlotType::Timeseries => {
                let time_field = require(plot_type, "time_field", self.time_field.as_ref())?;
                let raw_unit = require(plot_type, "time_unit", self.time_unit.as_ref())?;
                let time_unit = TimeUnit::from_str(raw_unit)
                    .map_err(|_| AggregationError::UnsupportedTimeUnit(raw_unit.clone()))?;
                Grouping::Timeseries {
                    time_field: time_field.clone(),
                    time_unit,
                }
            }
            PlotType::Category => Grouping::Category {
                cat_field: require(plot_type, "cat_field", self.cat_field.as_ref())?.clone(),
                agg_field: require(plot_type, "agg_field", self.agg_field.as_ref())?.clone(),
            },
        };

        let raw_operation = require(plot_type, "agg_operation", self.agg_operation.as_ref())?;
        let operation = AggOperation::from_str(raw_operation)
            .map_err(|_| AggregationError::UnsupportedAggregation(raw_operation.clone()))?;

        Ok(ValidatedInstructions {
            dimensions,
            grouping,
            operation,
        })
    }
}

fn require<'a, T>(plot_type: PlotType, field: &str, value: Option<&'a T>) -> AggregationResult<&'a T> {
    value.ok_or_else(|| AggregationError::MissingInstruction {
        plot_type: plot_type.to_string(),
        field: field.to_string(),
    })
}
