//! Integration tests for dataset aggregation

mod common;

use common::orders_dataset;
use datapages::aggregation::*;

fn keys(table: &AggregatedTable, column: &str) -> Vec<String> {
    table
        .column_values(column)
        .unwrap()
        .iter()
        .map(|cell| cell.to_string())
        .collect()
}

#[test]
fn test_category_sum_top_three() {
    let instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price");
    let handle = plan(&instructions, &orders_dataset()).unwrap();
    let table = aggregate(&handle, &instructions, 3).unwrap();

    assert_eq!(table.columns(), &["seller_id", "price"]);
    assert_eq!(keys(&table, "seller_id"), vec!["s1", "s5", "s2"]);
    assert_eq!(keys(&table, "price"), vec!["200", "170", "75"]);
}

#[test]
fn test_category_output_is_non_increasing() {
    let instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "median", "price");
    let handle = plan(&instructions, &orders_dataset()).unwrap();
    let table = aggregate(&handle, &instructions, 10).unwrap();

    let values: Vec<f64> = table
        .column_values("price")
        .unwrap()
        .iter()
        .map(|cell| cell.as_number().unwrap())
        .collect();
    assert_eq!(values.len(), 5);
    assert!(values.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn test_daily_count_has_one_bucket_per_day() {
    let instructions = AggregationInstructions::timeseries(
        &["order_purchase_timestamp", "order_id"],
        "order_purchase_timestamp",
        "day",
        "count",
    );
    let handle = plan(&instructions, &orders_dataset()).unwrap();
    assert_eq!(handle.kind(), GroupingKind::TimeBuckets(TimeUnit::Day));

    // A limit smaller than the bucket count leaves time series untouched
    let table = aggregate(&handle, &instructions, 3).unwrap();
    let days = keys(&table, "order_purchase_timestamp");
    assert_eq!(days.len(), 10);
    assert_eq!(days.first().unwrap(), "2018-03-01");
    assert_eq!(days.last().unwrap(), "2018-03-10");

    let mut sorted = days.clone();
    sorted.sort();
    assert_eq!(days, sorted);

    let counts = keys(&table, "order_id");
    assert_eq!(counts[0], "2");
    assert_eq!(counts[1], "1");
    assert_eq!(counts[9], "2");
}

#[test]
fn test_monthly_bucket_uses_month_end_label() {
    let instructions = AggregationInstructions::timeseries(
        &["order_purchase_timestamp", "price"],
        "order_purchase_timestamp",
        "month",
        "sum",
    );
    let handle = plan(&instructions, &orders_dataset()).unwrap();
    let table = aggregate(&handle, &instructions, 10).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(
        table.rows()[0],
        vec![Cell::Text("2018-03-31".to_string()), Cell::Number(506.0)]
    );
}

#[test]
fn test_aggregate_is_idempotent() {
    let instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "mean", "price");
    let handle = plan(&instructions, &orders_dataset()).unwrap();

    let first = aggregate(&handle, &instructions, 4).unwrap();
    let second = aggregate(&handle, &instructions, 4).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_year_time_unit_is_unsupported() {
    let instructions = AggregationInstructions::timeseries(
        &["order_purchase_timestamp", "order_id"],
        "order_purchase_timestamp",
        "year",
        "count",
    );
    let err = plan(&instructions, &orders_dataset()).unwrap_err();
    assert!(matches!(err, AggregationError::UnsupportedTimeUnit(unit) if unit == "year"));
}

#[test]
fn test_mode_is_unsupported_at_both_stages() {
    let valid = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price");
    let mut mode = valid.clone();
    mode.agg_operation = Some("mode".to_string());

    assert!(matches!(
        plan(&mode, &orders_dataset()),
        Err(AggregationError::UnsupportedAggregation(_))
    ));

    let handle = plan(&valid, &orders_dataset()).unwrap();
    assert!(matches!(
        aggregate(&handle, &mode, 10),
        Err(AggregationError::UnsupportedAggregation(_))
    ));
}

#[test]
fn test_unknown_plot_type() {
    let mut instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price");
    instructions.plot_type = Some("scatter".to_string());
    assert!(matches!(
        plan(&instructions, &orders_dataset()),
        Err(AggregationError::UnsupportedPlotType(_))
    ));
}

#[test]
fn test_dimension_absent_from_dataset() {
    let instructions = AggregationInstructions::category(
        &["seller_id", "freight_value"],
        "seller_id",
        "sum",
        "freight_value",
    );
    let err = plan(&instructions, &orders_dataset()).unwrap_err();
    assert!(matches!(err, AggregationError::FieldNotFound(name) if name == "freight_value"));
}

#[test]
fn test_missing_category_field() {
    let mut instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price");
    instructions.cat_field = None;
    assert!(matches!(
        plan(&instructions, &orders_dataset()),
        Err(AggregationError::MissingInstruction { .. })
    ));
}

#[test]
fn test_table_exports() {
    let instructions = AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price");
    let handle = plan(&instructions, &orders_dataset()).unwrap();
    let table = aggregate(&handle, &instructions, 2).unwrap();

    assert_eq!(table.to_csv().unwrap(), "seller_id,price\ns1,200\ns5,170\n");
    assert!(table.download_link().unwrap().starts_with("data:file/csv;base64,"));

    let records = table.to_records();
    assert_eq!(records[0]["seller_id"], "s1");
    assert_eq!(records[0]["price"], 200.0);
}
