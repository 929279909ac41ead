//! Shared fixtures for integration tests
//!
//! Every helper works inside a caller-owned temporary directory so tests can
//! run in parallel without sharing index or data store state.

#![allow(dead_code)]

use datapages::aggregation::{AggregationInstructions, Dataset};
use datapages::config::Config;
use datapages::ingest::bootstrap_dataset;
use datapages::search::{SearchConfig, SearchService, SpecRecord};
use serde_json::json;
use std::path::Path;

/// Twelve orders from five sellers over ten consecutive days.
///
/// Seller revenue: s1 200, s5 170, s2 75, s3 55, s4 6.
pub const ORDERS_CSV: &str = "order_id,seller_id,price,order_purchase_timestamp\n\
o01,s1,100,2018-03-01 08:00:00\n\
o02,s2,50,2018-03-01 12:00:00\n\
o03,s3,20,2018-03-02 09:00:00\n\
o04,s4,5,2018-03-03 10:00:00\n\
o05,s5,80,2018-03-04 11:00:00\n\
o06,s1,40,2018-03-05 13:00:00\n\
o07,s2,10,2018-03-06 14:00:00\n\
o08,s3,35,2018-03-07 15:00:00\n\
o09,s4,1,2018-03-08 16:00:00\n\
o10,s5,90,2018-03-09 17:00:00\n\
o11,s1,60,2018-03-10 18:00:00\n\
o12,s2,15,2018-03-10 19:00:00\n";

/// Default configuration rooted at `root`
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.directory.index_address = root.to_path_buf();
    config
}

pub fn test_service(root: &Path) -> SearchService {
    SearchService::new(SearchConfig::from(&test_config(root)))
}

pub fn orders_dataset() -> Dataset {
    Dataset::from_reader(ORDERS_CSV.as_bytes()).unwrap()
}

pub fn spec(id: &str, title: &str, description: &str, instructions: AggregationInstructions) -> SpecRecord {
    SpecRecord {
        spec_id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        instructions,
        specs: json!({ "mark": "bar" }),
    }
}

pub fn top_sellers_spec() -> SpecRecord {
    spec(
        "top-sellers",
        "Top sellers",
        "Revenue per vendedor across all orders",
        AggregationInstructions::category(&["seller_id", "price"], "seller_id", "sum", "price"),
    )
}

pub fn daily_orders_spec() -> SpecRecord {
    spec(
        "daily-orders",
        "Daily orders",
        "Number of orders purchased each day",
        AggregationInstructions::timeseries(
            &["order_purchase_timestamp", "order_id"],
            "order_purchase_timestamp",
            "day",
            "count",
        ),
    )
}

pub fn count_by_seller_spec() -> SpecRecord {
    spec(
        "orders-per-seller",
        "Orders per seller",
        "Sellers with the most orders",
        AggregationInstructions::category(&["seller_id", "order_id"], "seller_id", "count", "order_id"),
    )
}

/// Write the orders dataset into the data store and submit `specs` to the directory
pub async fn seed(root: &Path, specs: &[SpecRecord]) -> Config {
    let config = test_config(root);

    let csv_path = root.join("orders.csv");
    std::fs::write(&csv_path, ORDERS_CSV).unwrap();
    bootstrap_dataset(&csv_path, &config.directory.index_address, &config.directory.data_index_name)
        .await
        .unwrap();

    test_service(root)
        .submit(specs, &config.directory.spec_index_name)
        .await
        .unwrap();

    config
}
