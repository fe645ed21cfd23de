use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::data::{SalesRecord, TestRow};
use crate::error::{Result, ScorebookError};

/// Feature order shared by the training and test matrices
pub const FEATURE_COLUMNS: [&str; 5] = ["店舗ID", "商品ID", "年", "月", "商品カテゴリID"];

/// Category assigned to items absent from the category table
pub const UNKNOWN_CATEGORY: i64 = -1;

/// Aggregation key: (item, store, year, month)
pub type MonthKey = (i64, i64, i32, u32);

/// Feature rows with their regression targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Rows whose item had no category
    pub unknown_categories: usize,
}

/// Split a `YYYY-MM-DD` date into (year, month)
pub fn parse_year_month(date: &str) -> Result<(i32, u32)> {
    let mut parts = date.split('-');
    let (Some(year), Some(month)) = (parts.next(), parts.next()) else {
        return Err(ScorebookError::MalformedData(format!(
            "date {date:?} is not YYYY-MM-DD"
        )));
    };

    let year = year
        .trim()
        .parse()
        .map_err(|_| ScorebookError::MalformedData(format!("invalid year in date {date:?}")))?;
    let month = month
        .trim()
        .parse()
        .map_err(|_| ScorebookError::MalformedData(format!("invalid month in date {date:?}")))?;
    Ok((year, month))
}

/// Total units sold per (item, store, year, month), keys ascending
pub fn aggregate_monthly(sales: &[SalesRecord]) -> Result<BTreeMap<MonthKey, f64>> {
    let mut monthly = BTreeMap::new();
    for record in sales {
        let (year, month) = parse_year_month(&record.date)?;
        *monthly
            .entry((record.item_id, record.store_id, year, month))
            .or_insert(0.0) += record.units_sold;
    }
    debug!(
        "Aggregated {} sales rows into {} monthly rows",
        sales.len(),
        monthly.len()
    );
    Ok(monthly)
}

fn category_of(categories: &HashMap<i64, i64>, item_id: i64, unknown: &mut usize) -> i64 {
    match categories.get(&item_id) {
        Some(category) => *category,
        None => {
            *unknown += 1;
            UNKNOWN_CATEGORY
        }
    }
}

fn feature_row(store_id: i64, item_id: i64, year: i32, month: u32, category: i64) -> Vec<f64> {
    vec![
        store_id as f64,
        item_id as f64,
        year as f64,
        month as f64,
        category as f64,
    ]
}

/// Monthly training rows joined with item categories
pub fn build_training_set(
    sales: &[SalesRecord],
    categories: &HashMap<i64, i64>,
) -> Result<TrainingSet> {
    let monthly = aggregate_monthly(sales)?;
    let mut set = TrainingSet {
        features: Vec::with_capacity(monthly.len()),
        targets: Vec::with_capacity(monthly.len()),
        unknown_categories: 0,
    };

    for ((item_id, store_id, year, month), units) in monthly {
        let category = category_of(categories, item_id, &mut set.unknown_categories);
        set.features
            .push(feature_row(store_id, item_id, year, month, category));
        set.targets.push(units);
    }

    if set.unknown_categories > 0 {
        warn!(
            "{} training rows have no category, using {}",
            set.unknown_categories, UNKNOWN_CATEGORY
        );
    }
    Ok(set)
}

/// Test rows stamped with the forecast month and joined with item categories
pub fn build_test_features(
    test: &[TestRow],
    categories: &HashMap<i64, i64>,
    year: i32,
    month: u32,
) -> Vec<Vec<f64>> {
    let mut unknown = 0;
    let rows: Vec<Vec<f64>> = test
        .iter()
        .map(|row| {
            let category = category_of(categories, row.item_id, &mut unknown);
            feature_row(row.store_id, row.item_id, year, month, category)
        })
        .collect();

    if unknown > 0 {
        warn!(
            "{} test rows have no category, using {}",
            unknown, UNKNOWN_CATEGORY
        );
    }
    rows
}
