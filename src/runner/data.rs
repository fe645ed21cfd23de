//! Input tables for the sales-forecast experiment.
//!
//! All tables are plain comma separated files without quoting. Columns are
//! located by header name so extra columns are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, ScorebookError};

pub const SALES_HISTORY_FILE: &str = "sales_history.csv";
pub const ITEM_CATEGORIES_FILE: &str = "item_categories.csv";
pub const CATEGORY_NAMES_FILE: &str = "category_names.csv";
pub const TEST_FILE: &str = "test.csv";
pub const SAMPLE_SUBMISSION_FILE: &str = "sample_submission.csv";

pub const DATE_COLUMN: &str = "日付";
pub const ITEM_ID_COLUMN: &str = "商品ID";
pub const STORE_ID_COLUMN: &str = "店舗ID";
pub const UNITS_SOLD_COLUMN: &str = "売上個数";
pub const CATEGORY_ID_COLUMN: &str = "商品カテゴリID";

/// Raw rows of a CSV file
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Read a CSV file. With `has_header` the first non-empty line names the columns.
    pub fn read<P: AsRef<Path>>(path: P, has_header: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut table = CsvTable::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = if i == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line.as_str()
            };
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
            if has_header && table.headers.is_empty() {
                table.headers = fields;
                continue;
            }

            if has_header && fields.len() < table.headers.len() {
                warn!(
                    "Skipping malformed line {} of {:?}: insufficient columns",
                    i + 1,
                    path
                );
                continue;
            }
            table.rows.push(fields);
        }

        Ok(table)
    }

    /// Index of a named column
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ScorebookError::MalformedData(format!("missing column {name}")))
    }
}

/// One row of daily sales
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// `YYYY-MM-DD`
    pub date: String,
    pub item_id: i64,
    pub store_id: i64,
    pub units_sold: f64,
}

/// One (item, store) pair to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRow {
    pub item_id: i64,
    pub store_id: i64,
}

/// Every table the experiment reads
#[derive(Debug, Clone)]
pub struct InputTables {
    pub sales: Vec<SalesRecord>,
    /// item id -> category id
    pub item_categories: HashMap<i64, i64>,
    pub category_count: usize,
    pub test: Vec<TestRow>,
    /// Headerless template; column 1 is replaced by predictions
    pub submission_template: Vec<Vec<String>>,
}

impl InputTables {
    pub fn paths(data_dir: &Path) -> [PathBuf; 5] {
        [
            data_dir.join(SALES_HISTORY_FILE),
            data_dir.join(ITEM_CATEGORIES_FILE),
            data_dir.join(CATEGORY_NAMES_FILE),
            data_dir.join(TEST_FILE),
            data_dir.join(SAMPLE_SUBMISSION_FILE),
        ]
    }

    /// Load all tables, failing on the first missing file before reading any
    pub fn load(data_dir: &Path) -> Result<Self> {
        let paths = Self::paths(data_dir);
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(ScorebookError::MissingInput {
                path: missing.clone(),
            });
        }
        let [sales_path, categories_path, names_path, test_path, submission_path] = paths;

        let tables = Self {
            sales: load_sales(&sales_path)?,
            item_categories: load_item_categories(&categories_path)?,
            category_count: CsvTable::read(&names_path, true)?.rows.len(),
            test: load_test_rows(&test_path)?,
            submission_template: CsvTable::read(&submission_path, false)?.rows,
        };

        info!(
            "Loaded {} sales rows, {} item categories, {} category names, {} test rows, {} template rows",
            tables.sales.len(),
            tables.item_categories.len(),
            tables.category_count,
            tables.test.len(),
            tables.submission_template.len()
        );
        Ok(tables)
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, column: &str, line: usize) -> Result<T> {
    raw.parse().map_err(|_| {
        ScorebookError::MalformedData(format!("invalid {column} {raw:?} in data row {line}"))
    })
}

/// Load `sales_history.csv`
pub fn load_sales<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
    let table = CsvTable::read(path, true)?;
    let date = table.column(DATE_COLUMN)?;
    let item = table.column(ITEM_ID_COLUMN)?;
    let store = table.column(STORE_ID_COLUMN)?;
    let units = table.column(UNITS_SOLD_COLUMN)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(SalesRecord {
                date: row[date].clone(),
                item_id: parse_field(&row[item], ITEM_ID_COLUMN, i + 1)?,
                store_id: parse_field(&row[store], STORE_ID_COLUMN, i + 1)?,
                units_sold: parse_field(&row[units], UNITS_SOLD_COLUMN, i + 1)?,
            })
        })
        .collect()
}

/// Load `item_categories.csv` as an item -> category map
pub fn load_item_categories<P: AsRef<Path>>(path: P) -> Result<HashMap<i64, i64>> {
    let table = CsvTable::read(path, true)?;
    let item = table.column(ITEM_ID_COLUMN)?;
    let category = table.column(CATEGORY_ID_COLUMN)?;

    let mut map = HashMap::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let item_id = parse_field(&row[item], ITEM_ID_COLUMN, i + 1)?;
        let category_id = parse_field(&row[category], CATEGORY_ID_COLUMN, i + 1)?;
        map.insert(item_id, category_id);
    }
    Ok(map)
}

/// Load `test.csv`
pub fn load_test_rows<P: AsRef<Path>>(path: P) -> Result<Vec<TestRow>> {
    let table = CsvTable::read(path, true)?;
    let item = table.column(ITEM_ID_COLUMN)?;
    let store = table.column(STORE_ID_COLUMN)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(TestRow {
                item_id: parse_field(&row[item], ITEM_ID_COLUMN, i + 1)?,
                store_id: parse_field(&row[store], STORE_ID_COLUMN, i + 1)?,
            })
        })
        .collect()
}
