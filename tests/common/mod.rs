use scorebook::runner::data::{
    CATEGORY_NAMES_FILE, ITEM_CATEGORIES_FILE, SALES_HISTORY_FILE, SAMPLE_SUBMISSION_FILE,
    TEST_FILE,
};
use std::path::Path;

/// Write a tiny but complete set of competition tables into `data_dir`.
///
/// Store 1 sells ~10 of item 100 per month, store 2 sells ~1 of item 200.
pub fn write_tables(data_dir: &Path) {
    std::fs::create_dir_all(data_dir).unwrap();

    let mut sales = String::from("日付,店舗ID,商品ID,商品価格,売上個数\n");
    for month in 1..=11 {
        sales.push_str(&format!("2022-{month:02}-05,1,100,500,6\n"));
        sales.push_str(&format!("2022-{month:02}-20,1,100,500,4\n"));
        sales.push_str(&format!("2022-{month:02}-11,2,200,120,1\n"));
    }
    std::fs::write(data_dir.join(SALES_HISTORY_FILE), sales).unwrap();
    std::fs::write(
        data_dir.join(ITEM_CATEGORIES_FILE),
        "商品ID,商品カテゴリID\n100,1\n200,2\n",
    )
    .unwrap();
    std::fs::write(
        data_dir.join(CATEGORY_NAMES_FILE),
        "商品カテゴリID,商品カテゴリ名\n1,飲料\n2,雑貨\n",
    )
    .unwrap();
    std::fs::write(data_dir.join(TEST_FILE), "index,商品ID,店舗ID\n0,100,1\n1,200,2\n").unwrap();
    std::fs::write(data_dir.join(SAMPLE_SUBMISSION_FILE), "0,0\n1,0\n").unwrap();
}
