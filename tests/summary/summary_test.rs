use asksql::result::{ResultColumn, ResultSet, Value};
use asksql::sanitize::{sanitize, CandidateQuery};
use asksql::schema::ColumnType;
use asksql::store::{ExecutionLimits, SqliteStore, Store};
use asksql::summary::summarize;

fn run(sql: &str) -> ResultSet {
    let store = SqliteStore::sample_in_memory().unwrap();
    let query = sanitize(CandidateQuery::new(sql)).unwrap();
    store.execute(&query, &ExecutionLimits::default()).unwrap().result
}

#[test]
fn test_empty_result() {
    let summary = summarize(&run("SELECT region, quantity FROM sales WHERE 1 = 0"));

    assert_eq!(summary.text, "0 rows returned");
    assert_eq!(summary.stats.row_count, 0);
    assert!(summary.stats.numeric.is_empty());
}

#[test]
fn test_revenue_by_region() {
    let summary = summarize(&run(
        "SELECT region, SUM(quantity * unit_price) AS revenue \
         FROM sales GROUP BY region ORDER BY region",
    ));

    assert_eq!(
        summary.text,
        "4 rows returned. The highest revenue is for North with 639.62. \
         The lowest is for West with 334.71. \
         There are 4 distinct region values in total."
    );

    let stats = &summary.stats;
    assert_eq!(stats.label_column.as_deref(), Some("region"));
    assert_eq!(stats.distinct_labels, Some(4));
    let revenue = &stats.numeric[0];
    assert_eq!(revenue.count, 4);
    assert!((revenue.sum - 1808.90).abs() < 1e-6);
    assert!((revenue.max - 639.62).abs() < 1e-6);
    assert!((revenue.min - 334.71).abs() < 1e-6);
}

#[test]
fn test_single_computed_value() {
    let summary = summarize(&run("SELECT SUM(quantity) AS units FROM sales"));

    assert_eq!(summary.text, "1 row returned. The computed value of units is 110.");
}

#[test]
fn test_unlabelled_numbers_get_totals() {
    let summary = summarize(&run("SELECT quantity FROM sales"));

    assert_eq!(
        summary.text,
        "10 rows returned. The total quantity is 110, ranging from 5 to 20 with a mean of 11.00."
    );
}

#[test]
fn test_text_only_result_counts_rows() {
    let summary = summarize(&run("SELECT DISTINCT region FROM sales"));

    assert_eq!(summary.text, "4 rows returned");
    assert_eq!(summary.stats.distinct_labels, Some(4));
}

#[test]
fn test_two_labelled_rows_skip_distinct_count() {
    let summary = summarize(&run(
        "SELECT category, SUM(quantity) AS units FROM sales GROUP BY category ORDER BY category",
    ));

    // Gadgets 62, Widgets 48
    assert_eq!(
        summary.text,
        "2 rows returned. The highest units is for Gadgets with 62. \
         The lowest is for Widgets with 48."
    );
}

#[test]
fn test_nulls_are_ignored_in_statistics() {
    let result = ResultSet::new(
        vec![
            ResultColumn::new("store", ColumnType::Text),
            ResultColumn::new("visits", ColumnType::Integer),
        ],
        vec![
            vec![Value::Text("A".into()), Value::Integer(1_200)],
            vec![Value::Text("B".into()), Value::Null],
            vec![Value::Null, Value::Integer(5)],
        ],
    )
    .unwrap();

    let summary = summarize(&result);
    let visits = &summary.stats.numeric[0];
    assert_eq!(visits.count, 2);
    assert_eq!(summary.stats.distinct_labels, Some(2));

    // Only row A has both a label and a value.
    assert_eq!(
        summary.text,
        "3 rows returned. The highest visits is for A with 1,200. \
         There are 2 distinct store values in total."
    );
}
