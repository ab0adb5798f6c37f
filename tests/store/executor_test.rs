use std::path::PathBuf;

use asksql::result::Value;
use asksql::sanitize::{sanitize, CandidateQuery, ValidatedQuery};
use asksql::schema::ColumnType;
use asksql::store::sample::seed_sample_sales;
use asksql::store::{ExecutionLimits, SqliteStore, Store, StoreError, Truncation};
use rusqlite::Connection;

fn validated(sql: &str) -> ValidatedQuery {
    sanitize(CandidateQuery::new(sql)).unwrap()
}

fn count_sales(store: &SqliteStore) -> i64 {
    let exec = store
        .execute(&validated("SELECT COUNT(*) AS n FROM sales"), &ExecutionLimits::default())
        .unwrap();
    match exec.result.rows()[0][0] {
        Value::Integer(n) => n,
        ref other => panic!("unexpected count: {other:?}"),
    }
}

/// A seeded database file removed on drop.
struct SeededFile(PathBuf);

impl SeededFile {
    fn create() -> Self {
        let path = std::env::temp_dir().join(format!("asksql-{}.db", uuid::Uuid::new_v4()));
        let conn = Connection::open(&path).unwrap();
        seed_sample_sales(&conn).unwrap();
        Self(path)
    }
}

impl Drop for SeededFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn test_grouped_query_types() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let exec = store
        .execute(
            &validated(
                "SELECT region, SUM(quantity * unit_price) AS revenue \
                 FROM sales GROUP BY region ORDER BY region",
            ),
            &ExecutionLimits::default(),
        )
        .unwrap();

    let result = &exec.result;
    assert_eq!(exec.truncation, None);
    assert_eq!(result.row_count(), 4);
    assert_eq!(result.columns()[0].column_type, ColumnType::Text);
    assert_eq!(result.columns()[1].column_type, ColumnType::Float);
    assert_eq!(result.rows()[0][0], Value::Text("East".into()));
}

#[test]
fn test_month_buckets_infer_datetime() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let exec = store
        .execute(
            &validated(
                "SELECT strftime('%Y-%m', order_date) AS month, SUM(quantity) AS units \
                 FROM sales GROUP BY month ORDER BY month",
            ),
            &ExecutionLimits::default(),
        )
        .unwrap();

    let result = &exec.result;
    assert_eq!(result.row_count(), 5);
    assert_eq!(result.columns()[0].column_type, ColumnType::DateTime);
    assert_eq!(result.columns()[1].column_type, ColumnType::Integer);
    assert_eq!(result.rows()[0][0], Value::Text("2024-01".into()));
    assert_eq!(result.rows()[0][1], Value::Integer(15));
}

#[test]
fn test_row_limit_truncates() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let limits = ExecutionLimits {
        row_limit: 3,
        ..ExecutionLimits::default()
    };

    let exec = store.execute(&validated("SELECT * FROM sales"), &limits).unwrap();

    assert_eq!(exec.result.row_count(), 3);
    assert!(exec.result.is_truncated());
    assert_eq!(exec.truncation, Some(Truncation::RowLimit(3)));
}

#[test]
fn test_row_limit_exactly_met_is_not_truncation() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let limits = ExecutionLimits {
        row_limit: 10,
        ..ExecutionLimits::default()
    };

    let exec = store.execute(&validated("SELECT * FROM sales"), &limits).unwrap();

    assert_eq!(exec.result.row_count(), 10);
    assert_eq!(exec.truncation, None);
    assert!(!exec.result.is_truncated());
}

#[test]
fn test_empty_result_keeps_columns() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let exec = store
        .execute(
            &validated("SELECT product, quantity FROM sales WHERE 1 = 0"),
            &ExecutionLimits::default(),
        )
        .unwrap();

    assert!(exec.result.is_empty());
    assert_eq!(exec.result.columns().len(), 2);
    assert_eq!(exec.result.columns()[1].column_type, ColumnType::Integer);
}

#[test]
fn test_unknown_column_is_execution_error() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let err = store
        .execute(&validated("SELECT revenue FROM sales"), &ExecutionLimits::default())
        .unwrap_err();

    match err {
        StoreError::Execution(msg) => assert!(msg.contains("no such column"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_writing_statement_refused_even_when_validated() {
    let store = SqliteStore::sample_in_memory().unwrap();
    // REPLACE is not on the keyword list, so this passes the sanitizer.
    let sneaky = validated(
        "WITH t AS (SELECT 'x' AS p) REPLACE INTO sales (product) SELECT p FROM t",
    );

    let err = store.execute(&sneaky, &ExecutionLimits::default()).unwrap_err();

    assert!(matches!(err, StoreError::Execution(_)));
    assert_eq!(count_sales(&store), 10);
}

#[test]
fn test_file_store_is_read_only() {
    let file = SeededFile::create();
    let store = SqliteStore::open(&file.0).unwrap();

    assert_eq!(count_sales(&store), 10);
    assert_eq!(store.introspect().unwrap().tables.len(), 1);
}
