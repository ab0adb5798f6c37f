use asksql::prompt::{render_schema, NO_TABLES};
use asksql::schema::ColumnType;
use asksql::store::{SqliteStore, Store, StoreError};
use insta::assert_snapshot;
use rusqlite::Connection;

fn store_with(ddl: &str) -> SqliteStore {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(ddl).unwrap();
    SqliteStore::from_connection(conn)
}

#[test]
fn test_sample_store_schema() {
    let store = SqliteStore::sample_in_memory().unwrap();
    let schema = store.introspect().unwrap();

    assert_eq!(schema.tables.len(), 1);
    let sales = schema.table("sales").unwrap();
    let names: Vec<_> = sales.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["order_date", "product", "category", "region", "quantity", "unit_price"]
    );

    assert_eq!(schema.column_type("sales", "order_date"), Some(ColumnType::DateTime));
    assert_eq!(schema.column_type("sales", "region"), Some(ColumnType::Text));
    assert_eq!(schema.column_type("sales", "quantity"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("sales", "unit_price"), Some(ColumnType::Float));
}

#[test]
fn test_constraints_and_creation_order() {
    let store = store_with(
        "CREATE TABLE customers (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             tier TEXT DEFAULT 'basic'
         );
         CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, note);
         CREATE VIEW gold_customers AS SELECT id, name FROM customers WHERE tier = 'gold';",
    );
    let schema = store.introspect().unwrap();

    let tables: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, ["customers", "orders", "gold_customers"]);

    let customers = schema.table("customers").unwrap();
    let id = customers.column("id").unwrap();
    assert!(id.primary_key);
    assert!(customers.column("name").unwrap().not_null);
    assert_eq!(
        customers.column("tier").unwrap().default.as_deref(),
        Some("'basic'")
    );

    // Untyped column
    assert_eq!(schema.column_type("orders", "note"), Some(ColumnType::Unknown));

    assert_snapshot!(render_schema(&schema), @r"
    Table customers:
      - id INTEGER (PRIMARY KEY)
      - name TEXT (NOT NULL)
      - tier TEXT (DEFAULT 'basic')

    Table orders:
      - id INTEGER (PRIMARY KEY)
      - customer_id INTEGER
      - note

    Table gold_customers:
      - id INTEGER
      - name TEXT
    ");
}

#[test]
fn test_empty_table_is_listed() {
    let store = store_with("CREATE TABLE pending (id INTEGER, label TEXT);");
    let schema = store.introspect().unwrap();

    let pending = schema.table("pending").unwrap();
    assert_eq!(pending.columns.len(), 2);
}

#[test]
fn test_empty_database() {
    let store = store_with("");
    let schema = store.introspect().unwrap();

    assert!(schema.is_empty());
    assert_eq!(render_schema(&schema), NO_TABLES);
}

#[test]
fn test_missing_file_is_unavailable() {
    let path = std::env::temp_dir()
        .join(format!("asksql-missing-{}", uuid::Uuid::new_v4()))
        .join("nope.db");

    let err = SqliteStore::open(&path).err().unwrap();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
