//! Sample `sales` dataset.
//!
//! Ten orders across four products and four regions in the first half of
//! 2024. Used by `asksql seed` and by tests; nothing in the pipeline depends
//! on this layout.

use rusqlite::{params, Connection};

/// `(order_date, product, category, region, quantity, unit_price)`
pub const SAMPLE_SALES: &[(&str, &str, &str, &str, i64, f64)] = &[
    ("2024-01-05 00:00:00", "Widget A", "Widgets", "North", 10, 19.99),
    ("2024-01-12 00:00:00", "Widget B", "Widgets", "South", 5, 24.99),
    ("2024-02-03 00:00:00", "Widget A", "Widgets", "North", 7, 19.99),
    ("2024-02-15 00:00:00", "Gadget C", "Gadgets", "West", 20, 9.99),
    ("2024-03-01 00:00:00", "Widget B", "Widgets", "East", 8, 24.99),
    ("2024-03-18 00:00:00", "Gadget C", "Gadgets", "North", 15, 9.99),
    ("2024-04-02 00:00:00", "Widget A", "Widgets", "South", 12, 19.99),
    ("2024-04-20 00:00:00", "Gadget D", "Gadgets", "West", 9, 14.99),
    ("2024-05-05 00:00:00", "Widget B", "Widgets", "North", 6, 24.99),
    ("2024-05-22 00:00:00", "Gadget D", "Gadgets", "East", 18, 14.99),
];

const CREATE_SALES: &str = "CREATE TABLE IF NOT EXISTS sales (
    order_date TIMESTAMP,
    product TEXT,
    category TEXT,
    region TEXT,
    quantity INTEGER,
    unit_price REAL
)";

/// Create the `sales` table if missing and fill it if empty.
///
/// Returns the number of rows inserted (zero when data was already there).
pub fn seed_sample_sales(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(CREATE_SALES, [])?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }

    let mut stmt = conn.prepare(
        "INSERT INTO sales (order_date, product, category, region, quantity, unit_price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (date, product, category, region, quantity, price) in SAMPLE_SALES {
        stmt.execute(params![date, product, category, region, quantity, price])?;
    }
    Ok(SAMPLE_SALES.len())
}
