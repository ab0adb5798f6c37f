//! SQLite-backed store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, Row};

use super::{Execution, ExecutionLimits, Store, StoreError, StoreResult, Truncation};
use crate::result::{infer_column_type, ResultColumn, ResultSet, Value};
use crate::sanitize::ValidatedQuery;
use crate::schema::{ColumnDescription, ColumnType, SchemaDescription, TableDescription};

/// SQLite virtual-machine steps between deadline checks.
const PROGRESS_STEPS: i32 = 1_000;

/// User tables and views, in creation order.
const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
     ORDER BY rowid";

const TABLE_COLUMNS: &str = "SELECT name, type, \"notnull\", dflt_value, pk \
     FROM pragma_table_info(?1) ORDER BY cid";

/// A single SQLite connection used read-only.
///
/// The connection sits behind a mutex; each introspection or execution
/// holds it for the whole call.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file is missing or cannot
    /// be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    ///
    /// The connection is not reopened read-only, but [`Store::execute`]
    /// still refuses statements SQLite reports as writing.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// An in-memory database holding the sample `sales` table.
    pub fn sample_in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        super::sample::seed_sample_sales(&conn)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl Store for SqliteStore {
    fn introspect(&self) -> StoreResult<SchemaDescription> {
        let conn = self.lock()?;
        let unavailable = |e: rusqlite::Error| StoreError::Unavailable(e.to_string());

        let names: Vec<String> = {
            let mut stmt = conn.prepare(LIST_TABLES).map_err(unavailable)?;
            let rows = stmt.query_map([], |row| row.get(0)).map_err(unavailable)?;
            let names = rows.collect::<Result<_, _>>().map_err(unavailable)?;
            names
        };

        let mut stmt = conn.prepare(TABLE_COLUMNS).map_err(unavailable)?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = stmt
                .query_map(params![name], read_column)
                .map_err(unavailable)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(unavailable)?;
            tables.push(TableDescription::new(name, columns));
        }

        tracing::debug!(tables = tables.len(), "introspected sqlite schema");
        Ok(SchemaDescription::new(tables))
    }

    fn execute(
        &self,
        query: &ValidatedQuery,
        limits: &ExecutionLimits,
    ) -> StoreResult<Execution> {
        let conn = self.lock()?;
        let started = Instant::now();

        if let Some(limit) = limits.time_limit {
            let deadline = started + limit;
            conn.progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= deadline));
        }
        let outcome = run_query(&conn, query, limits);
        conn.progress_handler(0, None::<fn() -> bool>);

        let execution = outcome?;
        tracing::debug!(
            rows = execution.result.row_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query executed"
        );
        if let Some(truncation) = &execution.truncation {
            tracing::warn!(%truncation, "partial result");
        }
        Ok(execution)
    }
}

fn read_column(row: &Row<'_>) -> rusqlite::Result<ColumnDescription> {
    let name: String = row.get(0)?;
    let declared: Option<String> = row.get(1)?;
    let not_null: bool = row.get(2)?;
    let default: Option<String> = row.get(3)?;
    let pk: i64 = row.get(4)?;

    let mut column = ColumnDescription::new(name, declared.unwrap_or_default());
    column.primary_key = pk > 0;
    column.not_null = not_null;
    column.default = default;
    Ok(column)
}

fn run_query(
    conn: &Connection,
    query: &ValidatedQuery,
    limits: &ExecutionLimits,
) -> StoreResult<Execution> {
    let failed = |e: rusqlite::Error| StoreError::Execution(e.to_string());

    let mut stmt = conn.prepare(query.as_str()).map_err(failed)?;
    if !stmt.readonly() {
        return Err(StoreError::Execution(
            "statement would modify the database".to_string(),
        ));
    }

    let headers: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
        .collect();
    let width = headers.len();

    let mut rows = stmt.query([]).map_err(failed)?;
    let mut values: Vec<Vec<Value>> = Vec::new();
    let mut truncation = None;
    loop {
        match rows.next() {
            Ok(Some(row)) => {
                if values.len() >= limits.row_limit {
                    truncation = Some(Truncation::RowLimit(limits.row_limit));
                    break;
                }
                values.push(read_row(row, width).map_err(failed)?);
            }
            Ok(None) => break,
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) => {
                let limit = limits.time_limit.unwrap_or_default();
                truncation = Some(Truncation::TimeLimit(limit));
                break;
            }
            Err(e) => return Err(failed(e)),
        }
    }

    let columns = type_columns(headers, &mut values);
    let result = ResultSet::new(columns, values)
        .map_err(|e| StoreError::Execution(e.to_string()))?;
    let result = match truncation {
        Some(_) => result.into_truncated(),
        None => result,
    };
    Ok(Execution { result, truncation })
}

fn read_row(row: &Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
    (0..width)
        .map(|i| {
            Ok(match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Integer(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
                ValueRef::Blob(bytes) => Value::Text(format!("<blob {} bytes>", bytes.len())),
            })
        })
        .collect()
}

/// Resolve each column's semantic type.
///
/// A declared type wins when it maps to something known; otherwise the
/// values decide. Integer cells in boolean columns become booleans.
fn type_columns(
    headers: Vec<(String, Option<String>)>,
    rows: &mut [Vec<Value>],
) -> Vec<ResultColumn> {
    headers
        .into_iter()
        .enumerate()
        .map(|(i, (name, declared))| {
            let from_decl = declared
                .as_deref()
                .map(ColumnType::from_declared)
                .unwrap_or(ColumnType::Unknown);
            let column_type = match from_decl {
                ColumnType::Unknown => infer_column_type(rows.iter().map(|r| &r[i])),
                known => known,
            };
            if column_type == ColumnType::Boolean {
                for row in rows.iter_mut() {
                    if let Value::Integer(v) = row[i] {
                        row[i] = Value::Boolean(v != 0);
                    }
                }
            }
            ResultColumn::new(name, column_type)
        })
        .collect()
}
