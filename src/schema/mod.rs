//! Normalized schema description.
//!
//! A [`SchemaDescription`] is a snapshot of a store's structure taken at
//! introspection time. It is a plain value: stores rebuild it on every call
//! and nothing downstream assumes it tracks later structural changes.
//!
//! Store-native type names are coerced into the closed [`ColumnType`]
//! vocabulary here, so the prompt builder, classifier and summary generator
//! never reason over raw type strings.

use serde::{Deserialize, Serialize};

/// Semantic column type shared by schemas and result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    DateTime,
    Boolean,
    Unknown,
}

impl ColumnType {
    /// Coerce a store-declared type name into a semantic type.
    ///
    /// Follows SQLite's type-affinity substring rules, checked in this order:
    /// boolean names, date/time names, `INT`, text names (`CHAR`, `CLOB`,
    /// `TEXT`), floating names (`REAL`, `FLOA`, `DOUB`, `DEC`, `NUM`).
    /// Anything else, including an empty declaration or `BLOB`, is
    /// [`ColumnType::Unknown`].
    ///
    /// Needles match anywhere in the name, not on word boundaries. SQLite
    /// stores `POINT` and `INTERVAL` columns with integer affinity, so they
    /// map to [`ColumnType::Integer`] here too.
    ///
    /// # Example
    ///
    /// ```
    /// use asksql::schema::ColumnType;
    ///
    /// assert_eq!(ColumnType::from_declared("VARCHAR(40)"), ColumnType::Text);
    /// assert_eq!(ColumnType::from_declared("TIMESTAMP"), ColumnType::DateTime);
    /// assert_eq!(ColumnType::from_declared("BIGINT"), ColumnType::Integer);
    /// assert_eq!(ColumnType::from_declared(""), ColumnType::Unknown);
    /// ```
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        let has = |needle: &str| upper.contains(needle);

        if upper.is_empty() {
            ColumnType::Unknown
        } else if has("BOOL") {
            ColumnType::Boolean
        } else if has("DATE") || has("TIME") {
            ColumnType::DateTime
        } else if has("INT") {
            ColumnType::Integer
        } else if has("CHAR") || has("CLOB") || has("TEXT") {
            ColumnType::Text
        } else if has("REAL") || has("FLOA") || has("DOUB") || has("DEC") || has("NUM") {
            ColumnType::Float
        } else {
            ColumnType::Unknown
        }
    }

    /// Integer or float.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Date, time or timestamp.
    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::DateTime)
    }

    /// Values that label groups rather than measure them.
    pub fn is_categorical(self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Boolean)
    }

    /// Upper-case name used when rendering the schema for a prompt.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// Column name as declared.
    pub name: String,
    /// Normalized semantic type.
    pub column_type: ColumnType,
    /// The store's own type declaration (may be empty).
    pub declared_type: String,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Declared `NOT NULL`.
    #[serde(default)]
    pub not_null: bool,
    /// Default value expression, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDescription {
    /// Create a column, deriving the semantic type from the declaration.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            column_type: ColumnType::from_declared(&declared_type),
            declared_type,
            primary_key: false,
            not_null: false,
            default: None,
        }
    }

    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// One table and its columns, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
}

impl TableDescription {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescription>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Ordered set of tables visible in a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescription>,
}

impl SchemaDescription {
    pub fn new(tables: Vec<TableDescription>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Find a table by exact name.
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up the semantic type of `table.column`.
    pub fn column_type(&self, table: &str, column: &str) -> Option<ColumnType> {
        self.table(table)
            .and_then(|t| t.column(column))
            .map(|c| c.column_type)
    }
}
