//! Prompt construction.
//!
//! [`build_prompt`] is a pure function of the schema and the question: the
//! same inputs always produce byte-identical text, which keeps prompts
//! testable and lets [`Prompt::fingerprint`] serve as a cache key.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::schema::{ColumnDescription, SchemaDescription};

/// Text shown in place of the schema when the store has no user tables.
pub const NO_TABLES: &str = "No user tables found in this database.";

const INSTRUCTIONS: &str = "\
You are an expert SQLite data analyst. Translate the user's question into a single SQLite query.

Rules:
- Answer with exactly one SELECT statement. A leading WITH clause is allowed.
- Use only the tables and columns listed in the schema.
- Never modify data or schema: no INSERT, UPDATE, DELETE, CREATE, DROP, ALTER, PRAGMA or ATTACH.
- Do not use SQL comments and do not end with a semicolon.
- Give aggregated columns short lowercase aliases, for example SUM(quantity * unit_price) AS revenue.
- Return only the SQL inside one ```sql fenced block, with no explanation.";

/// Question delimiters, in any case and with stray whitespace.
static QUESTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*/?\s*question\s*>").unwrap());

/// Runs of three or more backticks.
static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`{3,}").unwrap());

/// An instruction payload ready to send to a language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// SHA-256 of the prompt text as 64 lowercase hex characters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render the full prompt for `question` over `schema`.
pub fn build_prompt(schema: &SchemaDescription, question: &str) -> Prompt {
    let text = format!(
        "{INSTRUCTIONS}\n\nSchema:\n<schema>\n{}\n</schema>\n\nQuestion:\n<question>\n{}\n</question>\n\nSQL:\n",
        render_schema(schema),
        guard_question(question),
    );
    Prompt { text }
}

/// Render a schema as indented text, one line per column.
///
/// ```text
/// Table sales:
///   - id INTEGER (PRIMARY KEY, NOT NULL)
///   - region TEXT (DEFAULT 'North')
/// ```
pub fn render_schema(schema: &SchemaDescription) -> String {
    if schema.is_empty() {
        return NO_TABLES.to_string();
    }

    let mut lines = Vec::new();
    for table in &schema.tables {
        lines.push(format!("Table {}:", table.name));
        for column in &table.columns {
            lines.push(render_column(column));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}

fn render_column(column: &ColumnDescription) -> String {
    let mut line = format!("  - {} {}", column.name, column.declared_type)
        .trim_end()
        .to_string();

    let mut extras = Vec::new();
    if column.primary_key {
        extras.push("PRIMARY KEY".to_string());
    }
    if column.not_null {
        extras.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        extras.push(format!("DEFAULT {}", default));
    }
    if !extras.is_empty() {
        line.push_str(&format!(" ({})", extras.join(", ")));
    }
    line
}

/// Keep the question from being read as template structure.
///
/// Control characters other than newline and tab are dropped, carriage
/// returns are normalized, delimiter tags become parentheses and code fences
/// become quotes.
pub fn guard_question(question: &str) -> String {
    let cleaned: String = question
        .replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let untagged = QUESTION_TAG.replace_all(cleaned.trim(), "(question)");
    FENCE.replace_all(&untagged, "'''").into_owned()
}
