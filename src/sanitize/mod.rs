//! Allow-list query sanitizer.
//!
//! This is the safety boundary between untrusted model output and the
//! store. A [`CandidateQuery`] becomes a [`ValidatedQuery`] only if it is a
//! single retrieval statement; everything else is rejected with the
//! [`Rule`] it broke.
//!
//! The check is a token scan, not a parse. The `sqlparser` tokenizer tells
//! string literals, quoted identifiers, comments and separators apart, so the
//! rules below are evaluated over real tokens instead of raw substrings:
//!
//! | Order | Rule                   | Rejects                                        |
//! |-------|------------------------|------------------------------------------------|
//! | 1     | `Empty`                | blank input                                    |
//! | 2     | `Unparseable`          | text the tokenizer cannot split                |
//! | 3     | `UnsupportedToken`     | any token kind outside the SQLite allow-list   |
//! | 4     | `Comment`              | `--` or `/* */` outside literals               |
//! | 5     | `MultipleStatements`   | `;` outside literals                           |
//! | 6     | `MutatingKeyword`      | an unquoted mutating keyword anywhere          |
//! | 7     | `NotRetrieval`         | a first token other than `SELECT` / `WITH`     |
//!
//! The tokenizer knows literal forms SQLite does not (`$$...$$`, `E'...'`,
//! `N'...'`, byte strings). SQLite would read their contents as ordinary
//! SQL, so rule 3 admits only words, numbers, plain `'...'` strings, `x'..'`
//! blobs, whitespace, punctuation and SQLite operators. Bind parameters are
//! refused too: nothing would bind them.
//!
//! Accepted text is passed through byte for byte, so the query that is
//! displayed is the query that runs.

use serde::Serialize;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

/// Keywords that start or modify a data-, schema- or session-mutating
/// statement. Matched against whole, unquoted word tokens.
pub const MUTATING_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
    "ATTACH", "DETACH", "PRAGMA", "VACUUM", "REINDEX", "MERGE",
];

/// Keywords a retrieval statement may begin with.
pub const RETRIEVAL_KEYWORDS: &[&str] = &["SELECT", "WITH"];

/// Unvalidated query text, as produced by the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery(String);

impl CandidateQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A query that passed [`sanitize`].
///
/// There is no public constructor; the executor accepts nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedQuery {
    sql: String,
}

impl ValidatedQuery {
    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl std::fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// The sanitizer rule a candidate violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "detail", rename_all = "snake_case")]
pub enum Rule {
    Empty,
    Unparseable(String),
    UnsupportedToken(String),
    Comment,
    MultipleStatements,
    MutatingKeyword(String),
    NotRetrieval(String),
}

impl Rule {
    /// Stable short name, suitable for display and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Empty => "empty",
            Rule::Unparseable(_) => "unparseable",
            Rule::UnsupportedToken(_) => "unsupported_token",
            Rule::Comment => "comment",
            Rule::MultipleStatements => "multiple_statements",
            Rule::MutatingKeyword(_) => "mutating_keyword",
            Rule::NotRetrieval(_) => "not_retrieval",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Empty => f.write_str("query is empty"),
            Rule::Unparseable(msg) => write!(f, "query could not be tokenized: {}", msg),
            Rule::UnsupportedToken(token) => {
                write!(f, "token not allowed in a SQLite query: {}", token)
            }
            Rule::Comment => f.write_str("comments are not allowed"),
            Rule::MultipleStatements => f.write_str("multiple SQL statements are not allowed"),
            Rule::MutatingKeyword(word) => write!(f, "mutating keyword not allowed: {}", word),
            Rule::NotRetrieval(first) => {
                write!(f, "only SELECT queries are allowed (found {})", first)
            }
        }
    }
}

/// A candidate the sanitizer refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("query rejected ({}): {rule}", .rule.name())]
pub struct Rejection {
    /// The violated rule.
    pub rule: Rule,
    /// The rejected text, kept for auditing.
    pub sql: String,
}

/// Validate a candidate query against the allow-list.
///
/// # Example
///
/// ```
/// use asksql::sanitize::{sanitize, CandidateQuery, Rule};
///
/// let ok = sanitize(CandidateQuery::new("SELECT region FROM sales")).unwrap();
/// assert_eq!(ok.as_str(), "SELECT region FROM sales");
///
/// let err = sanitize(CandidateQuery::new("SELECT 1; DROP TABLE sales")).unwrap_err();
/// assert_eq!(err.rule, Rule::MultipleStatements);
/// ```
pub fn sanitize(candidate: CandidateQuery) -> Result<ValidatedQuery, Rejection> {
    match check(candidate.as_str()) {
        Ok(()) => Ok(ValidatedQuery { sql: candidate.0 }),
        Err(rule) => Err(Rejection {
            rule,
            sql: candidate.0,
        }),
    }
}

fn check(sql: &str) -> Result<(), Rule> {
    if sql.trim().is_empty() {
        return Err(Rule::Empty);
    }

    let dialect = SQLiteDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| Rule::Unparseable(e.to_string()))?;

    if let Some(token) = tokens.iter().find(|t| !is_allowed_kind(t)) {
        return Err(Rule::UnsupportedToken(token.to_string()));
    }

    if tokens.iter().any(is_comment) {
        return Err(Rule::Comment);
    }

    if tokens.iter().any(|t| matches!(t, Token::SemiColon)) {
        return Err(Rule::MultipleStatements);
    }

    if let Some(word) = tokens.iter().find_map(|t| unquoted_word(t).filter(|w| is_mutating(w))) {
        return Err(Rule::MutatingKeyword(word.to_ascii_uppercase()));
    }

    let first = tokens
        .iter()
        .find(|t| !matches!(t, Token::Whitespace(_)))
        .ok_or(Rule::Empty)?;
    match unquoted_word(first) {
        Some(word) if is_retrieval(word) => Ok(()),
        _ => Err(Rule::NotRetrieval(first.to_string())),
    }
}

/// Token kinds SQLite reads the same way the tokenizer does.
fn is_allowed_kind(token: &Token) -> bool {
    matches!(
        token,
        Token::Word(_)
            | Token::Number(_, _)
            | Token::SingleQuotedString(_)
            | Token::HexStringLiteral(_)
            | Token::Whitespace(_)
            | Token::Comma
            | Token::Period
            | Token::LParen
            | Token::RParen
            | Token::SemiColon
            | Token::Eq
            | Token::DoubleEq
            | Token::Neq
            | Token::Lt
            | Token::Gt
            | Token::LtEq
            | Token::GtEq
            | Token::Plus
            | Token::Minus
            | Token::Mul
            | Token::Div
            | Token::Mod
            | Token::StringConcat
            | Token::Ampersand
            | Token::Pipe
            | Token::Tilde
            | Token::ShiftLeft
            | Token::ShiftRight
            | Token::Arrow
            | Token::LongArrow
    )
}

fn is_comment(token: &Token) -> bool {
    matches!(
        token,
        Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_))
    )
}

fn unquoted_word(token: &Token) -> Option<&str> {
    match token {
        Token::Word(w) if w.quote_style.is_none() => Some(w.value.as_str()),
        _ => None,
    }
}

fn is_mutating(word: &str) -> bool {
    MUTATING_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

fn is_retrieval(word: &str) -> bool {
    RETRIEVAL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
