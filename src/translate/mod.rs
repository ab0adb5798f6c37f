//! Translation client.
//!
//! Sends a [`Prompt`] to a [`LanguageModel`] and pulls a single
//! [`CandidateQuery`] out of the free-form reply.
//!
//! # Extraction rule
//!
//! [`extract_query`] applies one fixed rule:
//!
//! 1. If the reply contains a fenced block (three backticks), the body of
//!    the first such block is the query. The block may sit on one line
//!    (```` ```sql SELECT 1``` ````). A leading word is an info string unless
//!    it is itself `SELECT` or `WITH`. An unterminated fence runs to the end
//!    of the reply.
//! 2. Otherwise the query starts at the first line whose first word is
//!    `SELECT` or `WITH` (any case) and runs until the next blank line.
//! 3. Surrounding whitespace and one trailing `;` are removed.
//!
//! If neither step finds non-empty text, the reply holds no query.
//!
//! The model call is made once. There is no internal retry; a timeout drops
//! the in-flight call and the request stops before sanitizing.

mod command;

pub use command::CommandModel;

use std::io;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;

use crate::prompt::Prompt;
use crate::sanitize::CandidateQuery;

/// Default timeout for one model call (60 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Contents of the first fenced block, info string included.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)(?:```|\z)").unwrap());

/// A line whose first word is a retrieval keyword.
static RETRIEVAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(select|with)\b").unwrap());

/// Errors raised by a language-model provider.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to start the provider process.
    #[error("failed to start model command: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Failed to hand the prompt to the provider.
    #[error("failed to write prompt to model: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to read the completion.
    #[error("failed to read model output: {0}")]
    ReadFailed(#[source] io::Error),

    /// Provider process exited unsuccessfully.
    #[error("model command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// Any other provider-side failure (auth, quota, network).
    #[error("model provider error: {0}")]
    Provider(String),
}

/// Errors from the translation stage.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("language model unavailable: {0}")]
    Unavailable(#[from] ModelError),

    #[error("language model did not answer within {} seconds", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("no SQL query found in the model response")]
    NoQueryExtracted,
}

/// Result type for translation.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// A text-completion provider.
///
/// Authentication and model selection belong to the implementation and are
/// configured by the caller.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, returning the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Bounded, single-attempt translation of prompts into candidate queries.
#[derive(Clone)]
pub struct TranslationClient {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl TranslationClient {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_timeout(model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the model for a query and extract it from the reply.
    ///
    /// # Errors
    ///
    /// - [`TranslateError::Unavailable`] if the provider fails.
    /// - [`TranslateError::TimedOut`] if it does not answer in time.
    /// - [`TranslateError::NoQueryExtracted`] if the reply holds no query.
    pub async fn translate(&self, prompt: &Prompt) -> TranslateResult<CandidateQuery> {
        let started = Instant::now();

        let call = self.model.complete(prompt.as_str());
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                // Timeout - the dropped future cancels the provider call
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "language model timed out"
                );
                return Err(TranslateError::TimedOut(self.timeout));
            }
        };

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_len = response.len(),
            "language model responded"
        );

        extract_query(&response).ok_or(TranslateError::NoQueryExtracted)
    }
}

/// Extract one candidate query from a model reply.
///
/// # Example
///
/// ```
/// use asksql::translate::extract_query;
///
/// let reply = "Here you go:\n```sql\nSELECT region FROM sales;\n```\nEnjoy!";
/// assert_eq!(extract_query(reply).unwrap().as_str(), "SELECT region FROM sales");
///
/// assert!(extract_query("I cannot help with that.").is_none());
/// ```
pub fn extract_query(response: &str) -> Option<CandidateQuery> {
    let raw = match FENCED_BLOCK.captures(response) {
        Some(caps) => {
            let contents = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            fence_body(contents).to_string()
        }
        None => first_retrieval_paragraph(response)?,
    };

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(CandidateQuery::new(trimmed))
    }
}

/// Strip the info string (`sql`, `sqlite`, ...) from fenced contents.
fn fence_body(contents: &str) -> &str {
    let rest = contents.trim_start_matches([' ', '\t']);
    let word_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-')))
        .unwrap_or(rest.len());
    let (word, after) = rest.split_at(word_end);

    if word.is_empty() || RETRIEVAL_LINE.is_match(word) {
        return contents;
    }
    match after.chars().next() {
        None => "",
        Some(c) if c.is_whitespace() => after,
        Some(_) => contents,
    }
}

fn first_retrieval_paragraph(response: &str) -> Option<String> {
    let mut lines = response.lines().skip_while(|line| !RETRIEVAL_LINE.is_match(line));
    let first = lines.next()?;

    let mut paragraph = vec![first];
    paragraph.extend(lines.take_while(|line| !line.trim().is_empty()));
    Some(paragraph.join("\n"))
}
