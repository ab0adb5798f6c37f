//! End-to-end question answering.
//!
//! ```text
//! question + schema → Prompt → Translate → Sanitize → Execute → { Classify, Summarize }
//! ```
//!
//! Every stage either hands its value to the next or stops the request with
//! an [`AnswerError`]. Nothing is retried. A ceiling hit during execution is
//! reported as a [`Warning`] next to the partial result.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use asksql::pipeline::{Pipeline, PipelineConfig};
//! use asksql::store::SqliteStore;
//! use asksql::translate::CommandModel;
//!
//! let store = SqliteStore::open("./talk2data.db")?;
//! let model = Arc::new(CommandModel::new("llm", vec![]));
//! let pipeline = Pipeline::new(store, model, PipelineConfig::default());
//!
//! let answer = pipeline.ask("Total revenue by region").await?;
//! println!("{}\n{}", answer.query, answer.summary.text);
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;

use crate::chart::{classify, ChartPolicy, ChartSpec};
use crate::prompt::build_prompt;
use crate::result::ResultSet;
use crate::sanitize::{sanitize, Rejection, ValidatedQuery};
use crate::schema::SchemaDescription;
use crate::store::{ExecutionLimits, Store, StoreError, Truncation};
use crate::summary::{summarize, Summary};
use crate::translate::{LanguageModel, TranslateError, TranslationClient, DEFAULT_TIMEOUT_SECS};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that stop a request.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Translation unavailable: {0}")]
    TranslationUnavailable(String),

    #[error("No SQL query could be extracted from the model response")]
    NoQueryExtracted,

    #[error("Rejected query: {0}")]
    RejectedQuery(#[from] Rejection),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl AnswerError {
    /// Stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerError::StoreUnavailable(_) => "store_unavailable",
            AnswerError::TranslationUnavailable(_) => "translation_unavailable",
            AnswerError::NoQueryExtracted => "no_query_extracted",
            AnswerError::RejectedQuery(_) => "rejected_query",
            AnswerError::ExecutionError(_) => "execution_error",
        }
    }
}

impl From<StoreError> for AnswerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => AnswerError::StoreUnavailable(msg),
            StoreError::Execution(msg) => AnswerError::ExecutionError(msg),
        }
    }
}

impl From<TranslateError> for AnswerError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::NoQueryExtracted => AnswerError::NoQueryExtracted,
            other => AnswerError::TranslationUnavailable(other.to_string()),
        }
    }
}

pub type AnswerResult<T> = Result<T, AnswerError>;

// ============================================================================
// Options
// ============================================================================

/// Everything the pipeline needs besides its store and model.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Row and time ceilings for execution.
    pub limits: ExecutionLimits,
    /// Chart selection tunables.
    pub chart: ChartPolicy,
    /// Upper bound on one language-model call.
    pub translate_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            chart: ChartPolicy::default(),
            translate_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.limits.row_limit = row_limit;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.limits.time_limit = time_limit;
        self
    }

    pub fn with_max_categories(mut self, max_categories: usize) -> Self {
        self.chart.max_categories = max_categories;
        self
    }

    pub fn with_translate_timeout(mut self, timeout: Duration) -> Self {
        self.translate_timeout = timeout;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Non-fatal conditions reported alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    PartialOrTruncated { truncation: Truncation },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::PartialOrTruncated { truncation } => write!(f, "{}", truncation),
        }
    }
}

/// A fully answered question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The query that ran, exactly as validated.
    pub query: ValidatedQuery,
    pub result: ResultSet,
    pub chart: ChartSpec,
    pub summary: Summary,
    pub warnings: Vec<Warning>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Question-answering pipeline over one store and one language model.
pub struct Pipeline<S> {
    store: S,
    translator: TranslationClient,
    config: PipelineConfig,
}

impl<S: Store> Pipeline<S> {
    pub fn new(store: S, model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        let translator = TranslationClient::with_timeout(model, config.translate_timeout);
        Self {
            store,
            translator,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Introspect the store's current schema.
    pub fn schema(&self) -> AnswerResult<SchemaDescription> {
        Ok(self.store.introspect()?)
    }

    /// Introspect, then answer `question` against the fresh schema.
    pub async fn ask(&self, question: &str) -> AnswerResult<Answer> {
        let schema = self.schema()?;
        self.answer(&schema, question).await
    }

    /// Answer `question` against `schema`.
    ///
    /// # Errors
    ///
    /// The first failing stage decides the error; later stages do not run.
    /// In particular a rejected query never reaches the store.
    pub async fn answer(&self, schema: &SchemaDescription, question: &str) -> AnswerResult<Answer> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id);
        self.run(schema, question).instrument(span).await
    }

    async fn run(&self, schema: &SchemaDescription, question: &str) -> AnswerResult<Answer> {
        // Step 1: Build prompt
        let prompt = build_prompt(schema, question);
        tracing::debug!(
            fingerprint = %prompt.fingerprint(),
            tables = schema.tables.len(),
            "prompt built"
        );

        // Step 2: Translate
        let candidate = self.translator.translate(&prompt).await?;
        tracing::debug!(sql = candidate.as_str(), "candidate extracted");

        // Step 3: Sanitize
        let query = sanitize(candidate).inspect_err(|rejection| {
            tracing::warn!(
                rule = rejection.rule.name(),
                sql = %rejection.sql,
                "candidate query rejected"
            );
        })?;

        // Step 4: Execute
        let execution = self.store.execute(&query, &self.config.limits)?;

        // Step 5: Presentation
        let chart = classify(&execution.result, &self.config.chart);
        let summary = summarize(&execution.result);
        let warnings = execution
            .truncation
            .map(|truncation| Warning::PartialOrTruncated { truncation })
            .into_iter()
            .collect();

        tracing::debug!(
            rows = execution.result.row_count(),
            chart = chart.kind(),
            "question answered"
        );

        Ok(Answer {
            query,
            result: execution.result,
            chart,
            summary,
            warnings,
        })
    }
}
