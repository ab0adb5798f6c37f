//! # asksql
//!
//! Answer natural-language questions about a relational store through a
//! language model, without ever letting the model touch the data directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Store (introspect) → SchemaDescription        │
//! └─────────────────────────────────────────────────────────┘
//!                          │  + question
//!                          ▼ [prompt]
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Prompt (deterministic)                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translate]
//! ┌─────────────────────────────────────────────────────────┐
//! │          CandidateQuery (untrusted model output)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sanitize]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ValidatedQuery (one read-only statement)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store::execute]
//! ┌─────────────────────────────────────────────────────────┐
//! │              ResultSet (typed, bounded)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [chart] + [summary]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Answer { query, result, chart, summary }       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The only path from model output to the store runs through
//! [`sanitize::sanitize`]; a [`sanitize::ValidatedQuery`] cannot be built
//! any other way.

pub mod chart;
pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod result;
pub mod sanitize;
pub mod schema;
pub mod store;
pub mod summary;
pub mod translate;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::chart::{classify, ChartPolicy, ChartSpec};
    pub use crate::pipeline::{Answer, AnswerError, Pipeline, PipelineConfig, Warning};
    pub use crate::prompt::{build_prompt, Prompt};
    pub use crate::result::{ResultColumn, ResultSet, Value};
    pub use crate::sanitize::{sanitize, CandidateQuery, Rejection, Rule, ValidatedQuery};
    pub use crate::schema::{ColumnDescription, ColumnType, SchemaDescription, TableDescription};
    pub use crate::store::{ExecutionLimits, SqliteStore, Store, StoreError, Truncation};
    pub use crate::summary::{summarize, Summary};
    pub use crate::translate::{CommandModel, LanguageModel, ModelError, TranslationClient};
}
