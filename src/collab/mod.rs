// src/collab/mod.rs
//! External collaborators: the Reddit comment source, the LLM classifier,
//! and the LLM summarizer. The orchestrator only sees these traits; every
//! network failure is converted to a neutral value at the call site, so
//! a collaborator can degrade the result but never crash the pipeline.

pub mod mock;
pub mod openai;
pub mod parse;
pub mod reddit;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use parse::{ClassifierRatings, ParseError};

/// One comment tuple as delivered by the fetch layer, before classification.
#[derive(Debug, Clone)]
pub struct RawComment {
    pub text: String,
    pub url: String,
    /// `[upvotes, karma_a, karma_b, recency]`. Absent when the source could
    /// not supply engagement metadata.
    pub weight_factors: Option<Vec<f64>>,
}

/// One pro or con extracted by the classifier. `comment_index` is positional
/// into the filtered comment list that was sent with the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProConEntry {
    pub text: String,
    pub comment_index: i64,
}

/// Classifier pros/cons payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProsCons {
    #[serde(default)]
    pub pros: Vec<ProConEntry>,
    #[serde(default)]
    pub cons: Vec<ProConEntry>,
}

/// Fetches review comments for a subject. An empty result is meaningful
/// (it routes the orchestrator into the no-data fallback), not an error.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch(&self, subject: &str, limit: usize) -> anyhow::Result<Vec<RawComment>>;
}

/// Rates comment batches. The metric mapping may come back keyed by index
/// or by verbatim text, and may be partial; both are expected upstream
/// behavior, handled by [`ClassifierRatings`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn rate_comments(&self, texts: &[String]) -> anyhow::Result<ClassifierRatings>;
    async fn extract_pros_cons(&self, texts: &[String]) -> anyhow::Result<ProsCons>;
}

/// Free-text generation: review summaries, subject descriptions for the
/// no-data fallback, and similar-product suggestions.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize_reviews(&self, texts: &[String]) -> anyhow::Result<String>;
    /// Describe the subject itself when no review data exists. A response
    /// containing [`NOT_A_PRODUCT_MARKER`] means the subject is not a
    /// reviewable product at all.
    async fn describe_subject(&self, subject: &str) -> anyhow::Result<String>;
    async fn similar_products(&self, subject: &str) -> anyhow::Result<Vec<String>>;
}

/// Literal marker the describe-subject prompt asks the model to emit when
/// the query is not a reviewable product.
pub const NOT_A_PRODUCT_MARKER: &str = "NOT_A_PRODUCT";
