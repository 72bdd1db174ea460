//! Deterministic mock collaborators for tests and local runs. Call counters
//! let tests assert the memoization contract (a cached derivation must not
//! touch its collaborator again).

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::parse::parse_ratings;
use super::{Classifier, ClassifierRatings, CommentSource, ProsCons, RawComment, Summarizer};

#[derive(Default)]
pub struct MockSource {
    pub comments: Vec<RawComment>,
    /// When set, `fetch` fails instead of returning comments.
    pub fail: bool,
    pub fetch_calls: AtomicUsize,
}

impl MockSource {
    pub fn with_comments(comments: Vec<RawComment>) -> Self {
        Self {
            comments,
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CommentSource for MockSource {
    async fn fetch(&self, _subject: &str, limit: usize) -> anyhow::Result<Vec<RawComment>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock fetch failure");
        }
        Ok(self.comments.iter().take(limit).cloned().collect())
    }
}

/// Classifier mock fed with a *raw* payload string, so tests exercise the
/// same parse path the real client uses (fences, odd keying and all).
#[derive(Default)]
pub struct MockClassifier {
    pub ratings_payload: String,
    pub pros_cons: ProsCons,
    pub fail: bool,
    pub rate_calls: AtomicUsize,
    pub pros_cons_calls: AtomicUsize,
}

impl MockClassifier {
    pub fn with_payload(ratings_payload: impl Into<String>) -> Self {
        Self {
            ratings_payload: ratings_payload.into(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn rate_comments(&self, _texts: &[String]) -> anyhow::Result<ClassifierRatings> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock classifier failure");
        }
        Ok(parse_ratings(&self.ratings_payload).unwrap_or_else(|_| ClassifierRatings::empty()))
    }

    async fn extract_pros_cons(&self, _texts: &[String]) -> anyhow::Result<ProsCons> {
        self.pros_cons_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock classifier failure");
        }
        Ok(self.pros_cons.clone())
    }
}

pub struct MockSummarizer {
    pub summary: String,
    pub description: String,
    pub similar: Vec<String>,
    pub fail: bool,
    pub summarize_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
    pub similar_calls: AtomicUsize,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            summary: "Buyers mostly like it.".to_string(),
            description: "A well-regarded product overall.".to_string(),
            similar: vec!["Alternative A".to_string(), "Alternative B".to_string()],
            fail: false,
            summarize_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            similar_calls: AtomicUsize::new(0),
        }
    }
}

impl MockSummarizer {
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize_reviews(&self, _texts: &[String]) -> anyhow::Result<String> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock summarizer failure");
        }
        Ok(self.summary.clone())
    }

    async fn describe_subject(&self, _subject: &str) -> anyhow::Result<String> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock summarizer failure");
        }
        Ok(self.description.clone())
    }

    async fn similar_products(&self, _subject: &str) -> anyhow::Result<Vec<String>> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock summarizer failure");
        }
        Ok(self.similar.clone())
    }
}
