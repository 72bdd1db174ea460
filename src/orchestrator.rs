// src/orchestrator.rs
//! Top-level per-query state machine: fetch → classify → aggregate → derive
//! insights, with a describe-the-subject fallback when no review data
//! exists. Every collaborator failure is absorbed at its call site and
//! replaced with the nearest neutral value; the caller always gets a
//! structurally valid [`Outcome`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::analyze::aggregate::{process_comments, Comment};
use crate::analyze::weights::WeightConfig;
use crate::analyze::PUBLIC_METRIC_COUNT;
use crate::cache::{ResultCache, DESCRIBE_SUFFIX, SIMILAR_SUFFIX, SUMMARY_SUFFIX};
use crate::collab::{
    Classifier, ClassifierRatings, CommentSource, ProsCons, RawComment, Summarizer,
    NOT_A_PRODUCT_MARKER,
};

/// Summary substitute when the summarizer collaborator is down. Degraded
/// results are user-visible but never cached.
pub const DEGRADED_SUMMARY: &str =
    "We couldn't generate a summary right now. Please try again in a bit.";

/// Summary used when comments were fetched but none survived classification.
const NO_USABLE_REVIEWS_SUMMARY: &str =
    "We found discussion of this product but no usable review comments.";

/// Terminal result of one query. One explicit variant per terminal state of
/// the state machine; the API layer flattens this into the wire shape.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Review data existed and was aggregated.
    Scored {
        /// `(text, url)`, weight-descending.
        ranked_comments: Vec<(String, String)>,
        final_score: f64,
        final_metrics: [f64; PUBLIC_METRIC_COUNT],
        summary: String,
        /// `(text, source comment url)`.
        pros: Vec<(String, String)>,
        cons: Vec<(String, String)>,
        similar_products: Vec<String>,
    },
    /// No review data, but the subject is a real product: AI-only overview.
    NoData {
        summary: String,
        similar_products: Vec<String>,
    },
    /// The subject isn't something that can be reviewed at all.
    NotAProduct { message: String },
}

impl Outcome {
    pub fn is_not_product(&self) -> bool {
        matches!(self, Outcome::NotAProduct { .. })
    }
}

pub struct FetchOrchestrator {
    source: Arc<dyn CommentSource>,
    classifier: Arc<dyn Classifier>,
    summarizer: Arc<dyn Summarizer>,
    cache: Arc<ResultCache>,
    weights: WeightConfig,
    fetch_limit: usize,
}

impl FetchOrchestrator {
    pub fn new(
        source: Arc<dyn CommentSource>,
        classifier: Arc<dyn Classifier>,
        summarizer: Arc<dyn Summarizer>,
        cache: Arc<ResultCache>,
        weights: WeightConfig,
        fetch_limit: usize,
    ) -> Self {
        Self {
            source,
            classifier,
            summarizer,
            cache,
            weights,
            fetch_limit,
        }
    }

    /// Run the full pipeline for one subject.
    pub async fn analyze(&self, subject: &str) -> Outcome {
        let raw = match self.source.fetch(subject, self.fetch_limit).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(subject, error = %e, "fetch collaborator failed, treating as no data");
                Vec::new()
            }
        };

        if raw.is_empty() {
            info!(subject, "no review data, entering fallback");
            self.no_data(subject).await
        } else {
            info!(subject, fetched = raw.len(), "review data found");
            self.scored(subject, raw).await
        }
    }

    /// HAS_DATA branch: classify, aggregate, derive insights.
    async fn scored(&self, subject: &str, raw: Vec<RawComment>) -> Outcome {
        let texts: Vec<String> = raw.iter().map(|c| c.text.clone()).collect();
        let ratings = match self.classifier.rate_comments(&texts).await {
            Ok(r) => r,
            Err(e) => {
                warn!(subject, error = %e, "classifier failed, continuing with empty ratings");
                ClassifierRatings::empty()
            }
        };

        // Zip ratings back onto comments by batch index or verbatim text;
        // comments the classifier skipped are dropped here.
        let comments: Vec<Comment> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(i, rc)| {
                ratings.lookup(i, &rc.text).map(|metrics| Comment {
                    text: rc.text,
                    url: rc.url,
                    metrics: Some(metrics),
                    weight_factors: rc.weight_factors,
                })
            })
            .collect();

        let agg = process_comments(&comments, &self.weights);

        let summary = self.review_summary(subject, &agg.top_texts).await;
        let (pros, cons) = self.pros_cons(&comments).await;
        let similar_products = self.similar_products(subject).await;

        Outcome::Scored {
            ranked_comments: agg.ranked_comments,
            final_score: agg.final_score,
            final_metrics: agg.final_metrics,
            summary,
            pros,
            cons,
            similar_products,
        }
    }

    /// NO_DATA branch: describe the subject itself; the marker phrase in the
    /// response distinguishes "product without reviews" from "not a product".
    async fn no_data(&self, subject: &str) -> Outcome {
        // The describe key is deliberately distinct from the review-summary
        // key. Marker responses are not cached either: they carry no content
        // worth keeping, and a stale hit must never leak the marker text.
        let key = ResultCache::subject_key(subject, DESCRIBE_SUFFIX);
        let cached: Option<String> = self
            .cache
            .get(&key)
            .and_then(|v| serde_json::from_value(v).ok());
        let description = match cached {
            Some(d) => d,
            None => match self.summarizer.describe_subject(subject).await {
                Ok(d) => {
                    if !d.contains(NOT_A_PRODUCT_MARKER) {
                        self.cache.put(&key, serde_json::Value::String(d.clone()));
                    }
                    d
                }
                Err(e) => {
                    warn!(subject, error = %e, "describe-subject failed, degrading");
                    return Outcome::NoData {
                        summary: DEGRADED_SUMMARY.to_string(),
                        similar_products: Vec::new(),
                    };
                }
            },
        };

        if description.contains(NOT_A_PRODUCT_MARKER) {
            info!(subject, "subject rejected as not a product");
            return Outcome::NotAProduct {
                message: format!(
                    "\"{subject}\" doesn't look like a reviewable product, \
                     so there are no reviews to aggregate."
                ),
            };
        }

        Outcome::NoData {
            summary: description,
            similar_products: self.similar_products(subject).await,
        }
    }

    /// Summary of the top-ranked review texts, memoized per subject.
    async fn review_summary(&self, subject: &str, top_texts: &[String]) -> String {
        if top_texts.is_empty() {
            return NO_USABLE_REVIEWS_SUMMARY.to_string();
        }
        let key = ResultCache::subject_key(subject, SUMMARY_SUFFIX);
        self.cache
            .get_or_compute(&key, || async {
                self.summarizer.summarize_reviews(top_texts).await
            })
            .await
            .unwrap_or_else(|e| {
                warn!(subject, error = %e, "summarizer failed, degrading");
                DEGRADED_SUMMARY.to_string()
            })
    }

    /// Pros/cons over the filtered review set, memoized by a content
    /// fingerprint so a reshuffled batch of the same comments is a hit.
    /// Indices in the response map into the filtered list; anything out of
    /// range is discarded.
    async fn pros_cons(
        &self,
        comments: &[Comment],
    ) -> (Vec<(String, String)>, Vec<(String, String)>) {
        let filtered: Vec<&Comment> = comments.iter().filter(|c| c.is_review()).collect();
        if filtered.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let texts: Vec<String> = filtered.iter().map(|c| c.text.clone()).collect();

        let key = ResultCache::comment_set_key(&texts);
        let payload: ProsCons = self
            .cache
            .get_or_compute(&key, || async {
                self.classifier.extract_pros_cons(&texts).await
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "pros/cons extraction failed, degrading to empty");
                ProsCons::default()
            });

        let attribute = |entries: Vec<crate::collab::ProConEntry>| {
            entries
                .into_iter()
                .filter_map(|entry| {
                    let idx = usize::try_from(entry.comment_index).ok()?;
                    let comment = filtered.get(idx)?;
                    Some((entry.text, comment.url.clone()))
                })
                .collect::<Vec<_>>()
        };

        (attribute(payload.pros), attribute(payload.cons))
    }

    /// Similar-product suggestions, memoized per subject.
    async fn similar_products(&self, subject: &str) -> Vec<String> {
        let key = ResultCache::subject_key(subject, SIMILAR_SUFFIX);
        self.cache
            .get_or_compute(&key, || async {
                self.summarizer.similar_products(subject).await
            })
            .await
            .unwrap_or_else(|e| {
                warn!(subject, error = %e, "similar-products lookup failed, degrading to empty");
                Vec::new()
            })
    }
}
