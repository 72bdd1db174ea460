// src/analyze/mod.rs
//! Scoring/weighting/aggregation pipeline: turns classified comments into a
//! composite rating, per-metric subscores, and a weight-ranked comment list.

pub mod aggregate;
pub mod scoring;
pub mod weights;

// Re-export convenient types.
pub use aggregate::{process_comments, Aggregate, Comment};
pub use scoring::compute_score;
pub use weights::{compute_weight, WeightConfig};

/// Length of a classifier metric vector: quality, cost, availability,
/// utility, credibility. Each entry is in [-1, 5]; -1 means "not applicable".
pub const METRIC_COUNT: usize = 5;

/// Index of the credibility entry inside a metric vector.
pub const CREDIBILITY_IDX: usize = 4;

/// Number of public subscores (quality, cost, availability, utility).
/// Credibility drives filtering and weighting but is never reported.
pub const PUBLIC_METRIC_COUNT: usize = 4;

/// A comment's metric ratings as returned by the classifier.
pub type MetricVector = [i32; METRIC_COUNT];
