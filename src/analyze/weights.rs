//! Engagement-derived confidence weight for a single comment.
//!
//! The coefficients are hand-tuned product values, not derived constants.
//! They live in `WeightConfig` so tests and offline calibration can vary
//! them independently; `Default` reproduces the shipped tuning exactly.
//!
//! JSON shape (for an optional override file):
//! {
//!   "w_upvotes": 0.32, "w_karma_a": 0.08, "w_karma_b": 0.24,
//!   "w_recency": 0.20, "w_credibility": 0.24,
//!   "log_divisor": 10.0, "decay_steepness": 0.08, "decay_midpoint": 60.0
//! }

use serde::Deserialize;
use std::{fs, io, path::Path};

/// Number of engagement factors expected per comment:
/// `[upvotes, karma_a, karma_b, recency]`.
pub const WEIGHT_FACTOR_COUNT: usize = 4;

/// Weight a comment carries when it has no usable engagement metadata.
pub const NEUTRAL_WEIGHT: f64 = 1.0;

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct WeightConfig {
    pub w_upvotes: f64,
    pub w_karma_a: f64,
    pub w_karma_b: f64,
    pub w_recency: f64,
    pub w_credibility: f64,
    /// Divisor applied to the log-scaled engagement counts.
    pub log_divisor: f64,
    /// Logistic decay: weight ~1 well before the midpoint, ~0 well after.
    /// Recency units are whatever the fetcher supplied; no conversion here.
    pub decay_steepness: f64,
    pub decay_midpoint: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        // The five coefficients sum to 1.0.
        Self {
            w_upvotes: 0.32,
            w_karma_a: 0.08,
            w_karma_b: 0.24,
            w_recency: 0.20,
            w_credibility: 0.24,
            log_divisor: 10.0,
            decay_steepness: 0.08,
            decay_midpoint: 60.0,
        }
    }
}

impl WeightConfig {
    /// Load an override from a JSON file (offline calibration runs).
    pub fn load_from_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Reduce engagement metadata to a non-negative confidence weight.
///
/// Absent or wrong-length factors yield [`NEUTRAL_WEIGHT`] so a comment
/// without metadata still counts at baseline influence. The result is
/// unbounded above (log of large engagement counts); the aggregator
/// normalizes by total weight, which absorbs the scale.
///
/// `credibility` is the comment's credibility rating in [0, 5]. Comments
/// rated -1 (not a review) are filtered out before weighting and must never
/// reach this function.
pub fn compute_weight(weight_factors: Option<&[f64]>, credibility: i32, cfg: &WeightConfig) -> f64 {
    let factors = match weight_factors {
        Some(f) if f.len() == WEIGHT_FACTOR_COUNT => f,
        _ => return NEUTRAL_WEIGHT,
    };
    let (upvotes, karma_a, karma_b, recency) = (factors[0], factors[1], factors[2], factors[3]);

    // Downvoted comments have a negative score; clamp before the log so the
    // weight stays finite and non-negative.
    let upvote_w = (upvotes.max(0.0) + 1.0).ln() / cfg.log_divisor;
    let karma_a_w = (karma_a.max(0.0) + 1.0).ln() / cfg.log_divisor;
    let karma_b_w = (karma_b.max(0.0) + 1.0).ln() / cfg.log_divisor;
    let recency_w = 1.0 / (1.0 + (cfg.decay_steepness * (recency - cfg.decay_midpoint)).exp());
    let credibility_w = (f64::from(credibility) / 5.0).powi(2);

    cfg.w_upvotes * upvote_w
        + cfg.w_karma_a * karma_a_w
        + cfg.w_karma_b * karma_b_w
        + cfg.w_recency * recency_w
        + cfg.w_credibility * credibility_w
}
