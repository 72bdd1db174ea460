//! Aggregation of scored+weighted comments into one composite result.
//!
//! Pure logic, no I/O: the orchestrator feeds classified comments in and
//! sends the top-ranked texts to the summarizer afterwards. Suitable for
//! unit tests and future offline evaluation.

use tracing::debug;

use super::scoring::compute_score;
use super::weights::{compute_weight, WeightConfig};
use super::{MetricVector, CREDIBILITY_IDX, PUBLIC_METRIC_COUNT};

/// How many top-ranked comment texts feed the summary prompt.
pub const SUMMARY_TOP_N: usize = 5;

/// One review comment as assembled from the fetcher and the classifier.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    /// Permalink, display/attribution only; never used for scoring.
    pub url: String,
    /// Absent when the classifier returned nothing for this comment.
    pub metrics: Option<MetricVector>,
    /// `[upvotes, karma_a, karma_b, recency]`; absent or odd-length values
    /// are a valid state (weighting falls back to neutral), not an error.
    pub weight_factors: Option<Vec<f64>>,
}

impl Comment {
    /// A comment whose credibility rating is -1 was classified as "not an
    /// actual review" and is excluded from scoring, weighting, and ranking.
    /// Absent metrics exclude it the same way.
    pub fn is_review(&self) -> bool {
        matches!(self.metrics, Some(m) if m[CREDIBILITY_IDX] != -1)
    }
}

/// Output of [`process_comments`]. Created fresh per invocation, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// `(text, url)` pairs, weight-descending; ties keep input order.
    pub ranked_comments: Vec<(String, String)>,
    /// Weighted mean of per-comment scores, in [0, 5].
    pub final_score: f64,
    /// Independently normalized subscores: quality, cost, availability,
    /// utility. A metric nobody rated stays at 0.0.
    pub final_metrics: [f64; PUBLIC_METRIC_COUNT],
    /// Texts of the top [`SUMMARY_TOP_N`] ranked comments, for the summarizer.
    pub top_texts: Vec<String>,
}

impl Aggregate {
    /// The neutral result used by every no-data path.
    pub fn empty() -> Self {
        Self {
            ranked_comments: Vec::new(),
            final_score: 0.0,
            final_metrics: [0.0; PUBLIC_METRIC_COUNT],
            top_texts: Vec::new(),
        }
    }
}

/// Score, weight, and rank a batch of classified comments.
///
/// Non-reviews (see [`Comment::is_review`]) are dropped first. Each public
/// metric is normalized by the weight of only the comments that rated it,
/// so sparse metrics are not diluted by comments where they don't apply.
/// Everything degenerate (no survivors, zero total weight) yields the empty
/// aggregate rather than an error.
pub fn process_comments(comments: &[Comment], cfg: &WeightConfig) -> Aggregate {
    let mut total_weight = 0.0f64;
    let mut weighted_score_sum = 0.0f64;
    let mut weighted_metrics_sum = [0.0f64; PUBLIC_METRIC_COUNT];
    let mut metric_total_weight = [0.0f64; PUBLIC_METRIC_COUNT];

    let mut ranked: Vec<(&Comment, f64)> = Vec::with_capacity(comments.len());

    for c in comments {
        if !c.is_review() {
            continue;
        }
        // is_review() guarantees metrics are present past this point.
        let metrics = match &c.metrics {
            Some(m) => m,
            None => continue,
        };

        let score = compute_score(metrics);
        let weight = compute_weight(c.weight_factors.as_deref(), metrics[CREDIBILITY_IDX], cfg);

        total_weight += weight;
        weighted_score_sum += score * weight;

        for i in 0..PUBLIC_METRIC_COUNT {
            if metrics[i] >= 0 {
                weighted_metrics_sum[i] += f64::from(metrics[i]) * weight;
                metric_total_weight[i] += weight;
            }
        }

        ranked.push((c, weight));
    }

    // Stable sort: equal weights keep their input order.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let final_score = if total_weight > 0.0 {
        weighted_score_sum / total_weight
    } else {
        0.0
    };

    let mut final_metrics = [0.0f64; PUBLIC_METRIC_COUNT];
    for i in 0..PUBLIC_METRIC_COUNT {
        if metric_total_weight[i] > 0.0 {
            final_metrics[i] = weighted_metrics_sum[i] / metric_total_weight[i];
        }
    }

    debug!(
        kept = ranked.len(),
        dropped = comments.len() - ranked.len(),
        final_score,
        "aggregated comment batch"
    );

    let top_texts = ranked
        .iter()
        .take(SUMMARY_TOP_N)
        .map(|(c, _)| c.text.clone())
        .collect();

    Aggregate {
        ranked_comments: ranked
            .into_iter()
            .map(|(c, _)| (c.text.clone(), c.url.clone()))
            .collect(),
        final_score,
        final_metrics,
        top_texts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str, metrics: Option<MetricVector>, factors: Option<Vec<f64>>) -> Comment {
        Comment {
            text: text.to_string(),
            url: format!("https://reddit.com/{text}"),
            metrics,
            weight_factors: factors,
        }
    }

    #[test]
    fn empty_input_yields_empty_aggregate() {
        let agg = process_comments(&[], &WeightConfig::default());
        assert_eq!(agg, Aggregate::empty());
    }

    #[test]
    fn credibility_minus_one_is_dropped_entirely() {
        let cfg = WeightConfig::default();
        let agg = process_comments(
            &[
                comment("real", Some([4, 4, 4, 4, 5]), None),
                comment("spam", Some([5, 5, 5, 5, -1]), None),
                comment("unclassified", None, None),
            ],
            &cfg,
        );
        assert_eq!(agg.ranked_comments.len(), 1);
        assert_eq!(agg.ranked_comments[0].0, "real");
        assert!((agg.final_score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn equal_weights_keep_input_order() {
        // No weight factors: both get the neutral 1.0 weight.
        let cfg = WeightConfig::default();
        let agg = process_comments(
            &[
                comment("first", Some([3, 3, 3, 3, 4]), None),
                comment("second", Some([2, 2, 2, 2, 4]), None),
            ],
            &cfg,
        );
        assert_eq!(agg.ranked_comments[0].0, "first");
        assert_eq!(agg.ranked_comments[1].0, "second");
    }

    #[test]
    fn heavier_comment_ranks_first() {
        let cfg = WeightConfig::default();
        let agg = process_comments(
            &[
                comment("light", Some([3, 3, 3, 3, 1]), Some(vec![0.0, 0.0, 0.0, 9000.0])),
                comment("heavy", Some([3, 3, 3, 3, 5]), Some(vec![500.0, 100.0, 100.0, 1.0])),
            ],
            &cfg,
        );
        assert_eq!(agg.ranked_comments[0].0, "heavy");
    }

    #[test]
    fn per_metric_exclusion_is_independent() {
        // Rates cost and utility only; quality/availability stay untouched.
        let cfg = WeightConfig::default();
        let agg = process_comments(&[comment("partial", Some([-1, 3, -1, 2, 4]), None)], &cfg);
        assert_eq!(agg.final_metrics[0], 0.0);
        assert!((agg.final_metrics[1] - 3.0).abs() < 1e-12);
        assert_eq!(agg.final_metrics[2], 0.0);
        assert!((agg.final_metrics[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn metrics_normalize_over_raters_only() {
        // Both comments have neutral weight 1.0. Only the first rates cost,
        // so cost must equal its rating, undiluted by the second comment.
        let cfg = WeightConfig::default();
        let agg = process_comments(
            &[
                comment("a", Some([4, 1, -1, -1, 3]), None),
                comment("b", Some([2, -1, -1, -1, 3]), None),
            ],
            &cfg,
        );
        assert!((agg.final_metrics[0] - 3.0).abs() < 1e-12);
        assert!((agg.final_metrics[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn final_score_is_weight_averaged() {
        let cfg = WeightConfig::default();
        let heavy = comment("heavy", Some([5, 5, 5, 5, 5]), Some(vec![1000.0, 0.0, 0.0, 1.0]));
        let light = comment("light", Some([1, 1, 1, 1, 5]), Some(vec![0.0, 0.0, 0.0, 9000.0]));
        let agg = process_comments(&[light, heavy], &cfg);
        // The weighted mean must sit strictly above the midpoint, pulled
        // towards the heavy 5.0 comment.
        assert!(agg.final_score > 3.0);
        assert!(agg.final_score < 5.0);
        assert_eq!(agg.ranked_comments[0].0, "heavy");
    }

    #[test]
    fn downvoted_comment_does_not_poison_the_batch() {
        let cfg = WeightConfig::default();
        let agg = process_comments(
            &[
                comment("praised", Some([5, 5, 5, 5, 5]), Some(vec![10.0, 0.0, 0.0, 1.0])),
                comment("downvoted", Some([2, 2, 2, 2, 3]), Some(vec![-7.0, 0.0, 0.0, 1.0])),
            ],
            &cfg,
        );
        assert_eq!(agg.ranked_comments.len(), 2);
        assert!(agg.final_score.is_finite());
        assert!(agg.final_score > 0.0);
        for m in agg.final_metrics {
            assert!(m.is_finite());
            assert!(m > 0.0);
        }
        assert_eq!(agg.ranked_comments[0].0, "praised");
    }

    #[test]
    fn top_texts_cap_at_five() {
        let cfg = WeightConfig::default();
        let comments: Vec<Comment> = (0..8)
            .map(|i| comment(&format!("c{i}"), Some([3, 3, 3, 3, 3]), None))
            .collect();
        let agg = process_comments(&comments, &cfg);
        assert_eq!(agg.ranked_comments.len(), 8);
        assert_eq!(agg.top_texts.len(), SUMMARY_TOP_N);
        // Neutral weights everywhere, so input order survives.
        assert_eq!(agg.top_texts[0], "c0");
    }
}
