//! Typed adapter for classifier metric output.
//!
//! The upstream LLM is asked for a JSON object mapping each review to its
//! five ratings, but what actually comes back varies: keys may be 0-based
//! indices, 1-based indices, or the verbatim comment text; the payload may
//! be wrapped in a markdown code fence; individual entries may be malformed.
//! All of that tolerance lives here, so the aggregator never sees it.
//!
//! Contract decision for integer keys: they are 0-based unless the mapping
//! has a key `1` and no key `0`, in which case the whole mapping is treated
//! as 1-based and shifted down. Mixed conventions in one payload are not a
//! thing we try to rescue.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::analyze::{MetricVector, METRIC_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("classifier output is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("classifier output is not a JSON object")]
    NotAnObject,
}

/// Parsed classifier ratings, addressable by batch index or verbatim text.
#[derive(Debug, Clone, Default)]
pub struct ClassifierRatings {
    by_index: HashMap<usize, MetricVector>,
    by_text: HashMap<String, MetricVector>,
}

impl ClassifierRatings {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty() && self.by_text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_index.len() + self.by_text.len()
    }

    /// Find the rating for the comment at `index` with body `text`, under
    /// whichever keying the classifier used. `None` means the comment had
    /// no usable entry and gets dropped before aggregation.
    pub fn lookup(&self, index: usize, text: &str) -> Option<MetricVector> {
        self.by_index
            .get(&index)
            .or_else(|| self.by_text.get(text))
            .copied()
    }
}

/// Parse raw classifier text into ratings.
///
/// Structural failures (not JSON, not an object) are typed errors the caller
/// downgrades to an empty mapping. Per-entry failures (wrong vector length,
/// out-of-range rating, non-integer) silently drop that entry only.
pub fn parse_ratings(raw: &str) -> Result<ClassifierRatings, ParseError> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let map = value.as_object().ok_or(ParseError::NotAnObject)?;

    let mut by_index: HashMap<usize, MetricVector> = HashMap::new();
    let mut by_text: HashMap<String, MetricVector> = HashMap::new();

    for (key, val) in map {
        let Some(vector) = metric_vector(val) else {
            debug!(key, "dropping malformed classifier entry");
            continue;
        };
        match key.parse::<usize>() {
            Ok(idx) => {
                by_index.insert(idx, vector);
            }
            Err(_) => {
                by_text.insert(key.clone(), vector);
            }
        }
    }

    // 1-based detection: a key `1` with no key `0` shifts everything down.
    if !by_index.is_empty() && !by_index.contains_key(&0) && by_index.contains_key(&1) {
        by_index = by_index
            .into_iter()
            .map(|(idx, v)| (idx - 1, v))
            .collect();
    }

    Ok(ClassifierRatings { by_index, by_text })
}

/// Validate one classifier value as a metric vector: exactly five integers,
/// each in [-1, 5].
fn metric_vector(val: &Value) -> Option<MetricVector> {
    let arr = val.as_array()?;
    if arr.len() != METRIC_COUNT {
        return None;
    }
    let mut out = [0i32; METRIC_COUNT];
    for (i, entry) in arr.iter().enumerate() {
        let n = entry.as_i64()?;
        if !(-1..=5).contains(&n) {
            return None;
        }
        out[i] = n as i32;
    }
    Some(out)
}

/// Strip a surrounding markdown code fence (```json ... ```) if present.
/// Models ignore "reply with raw JSON" often enough that this is routine.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line, if any.
    match body.split_once('\n') {
        Some((_, after)) => after.trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keyed_mapping_parses() {
        let raw = r#"{"great battery": [5, -1, -1, 4, 5], "too pricey": [-1, 1, -1, 2, 4]}"#;
        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings.lookup(7, "great battery"), Some([5, -1, -1, 4, 5]));
        assert_eq!(ratings.lookup(0, "unknown"), None);
    }

    #[test]
    fn zero_based_index_mapping_parses() {
        let raw = r#"{"0": [1, 2, 3, 4, 5], "1": [5, 4, 3, 2, 1]}"#;
        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.lookup(0, "whatever"), Some([1, 2, 3, 4, 5]));
        assert_eq!(ratings.lookup(1, "whatever"), Some([5, 4, 3, 2, 1]));
    }

    #[test]
    fn one_based_index_mapping_is_shifted() {
        let raw = r#"{"1": [1, 1, 1, 1, 1], "2": [2, 2, 2, 2, 2]}"#;
        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.lookup(0, ""), Some([1, 1, 1, 1, 1]));
        assert_eq!(ratings.lookup(1, ""), Some([2, 2, 2, 2, 2]));
        assert_eq!(ratings.lookup(2, ""), None);
    }

    #[test]
    fn fenced_payload_parses() {
        let raw = "```json\n{\"0\": [3, 3, 3, 3, 3]}\n```";
        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.lookup(0, ""), Some([3, 3, 3, 3, 3]));
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let raw = r#"{
            "ok": [1, 2, 3, 4, 5],
            "too_short": [1, 2, 3],
            "out_of_range": [9, 0, 0, 0, 0],
            "not_ints": ["a", "b", "c", "d", "e"],
            "not_array": "nope"
        }"#;
        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings.lookup(0, "ok"), Some([1, 2, 3, 4, 5]));
    }

    #[test]
    fn prose_payload_is_a_typed_error() {
        let err = parse_ratings("Sorry, I cannot rate these reviews.").unwrap_err();
        assert!(matches!(err, ParseError::NotJson(_)));
    }

    #[test]
    fn non_object_json_is_a_typed_error() {
        let err = parse_ratings("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject));
    }

    #[test]
    fn partial_mapping_is_fine() {
        // Classifier rated only one of three comments; the rest just miss.
        let raw = r#"{"2": [4, 4, 4, 4, 4], "0": [1, 1, 1, 1, 1]}"#;
        let ratings = parse_ratings(raw).unwrap();
        assert!(ratings.lookup(1, "middle comment").is_none());
        assert!(ratings.lookup(2, "").is_some());
    }
}
