//! Similarity and error metrics over canonicalized text.
//!
//! Five metrics are supported, all scored in [0, 1]:
//!
//! | Metric | Kind | 1.0 means |
//! |--------|------|-----------|
//! | `accuracy` | similarity | best |
//! | `cer` | error rate | worst |
//! | `wer` | error rate | worst |
//! | `cosine_similarity` | similarity | best |
//! | `jaccard_similarity` | similarity | best |
//!
//! The direction asymmetry (1.0 is *worst* for the error rates and *best* for
//! the similarities) is part of the public contract; callers must not assume
//! one orientation.
//!
//! Metric names resolve through the closed [`Metric`] registry. An unknown
//! name fails with [`Error::InvalidMetric`] when the set is built, before any
//! computation runs.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-field metric scores, keyed by metric name.
pub type TextFieldResult = BTreeMap<String, f64>;

// =============================================================================
// Metric registry
// =============================================================================

/// The closed set of supported metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Position-wise character equality against the ground-truth length.
    Accuracy,
    /// Character error rate: edit distance over ground-truth length.
    Cer,
    /// Word error rate: edit distance of joined tokens over token count.
    Wer,
    /// Cosine of term-frequency vectors over the two-document corpus.
    CosineSimilarity,
    /// Token-set intersection over union.
    JaccardSimilarity,
}

impl Metric {
    /// Every supported metric, in canonical order.
    pub const ALL: [Metric; 5] = [
        Metric::Accuracy,
        Metric::Cer,
        Metric::Wer,
        Metric::CosineSimilarity,
        Metric::JaccardSimilarity,
    ];

    /// Canonical metric name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Cer => "cer",
            Metric::Wer => "wer",
            Metric::CosineSimilarity => "cosine_similarity",
            Metric::JaccardSimilarity => "jaccard_similarity",
        }
    }

    /// Resolve a metric by name.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMetric`] for names outside the registry.
    pub fn from_name(name: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| Error::invalid_metric(name))
    }

    /// Resolve a whole requested set up front.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMetric`] on the first unknown name; no metric is
    /// computed lazily against a half-validated set.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Metric>> {
        names
            .iter()
            .map(|name| Metric::from_name(name.as_ref()))
            .collect()
    }

    /// Whether 1.0 is the worst score for this metric.
    #[must_use]
    pub fn is_error_rate(&self) -> bool {
        matches!(self, Metric::Cer | Metric::Wer)
    }

    /// The worst possible score: 1.0 for error rates, 0.0 for similarities.
    #[must_use]
    pub fn worst(&self) -> f64 {
        if self.is_error_rate() {
            1.0
        } else {
            0.0
        }
    }

    /// Compute this metric over two canonicalized, non-empty strings.
    #[must_use]
    pub fn compute(&self, predicted: &str, ground_truth: &str) -> f64 {
        match self {
            Metric::Accuracy => accuracy(predicted, ground_truth),
            Metric::Cer => cer(predicted, ground_truth),
            Metric::Wer => wer(predicted, ground_truth),
            Metric::CosineSimilarity => cosine_similarity(predicted, ground_truth),
            Metric::JaccardSimilarity => jaccard_similarity(predicted, ground_truth),
        }
    }
}

// =============================================================================
// Metric functions
// =============================================================================

/// Position-wise character accuracy.
///
/// Pairs characters positionally and truncates at the shorter operand, so a
/// prediction longer than the reference is never penalized for its tail.
/// It is unclear whether that truncation was a deliberate choice or an
/// unnoticed defect in the historical scorer; it is kept as-is because
/// changing it would silently shift scores against previously published runs.
#[must_use]
pub fn accuracy(predicted: &str, ground_truth: &str) -> f64 {
    let reference_len = ground_truth.chars().count();
    if reference_len == 0 {
        return if predicted.is_empty() { 1.0 } else { 0.0 };
    }
    let correct = predicted
        .chars()
        .zip(ground_truth.chars())
        .filter(|(p, g)| p == g)
        .count();
    (correct as f64 / reference_len as f64).min(1.0)
}

/// Character error rate, clamped to 1.0.
///
/// # Examples
///
/// ```
/// use fideval::metric::cer;
///
/// assert!((cer("hallo", "hello") - 0.2).abs() < 1e-9);
/// assert_eq!(cer("same", "same"), 0.0);
/// ```
#[must_use]
pub fn cer(predicted: &str, ground_truth: &str) -> f64 {
    let reference_len = ground_truth.chars().count();
    if reference_len == 0 {
        return if predicted.is_empty() { 0.0 } else { 1.0 };
    }
    let edit_distance = strsim::levenshtein(predicted, ground_truth);
    (edit_distance as f64 / reference_len as f64).min(1.0)
}

/// Word error rate, clamped to 1.0.
///
/// Computed as Levenshtein distance over the whitespace-joined token strings
/// divided by the reference token count, not a token-level edit script.
/// Inherited simplification, kept for score compatibility.
#[must_use]
pub fn wer(predicted: &str, ground_truth: &str) -> f64 {
    let predicted_joined = predicted.split_whitespace().collect::<Vec<_>>().join(" ");
    let reference_joined = ground_truth
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let reference_words = ground_truth.split_whitespace().count().max(1);
    let edit_distance = strsim::levenshtein(&predicted_joined, &reference_joined);
    (edit_distance as f64 / reference_words as f64).min(1.0)
}

/// Cosine similarity of term-frequency vectors over the two-document corpus.
///
/// When both operands are exactly one token the vector space degenerates to a
/// single feature, so the pair is compared directly instead.
#[must_use]
pub fn cosine_similarity(predicted: &str, ground_truth: &str) -> f64 {
    let predicted_tokens: Vec<&str> = predicted.split_whitespace().collect();
    let reference_tokens: Vec<&str> = ground_truth.split_whitespace().collect();

    if predicted_tokens.len() == 1 && reference_tokens.len() == 1 {
        return if predicted == ground_truth { 1.0 } else { 0.0 };
    }
    if predicted_tokens.is_empty() || reference_tokens.is_empty() {
        return 0.0;
    }

    let vocabulary: HashSet<&str> = predicted_tokens
        .iter()
        .chain(reference_tokens.iter())
        .copied()
        .collect();

    let mut dot = 0.0;
    let mut predicted_norm = 0.0;
    let mut reference_norm = 0.0;
    for term in vocabulary {
        let p = predicted_tokens.iter().filter(|t| **t == term).count() as f64;
        let g = reference_tokens.iter().filter(|t| **t == term).count() as f64;
        dot += p * g;
        predicted_norm += p * p;
        reference_norm += g * g;
    }
    if predicted_norm == 0.0 || reference_norm == 0.0 {
        return 0.0;
    }
    // sqrt rounding can push an exact match an ulp past 1.0.
    (dot / (predicted_norm.sqrt() * reference_norm.sqrt())).min(1.0)
}

/// Jaccard similarity on whitespace token sets.
///
/// # Examples
///
/// ```
/// use fideval::metric::jaccard_similarity;
///
/// // "apple inc" and "apple" share 1 token, union has 2 → 0.5
/// assert!((jaccard_similarity("apple inc", "apple") - 0.5).abs() < 1e-9);
/// ```
#[must_use]
pub fn jaccard_similarity(predicted: &str, ground_truth: &str) -> f64 {
    let predicted_set: HashSet<&str> = predicted.split_whitespace().collect();
    let reference_set: HashSet<&str> = ground_truth.split_whitespace().collect();

    let intersection = predicted_set.intersection(&reference_set).count();
    let union = predicted_set.union(&reference_set).count();

    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

// =============================================================================
// Engine
// =============================================================================

/// Computes a fixed, pre-validated set of metrics over text pairs.
///
/// # Examples
///
/// ```
/// use fideval::MetricEngine;
///
/// let engine = MetricEngine::new(&["cer", "accuracy"]).unwrap();
/// let scores = engine.evaluate(Some("hallo"), Some("hello"));
/// assert!((scores["cer"] - 0.2).abs() < 1e-9);
/// assert!((scores["accuracy"] - 0.8).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct MetricEngine {
    metrics: Vec<Metric>,
}

impl MetricEngine {
    /// Build an engine from metric names, validating the whole set up front.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMetric`] if any name is unknown.
    pub fn new<S: AsRef<str>>(metric_names: &[S]) -> Result<Self> {
        Ok(Self {
            metrics: Metric::parse_all(metric_names)?,
        })
    }

    /// Build an engine from already-resolved metrics.
    #[must_use]
    pub fn with_metrics(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    /// The metrics this engine computes.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Score one scalar pair. `None` marks an absent value.
    ///
    /// Absent or empty operands never reach the metric functions:
    /// both absent → `accuracy = 1.0` and every other metric `0.0`;
    /// exactly one absent → every metric at its worst.
    #[must_use]
    pub fn evaluate(&self, predicted: Option<&str>, ground_truth: Option<&str>) -> TextFieldResult {
        let predicted = predicted.unwrap_or("");
        let ground_truth = ground_truth.unwrap_or("");
        if predicted.is_empty() || ground_truth.is_empty() {
            return self.absent_scores(predicted.is_empty() && ground_truth.is_empty());
        }
        self.metrics
            .iter()
            .map(|m| (m.name().to_string(), m.compute(predicted, ground_truth)))
            .collect()
    }

    /// Score paired lists, averaging each metric across pairs.
    ///
    /// The ground-truth length is authoritative: unlike scalar fields, list
    /// misalignment in either direction is fatal.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if the lists differ in length.
    pub fn evaluate_many(
        &self,
        predicted: &[Option<String>],
        ground_truth: &[Option<String>],
    ) -> Result<TextFieldResult> {
        if predicted.len() != ground_truth.len() {
            return Err(Error::LengthMismatch {
                predicted: predicted.len(),
                ground_truth: ground_truth.len(),
            });
        }
        if ground_truth.is_empty() {
            return Ok(self.absent_scores(true));
        }

        let mut sums: BTreeMap<String, f64> = self
            .metrics
            .iter()
            .map(|m| (m.name().to_string(), 0.0))
            .collect();
        for (pred, truth) in predicted.iter().zip(ground_truth.iter()) {
            let scores = self.evaluate(pred.as_deref(), truth.as_deref());
            for (name, value) in scores {
                if let Some(sum) = sums.get_mut(&name) {
                    *sum += value;
                }
            }
        }
        let count = ground_truth.len() as f64;
        Ok(sums.into_iter().map(|(name, sum)| (name, sum / count)).collect())
    }

    /// Scores for an absent pair: perfect agreement when both sides are
    /// absent, worst-case when only one is.
    #[must_use]
    pub fn absent_scores(&self, both_absent: bool) -> TextFieldResult {
        self.metrics
            .iter()
            .map(|m| {
                let score = if both_absent {
                    if *m == Metric::Accuracy {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    m.worst()
                };
                (m.name().to_string(), score)
            })
            .collect()
    }

    /// Every metric at its worst value. Used to penalize records that are
    /// entirely missing from the prediction.
    #[must_use]
    pub fn worst_scores(&self) -> TextFieldResult {
        self.metrics
            .iter()
            .map(|m| (m.name().to_string(), m.worst()))
            .collect()
    }
}
