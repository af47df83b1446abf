//! Result aggregation across files and test sets.
//!
//! Two reduction levels, both pure folds over immutable inputs:
//!
//! 1. [`aggregate_file_results`] reduces one test set's per-record results
//!    into averaged text metrics, a schema-validity percentage, the
//!    concatenated missing-field list, accumulated boolean confusion counts,
//!    and per-field F1.
//! 2. [`aggregate_testset_results`] reduces per-test-set aggregates into one
//!    overall result by treating each aggregate as a single result and
//!    re-applying the same logic, so aggregating a single wrapped test set
//!    returns it unchanged.
//!
//! Missing-field lists are deliberately *not* deduplicated: a field missing
//! from forty files should weigh more than a field missing from one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validate::ValidationResult;

// =============================================================================
// Result types
// =============================================================================

/// Boolean confusion counts for one field.
///
/// A positive is a ground-truth `true`. Judgments whose predicted value is
/// unknown (`None`) land in no bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Predicted true, expected true.
    #[serde(rename = "TP")]
    pub true_positives: usize,
    /// Predicted false (or unjudgeable), expected true.
    #[serde(rename = "FN")]
    pub false_negatives: usize,
    /// Predicted true, expected false.
    #[serde(rename = "FP")]
    pub false_positives: usize,
}

impl ConfusionCounts {
    /// Record one judged prediction.
    pub fn record(&mut self, predicted: bool, expected: bool) {
        match (expected, predicted) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_negatives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => {}
        }
    }

    /// Fold another count set into this one.
    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.true_positives += other.true_positives;
        self.false_negatives += other.false_negatives;
        self.false_positives += other.false_positives;
    }

    /// Precision; 0.0 when nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        let predicted_positive = self.true_positives + self.false_positives;
        if predicted_positive == 0 {
            return 0.0;
        }
        self.true_positives as f64 / predicted_positive as f64
    }

    /// Recall; 0.0 when nothing was actually positive.
    #[must_use]
    pub fn recall(&self) -> f64 {
        let actual_positive = self.true_positives + self.false_negatives;
        if actual_positive == 0 {
            return 0.0;
        }
        self.true_positives as f64 / actual_positive as f64
    }

    /// Harmonic mean of precision and recall; 0.0 when both are 0.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }
}

/// Aggregated fidelity outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FidelityAggregate {
    /// Share of results with a structurally valid record, in [0, 100].
    pub schema_validity_percentage: f64,
    /// Concatenation of every result's missing fields, duplicates preserved.
    pub missing_fields: Vec<String>,
    /// Accumulated confusion counts per boolean field.
    pub boolean_result: BTreeMap<String, ConfusionCounts>,
    /// F1 per boolean field, derived from `boolean_result`.
    pub f1_score: BTreeMap<String, f64>,
}

/// Aggregated outcome for one test set (or for all test sets combined).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Average score per field per metric.
    pub text_validation_results: BTreeMap<String, BTreeMap<String, f64>>,
    /// Aggregated structural and boolean outcome.
    pub fidelity_validation_results: FidelityAggregate,
    /// Number of results (or summed sample sizes) behind the averages.
    pub sample_size: usize,
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "samples: {}", self.sample_size)?;
        writeln!(
            f,
            "schema validity: {:.1}%",
            self.fidelity_validation_results.schema_validity_percentage
        )?;
        for (field, metrics) in &self.text_validation_results {
            let scores: Vec<String> = metrics
                .iter()
                .map(|(name, value)| format!("{name}={value:.3}"))
                .collect();
            writeln!(f, "{field}: {}", scores.join(", "))?;
        }
        for (field, f1) in &self.fidelity_validation_results.f1_score {
            writeln!(f, "{field}: f1={f1:.3}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Reductions
// =============================================================================

/// Reduce one test set's per-record results into an [`AggregateResult`].
///
/// Each metric is averaged over however many results carried that field, so
/// a field skipped in some files does not drag its average toward zero.
/// An empty input yields a fully-populated zero/empty result.
///
/// # Examples
///
/// ```
/// use fideval::{aggregate_file_results, Validator};
/// use serde_json::json;
///
/// let validator = Validator::new(&["cer"]).unwrap();
/// let results = validator
///     .run("f", &json!({"text": "hallo"}), &json!({"text": "hello"}))
///     .unwrap();
/// let aggregate = aggregate_file_results(&results);
/// assert_eq!(aggregate.sample_size, 1);
/// assert_eq!(aggregate.fidelity_validation_results.schema_validity_percentage, 100.0);
/// ```
#[must_use]
pub fn aggregate_file_results(results: &[ValidationResult]) -> AggregateResult {
    if results.is_empty() {
        return AggregateResult::default();
    }

    let mut sums: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    let mut valid_count = 0usize;
    let mut missing_fields = Vec::new();
    let mut boolean_result: BTreeMap<String, ConfusionCounts> = BTreeMap::new();

    for result in results {
        if result.fidelity.schema_valid {
            valid_count += 1;
        }
        missing_fields.extend(result.fidelity.missing_fields.iter().cloned());

        for (field, judgment) in &result.fidelity.boolean_judgments {
            let counts = boolean_result.entry(field.clone()).or_default();
            // An unjudgeable prediction still registers the field, but
            // contributes to no bucket.
            if let Some(predicted) = judgment.predicted {
                counts.record(predicted, judgment.expected);
            } else if judgment.expected {
                counts.false_negatives += 1;
            }
        }

        for (field, metrics) in &result.text {
            let field_sums = sums.entry(field.clone()).or_default();
            for (metric, value) in metrics {
                let (sum, count) = field_sums.entry(metric.clone()).or_insert((0.0, 0));
                *sum += value;
                *count += 1;
            }
        }
    }

    let text_validation_results = sums
        .into_iter()
        .map(|(field, metrics)| {
            let averaged = metrics
                .into_iter()
                .map(|(metric, (sum, count))| (metric, sum / count as f64))
                .collect();
            (field, averaged)
        })
        .collect();

    let f1_score = boolean_result
        .iter()
        .map(|(field, counts)| (field.clone(), counts.f1()))
        .collect();

    AggregateResult {
        text_validation_results,
        fidelity_validation_results: FidelityAggregate {
            schema_validity_percentage: 100.0 * valid_count as f64 / results.len() as f64,
            missing_fields,
            boolean_result,
            f1_score,
        },
        sample_size: results.len(),
    }
}

/// Reduce per-test-set aggregates into one overall result.
///
/// Each test set counts as one result: text metrics and validity percentages
/// are averaged across test sets, missing fields concatenated, confusion
/// counts summed (with F1 recomputed from the sums), and sample sizes summed.
/// Re-aggregating a single test set returns it unchanged.
#[must_use]
pub fn aggregate_testset_results(
    per_testset: &BTreeMap<String, AggregateResult>,
) -> AggregateResult {
    if per_testset.is_empty() {
        return AggregateResult::default();
    }

    let mut sums: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
    let mut validity_sum = 0.0;
    let mut missing_fields = Vec::new();
    let mut boolean_result: BTreeMap<String, ConfusionCounts> = BTreeMap::new();
    let mut sample_size = 0usize;

    for aggregate in per_testset.values() {
        validity_sum += aggregate
            .fidelity_validation_results
            .schema_validity_percentage;
        missing_fields.extend(
            aggregate
                .fidelity_validation_results
                .missing_fields
                .iter()
                .cloned(),
        );
        for (field, counts) in &aggregate.fidelity_validation_results.boolean_result {
            boolean_result.entry(field.clone()).or_default().merge(counts);
        }
        for (field, metrics) in &aggregate.text_validation_results {
            let field_sums = sums.entry(field.clone()).or_default();
            for (metric, value) in metrics {
                let (sum, count) = field_sums.entry(metric.clone()).or_insert((0.0, 0));
                *sum += value;
                *count += 1;
            }
        }
        sample_size += aggregate.sample_size;
    }

    let text_validation_results = sums
        .into_iter()
        .map(|(field, metrics)| {
            let averaged = metrics
                .into_iter()
                .map(|(metric, (sum, count))| (metric, sum / count as f64))
                .collect();
            (field, averaged)
        })
        .collect();

    let f1_score = boolean_result
        .iter()
        .map(|(field, counts)| (field.clone(), counts.f1()))
        .collect();

    AggregateResult {
        text_validation_results,
        fidelity_validation_results: FidelityAggregate {
            schema_validity_percentage: validity_sum / per_testset.len() as f64,
            missing_fields,
            boolean_result,
            f1_score,
        },
        sample_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Validator;
    use serde_json::json;

    fn sample_results() -> Vec<ValidationResult> {
        let validator = Validator::new(&["cer", "accuracy"]).unwrap();
        let mut results = validator
            .run("a", &json!({"q": "hallo", "ok": true}), &json!({"q": "hello", "ok": true}))
            .unwrap();
        results.extend(
            validator
                .run("b", &json!({"ok": false}), &json!({"q": "hello", "ok": true}))
                .unwrap(),
        );
        results
    }

    #[test]
    fn test_file_aggregation() {
        let aggregate = aggregate_file_results(&sample_results());

        assert_eq!(aggregate.sample_size, 2);
        let fidelity = &aggregate.fidelity_validation_results;
        assert_eq!(fidelity.schema_validity_percentage, 50.0);
        assert_eq!(fidelity.missing_fields, ["q"]);

        // "q" was only comparable in the first result.
        assert!((aggregate.text_validation_results["q"]["cer"] - 0.2).abs() < 1e-9);

        // ok: one TP (file a), one FN (file b).
        let counts = fidelity.boolean_result["ok"];
        assert_eq!(counts.true_positives, 1);
        assert_eq!(counts.false_negatives, 1);
        assert_eq!(counts.false_positives, 0);
        assert!((fidelity.f1_score["ok"] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_yields_populated_defaults() {
        let aggregate = aggregate_file_results(&[]);
        assert_eq!(aggregate.sample_size, 0);
        assert_eq!(
            aggregate.fidelity_validation_results.schema_validity_percentage,
            0.0
        );
        assert!(aggregate.text_validation_results.is_empty());
        assert!(aggregate.fidelity_validation_results.missing_fields.is_empty());
    }

    #[test]
    fn test_f1_zero_without_division_errors() {
        let mut counts = ConfusionCounts::default();
        assert_eq!(counts.f1(), 0.0);

        counts.record(true, false); // FP only
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
    }

    #[test]
    fn test_testset_aggregation_idempotent() {
        let aggregate = aggregate_file_results(&sample_results());
        let mut wrapped = BTreeMap::new();
        wrapped.insert("only".to_string(), aggregate.clone());

        assert_eq!(aggregate_testset_results(&wrapped), aggregate);
    }

    #[test]
    fn test_testset_aggregation_combines() {
        let validator = Validator::new(&["cer"]).unwrap();
        let set_a = aggregate_file_results(
            &validator
                .run("a", &json!({"q": "hello"}), &json!({"q": "hello"}))
                .unwrap(),
        );
        let set_b = aggregate_file_results(
            &validator
                .run("b", &json!({}), &json!({"q": "hello"}))
                .unwrap(),
        );

        let mut per_testset = BTreeMap::new();
        per_testset.insert("a".to_string(), set_a);
        per_testset.insert("b".to_string(), set_b);
        let overall = aggregate_testset_results(&per_testset);

        assert_eq!(overall.sample_size, 2);
        assert_eq!(
            overall.fidelity_validation_results.schema_validity_percentage,
            50.0
        );
        assert_eq!(overall.fidelity_validation_results.missing_fields, ["q"]);
        // Set b skipped "q" entirely, so only set a's average contributes.
        assert_eq!(overall.text_validation_results["q"]["cer"], 0.0);
    }

    #[test]
    fn test_aggregation_does_not_mutate_inputs() {
        let results = sample_results();
        let before = results.clone();
        let _ = aggregate_file_results(&results);
        assert_eq!(results, before);
    }
}
