//! In-memory evaluation session over many files and test sets.
//!
//! The per-file orchestrator is deliberately stateless; this module supplies
//! the bookkeeping around it. An [`EvalSession`] validates files one at a
//! time, buckets their results under caller-chosen test-set identifiers, and
//! produces per-test-set and overall aggregates on demand. It owns no I/O:
//! loading predictions and persisting reports stay with the caller.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::aggregate::{aggregate_file_results, aggregate_testset_results, AggregateResult};
use crate::error::Result;
use crate::validate::{ValidationResult, Validator};

/// Accumulates validation results across files, grouped by test set.
///
/// # Examples
///
/// ```
/// use fideval::EvalSession;
/// use serde_json::json;
///
/// let mut session = EvalSession::new(&["cer"]).unwrap();
/// session
///     .evaluate_file("math", "page_1", &json!({"q": "hallo"}), &json!({"q": "hello"}))
///     .unwrap();
/// session
///     .evaluate_file("math", "page_2", &json!({"q": "hello"}), &json!({"q": "hello"}))
///     .unwrap();
///
/// let aggregate = session.aggregate_test_set("math").unwrap();
/// assert_eq!(aggregate.sample_size, 2);
/// assert!((aggregate.text_validation_results["q"]["cer"] - 0.1).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct EvalSession {
    validator: Validator,
    buckets: BTreeMap<String, Vec<ValidationResult>>,
}

impl EvalSession {
    /// Create a session scoring the given metrics.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidMetric`] if any name is unknown.
    pub fn new<S: AsRef<str>>(metric_names: &[S]) -> Result<Self> {
        Ok(Self {
            validator: Validator::new(metric_names)?,
            buckets: BTreeMap::new(),
        })
    }

    /// Validate one file and record its results under `test_set`.
    ///
    /// Returns the fresh per-record results. On error nothing is recorded;
    /// earlier files in the bucket are unaffected.
    pub fn evaluate_file(
        &mut self,
        test_set: &str,
        file_id: &str,
        predicted: &Value,
        ground_truth: &Value,
    ) -> Result<Vec<ValidationResult>> {
        let results = self.validator.run(file_id, predicted, ground_truth)?;
        log::debug!(
            "recorded {} result(s) for '{file_id}' in test set '{test_set}'",
            results.len()
        );
        self.buckets
            .entry(test_set.to_string())
            .or_default()
            .extend(results.iter().cloned());
        Ok(results)
    }

    /// Test-set identifiers seen so far.
    pub fn test_sets(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Raw results recorded for one test set.
    #[must_use]
    pub fn results(&self, test_set: &str) -> Option<&[ValidationResult]> {
        self.buckets.get(test_set).map(Vec::as_slice)
    }

    /// Aggregate one test set; `None` if it was never seen.
    #[must_use]
    pub fn aggregate_test_set(&self, test_set: &str) -> Option<AggregateResult> {
        self.buckets
            .get(test_set)
            .map(|results| aggregate_file_results(results))
    }

    /// Aggregate every test set, then reduce to one overall result.
    #[must_use]
    pub fn aggregate_all(&self) -> AggregateResult {
        let per_testset: BTreeMap<String, AggregateResult> = self
            .buckets
            .iter()
            .map(|(name, results)| (name.clone(), aggregate_file_results(results)))
            .collect();
        aggregate_testset_results(&per_testset)
    }
}
