//! Error types for fideval.

use thiserror::Error;

/// Result type for fideval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fideval operations.
///
/// Every variant is a malformed-evaluation-input condition: evaluation of the
/// offending file stops, nothing is partially recorded.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Ground-truth document is empty, so nothing can be validated against it.
    #[error("ground truth is empty: {0}")]
    EmptyGroundTruth(String),

    /// A requested metric name is not in the registry.
    #[error("unknown metric '{0}'")]
    InvalidMetric(String),

    /// Paired lists being compared do not have matching lengths.
    #[error("predicted list has {predicted} elements, ground truth has {ground_truth}")]
    LengthMismatch {
        /// Length of the predicted list.
        predicted: usize,
        /// Length of the ground-truth list.
        ground_truth: usize,
    },

    /// The sample given to schema inference carries no fields.
    #[error("schema sample is empty: {0}")]
    EmptySample(String),

    /// Predicted and ground-truth values for the same field have different
    /// JSON kinds.
    #[error("type mismatch for '{field}': predicted is {predicted}, ground truth is {ground_truth}")]
    TypeMismatch {
        /// Field (or document position) where the kinds diverged.
        field: String,
        /// JSON kind of the predicted value.
        predicted: &'static str,
        /// JSON kind of the ground-truth value.
        ground_truth: &'static str,
    },
}

impl Error {
    /// Create an empty-ground-truth error.
    pub fn empty_ground_truth(msg: impl Into<String>) -> Self {
        Error::EmptyGroundTruth(msg.into())
    }

    /// Create an invalid-metric error.
    pub fn invalid_metric(name: impl Into<String>) -> Self {
        Error::InvalidMetric(name.into())
    }

    /// Create an empty-sample error.
    pub fn empty_sample(msg: impl Into<String>) -> Self {
        Error::EmptySample(msg.into())
    }

    /// Create a type-mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        predicted: &'static str,
        ground_truth: &'static str,
    ) -> Self {
        Error::TypeMismatch {
            field: field.into(),
            predicted,
            ground_truth,
        }
    }
}

/// JSON kind name of a value, for diagnostics.
#[must_use]
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_metric("bleu");
        assert_eq!(err.to_string(), "unknown metric 'bleu'");

        let err = Error::LengthMismatch {
            predicted: 3,
            ground_truth: 2,
        };
        assert!(err.to_string().contains("3 elements"));
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
        assert_eq!(json_kind(&serde_json::json!([1, 2])), "array");
        assert_eq!(json_kind(&serde_json::json!({"a": 1})), "object");
    }
}
