//! Structural fidelity validation: required fields and boolean judgment.
//!
//! Fidelity is independent of free-text similarity. A record is structurally
//! valid when every field the schema requires is present; boolean fields are
//! additionally judged by direct equality against the ground truth. Boolean
//! mismatches are reported but never affect structural validity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::Schema;

/// One boolean field's judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanJudgment {
    /// Predicted value; `None` when the field is absent or not a boolean.
    pub predicted: Option<bool>,
    /// Ground-truth value.
    pub expected: bool,
}

/// Fidelity outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityResult {
    /// True iff no required field is missing from the prediction.
    pub schema_valid: bool,
    /// Required fields absent from the prediction, in schema order.
    pub missing_fields: Vec<String>,
    /// Judgment per boolean-valued ground-truth field.
    pub boolean_judgments: BTreeMap<String, BooleanJudgment>,
}

impl FidelityResult {
    /// Result for a record entirely absent from the prediction: invalid,
    /// every required field missing, nothing to judge.
    #[must_use]
    pub(crate) fn absent_record(schema: &Schema) -> Self {
        log::warn!("predicted record is absent; all required fields count as missing");
        FidelityResult {
            schema_valid: false,
            missing_fields: schema.required_fields.clone(),
            boolean_judgments: BTreeMap::new(),
        }
    }
}

/// Validate one predicted record against the schema and its ground truth.
///
/// Extra predicted fields are never an error; predictions may legitimately
/// add metadata such as a file identifier.
#[must_use]
pub fn validate_record(
    predicted: &Map<String, Value>,
    ground_truth: &Map<String, Value>,
    schema: &Schema,
) -> FidelityResult {
    let missing_fields: Vec<String> = schema
        .required_fields
        .iter()
        .filter(|field| !predicted.contains_key(*field))
        .cloned()
        .collect();
    if !missing_fields.is_empty() {
        log::warn!("predicted record is missing fields: {missing_fields:?}");
    }

    let mut boolean_judgments = BTreeMap::new();
    for (field, value) in ground_truth {
        let Value::Bool(expected) = value else {
            continue;
        };
        let predicted_bool = match predicted.get(field) {
            Some(Value::Bool(b)) => Some(*b),
            // Absent, or present with a non-boolean kind: nothing to judge.
            _ => None,
        };
        if let Some(actual) = predicted_bool {
            if actual != *expected {
                log::warn!(
                    "boolean field '{field}' mismatch: predicted {actual}, expected {expected}"
                );
            }
        }
        boolean_judgments.insert(
            field.clone(),
            BooleanJudgment {
                predicted: predicted_bool,
                expected: *expected,
            },
        );
    }

    FidelityResult {
        schema_valid: missing_fields.is_empty(),
        missing_fields,
        boolean_judgments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_record() {
        let truth = record(json!({"q1": "answer", "ok": true}));
        let predicted = record(json!({"q1": "answer", "ok": true, "file_name": "a.json"}));
        let schema = Schema::infer(&Value::Object(truth.clone())).unwrap();

        let result = validate_record(&predicted, &truth, &schema);
        assert!(result.schema_valid);
        assert!(result.missing_fields.is_empty());
        assert_eq!(
            result.boolean_judgments["ok"],
            BooleanJudgment {
                predicted: Some(true),
                expected: true,
            }
        );
    }

    #[test]
    fn test_missing_fields_in_schema_order() {
        let truth = record(json!({"q1": "a", "q2": "b", "q3": "c"}));
        let predicted = record(json!({"q2": "b"}));
        let schema = Schema::infer(&Value::Object(truth.clone())).unwrap();

        let result = validate_record(&predicted, &truth, &schema);
        assert!(!result.schema_valid);
        assert_eq!(result.missing_fields, ["q1", "q3"]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let truth = record(json!({"q1": "a"}));
        let predicted = record(json!({"q1": "a", "confidence": 0.99}));
        let schema = Schema::infer(&Value::Object(truth.clone())).unwrap();

        assert!(validate_record(&predicted, &truth, &schema).schema_valid);
    }

    #[test]
    fn test_boolean_mismatch_does_not_invalidate() {
        let truth = record(json!({"ok": true}));
        let predicted = record(json!({"ok": false}));
        let schema = Schema::infer(&Value::Object(truth.clone())).unwrap();

        let result = validate_record(&predicted, &truth, &schema);
        assert!(result.schema_valid);
        assert_eq!(
            result.boolean_judgments["ok"],
            BooleanJudgment {
                predicted: Some(false),
                expected: true,
            }
        );
    }

    #[test]
    fn test_non_boolean_prediction_recorded_as_none() {
        let truth = record(json!({"ok": true}));
        let predicted = record(json!({"ok": "yes"}));
        let schema = Schema::infer(&Value::Object(truth.clone())).unwrap();

        let result = validate_record(&predicted, &truth, &schema);
        assert_eq!(
            result.boolean_judgments["ok"],
            BooleanJudgment {
                predicted: None,
                expected: true,
            }
        );
    }

    #[test]
    fn test_absent_record() {
        let truth = record(json!({"q1": "a", "ok": true}));
        let schema = Schema::infer(&Value::Object(truth)).unwrap();

        let result = FidelityResult::absent_record(&schema);
        assert!(!result.schema_valid);
        assert_eq!(result.missing_fields, schema.required_fields);
        assert!(result.boolean_judgments.is_empty());
    }
}
