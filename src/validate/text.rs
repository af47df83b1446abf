//! Per-field text similarity validation.
//!
//! Walks the ground-truth fields of one record and scores each comparable
//! one through the [`MetricEngine`]. Unlike fidelity validation, which tracks
//! what is *missing*, text validation only scores what is *comparable*:
//!
//! - the identifier field (`file_name`) is always skipped;
//! - fields absent from the prediction are skipped silently;
//! - boolean ground-truth fields never reach the metric engine (they belong
//!   to fidelity's equality judgment) and contribute no entry;
//! - nested objects carry no directly comparable text and contribute no
//!   entry.
//!
//! A record entirely absent from the prediction is the exception: every
//! non-boolean required field is scored at its worst, so a dropped record
//! drags the aggregate instead of vanishing from it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{json_kind, Error, Result};
use crate::metric::{MetricEngine, TextFieldResult};
use crate::normalize::Normalized;
use crate::schema::Schema;
use crate::validate::FILE_ID_FIELD;

/// Text scores for one record, keyed by field name.
pub type TextRecordResult = BTreeMap<String, TextFieldResult>;

/// A field value in comparison form.
enum TextOperand {
    /// One canonicalized text value; `None` marks null/empty.
    Scalar(Option<String>),
    /// A list of canonicalized text values.
    List(Vec<Option<String>>),
    /// Boolean: never text-compared.
    Boolean,
    /// Object, or a list containing non-text elements: nothing to compare.
    Structured,
}

impl TextOperand {
    fn classify(value: &Value) -> TextOperand {
        match value {
            Value::Object(_) => TextOperand::Structured,
            Value::Array(items) => {
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    match Normalized::from_value(item) {
                        Some(Normalized::Absent) => elements.push(None),
                        Some(Normalized::Text(text)) => elements.push(Some(text)),
                        Some(Normalized::Bool(_)) | None => return TextOperand::Structured,
                    }
                }
                TextOperand::List(elements)
            }
            scalar => match Normalized::from_value(scalar) {
                Some(Normalized::Absent) => TextOperand::Scalar(None),
                Some(Normalized::Bool(_)) => TextOperand::Boolean,
                Some(Normalized::Text(text)) => TextOperand::Scalar(Some(text)),
                None => TextOperand::Structured,
            },
        }
    }

    fn is_absent(&self) -> bool {
        match self {
            TextOperand::Scalar(text) => text.is_none(),
            TextOperand::List(elements) => elements.is_empty(),
            _ => false,
        }
    }
}

/// Score every comparable field of one predicted record.
///
/// # Errors
///
/// [`Error::TypeMismatch`] when predicted and ground-truth values for a field
/// have incompatible JSON kinds (scalar vs. list, boolean vs. text);
/// [`Error::LengthMismatch`] when paired lists differ in length.
pub fn validate_record(
    predicted: &Map<String, Value>,
    ground_truth: &Map<String, Value>,
    engine: &MetricEngine,
) -> Result<TextRecordResult> {
    let mut results = TextRecordResult::new();
    for (field, truth_value) in ground_truth {
        if field == FILE_ID_FIELD {
            continue;
        }
        let Some(predicted_value) = predicted.get(field) else {
            log::warn!("field '{field}' absent from prediction; no metrics recorded");
            continue;
        };

        let truth_operand = TextOperand::classify(truth_value);
        match truth_operand {
            TextOperand::Boolean => continue,
            TextOperand::Structured => {
                log::debug!("field '{field}' carries no directly comparable text; skipped");
                continue;
            }
            _ => {}
        }
        let predicted_operand = TextOperand::classify(predicted_value);

        if predicted_operand.is_absent() || truth_operand.is_absent() {
            let both = predicted_operand.is_absent() && truth_operand.is_absent();
            results.insert(field.clone(), engine.absent_scores(both));
            continue;
        }

        match (predicted_operand, truth_operand) {
            (TextOperand::Scalar(pred), TextOperand::Scalar(truth)) => {
                results.insert(
                    field.clone(),
                    engine.evaluate(pred.as_deref(), truth.as_deref()),
                );
            }
            (TextOperand::List(pred), TextOperand::List(truth)) => {
                results.insert(field.clone(), engine.evaluate_many(&pred, &truth)?);
            }
            _ => {
                return Err(Error::type_mismatch(
                    field.clone(),
                    json_kind(predicted_value),
                    json_kind(truth_value),
                ));
            }
        }
    }
    Ok(results)
}

/// Worst-case scores for a record entirely absent from the prediction:
/// one entry per non-boolean, non-identifier required field.
#[must_use]
pub(crate) fn absent_record(schema: &Schema, engine: &MetricEngine) -> TextRecordResult {
    log::warn!("predicted record is absent; scoring worst case for all text fields");
    schema
        .required_fields
        .iter()
        .filter(|field| field.as_str() != FILE_ID_FIELD && !schema.is_boolean_field(field))
        .map(|field| (field.clone(), engine.worst_scores()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn engine() -> MetricEngine {
        MetricEngine::new(&["accuracy", "cer", "jaccard_similarity"]).unwrap()
    }

    #[test]
    fn test_scalar_field_scored() {
        let predicted = record(json!({"text": "hallo"}));
        let truth = record(json!({"text": "hello"}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert!((results["text"]["cer"] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_absent_field_skipped() {
        let predicted = record(json!({}));
        let truth = record(json!({"q1": "answer"}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_identifier_and_boolean_fields_skipped() {
        let predicted = record(json!({"file_name": "x.json", "ok": true, "q": "a"}));
        let truth = record(json!({"file_name": "y.json", "ok": false, "q": "a"}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), ["q"]);
    }

    #[test]
    fn test_numbers_compared_as_text() {
        let predicted = record(json!({"count": "12"}));
        let truth = record(json!({"count": 12}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert_eq!(results["count"]["cer"], 0.0);
        assert_eq!(results["count"]["accuracy"], 1.0);
    }

    #[test]
    fn test_list_fields_averaged() {
        let predicted = record(json!({"lines": ["hallo", "hello"]}));
        let truth = record(json!({"lines": ["hello", "hello"]}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert!((results["lines"]["cer"] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_list_length_mismatch_is_fatal() {
        let predicted = record(json!({"lines": ["a", "b", "c"]}));
        let truth = record(json!({"lines": ["a", "b"]}));
        assert!(matches!(
            validate_record(&predicted, &truth, &engine()),
            Err(Error::LengthMismatch { predicted: 3, ground_truth: 2 })
        ));
    }

    #[test]
    fn test_kind_mismatch_is_fatal() {
        let predicted = record(json!({"q": ["a"]}));
        let truth = record(json!({"q": "a"}));
        assert!(matches!(
            validate_record(&predicted, &truth, &engine()),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_null_prediction_scores_worst_case() {
        let predicted = record(json!({"q": null}));
        let truth = record(json!({"q": "answer"}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert_eq!(results["q"]["accuracy"], 0.0);
        assert_eq!(results["q"]["cer"], 1.0);
        assert_eq!(results["q"]["jaccard_similarity"], 0.0);
    }

    #[test]
    fn test_both_null_scores_as_agreement() {
        let predicted = record(json!({"q": ""}));
        let truth = record(json!({"q": null}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert_eq!(results["q"]["accuracy"], 1.0);
        assert_eq!(results["q"]["cer"], 0.0);
    }

    #[test]
    fn test_nested_object_field_skipped() {
        let predicted = record(json!({"meta": {"page": 1}}));
        let truth = record(json!({"meta": {"page": 1}}));
        let results = validate_record(&predicted, &truth, &engine()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_absent_record_fills_worst_scores() {
        let truth = json!({"file_name": "a.json", "q1": "x", "ok": true, "q2": "y"});
        let schema = Schema::infer(&truth).unwrap();
        let results = absent_record(&schema, &engine());

        assert_eq!(results.keys().collect::<Vec<_>>(), ["q1", "q2"]);
        for scores in results.values() {
            assert_eq!(scores["accuracy"], 0.0);
            assert_eq!(scores["cer"], 1.0);
            assert_eq!(scores["jaccard_similarity"], 0.0);
        }
    }
}
