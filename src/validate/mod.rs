//! Per-file validation orchestration.
//!
//! One file's evaluation is a straight pipeline: derive the schema from the
//! ground truth, run fidelity and text validation per record, then zip the
//! two result streams by record index into combined [`ValidationResult`]s.
//! A scalar document is one record; a K-element ground-truth list is K
//! records, each validated against the schema of the first element.
//!
//! Only schema derivation can short-circuit the pipeline: empty ground truth
//! fails before any validator runs. Everything else either completes or
//! propagates a typed error for the whole file; there is no partial-result
//! state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{json_kind, Error, Result};
use crate::metric::{Metric, MetricEngine};
use crate::schema::Schema;

pub mod fidelity;
pub mod text;

pub use fidelity::{BooleanJudgment, FidelityResult};
pub use text::TextRecordResult;

/// Field that identifies the source file inside a record. It is carried for
/// traceability, never validated or scored.
pub const FILE_ID_FIELD: &str = "file_name";

/// Combined outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Identifier of the file this record came from.
    pub file_id: String,
    /// Structural and boolean-equality outcome.
    pub fidelity: FidelityResult,
    /// Text metric scores per comparable field.
    pub text: TextRecordResult,
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------------------------------")?;
        writeln!(f, " File: {}", self.file_id)?;
        writeln!(f, " Schema valid: {}", self.fidelity.schema_valid)?;
        if !self.fidelity.missing_fields.is_empty() {
            writeln!(f, " Missing fields: {}", self.fidelity.missing_fields.join(", "))?;
        }
        for (field, judgment) in &self.fidelity.boolean_judgments {
            writeln!(
                f,
                " Boolean '{}': predicted {}, expected {}",
                field,
                judgment
                    .predicted
                    .map_or_else(|| "none".to_string(), |b| b.to_string()),
                judgment.expected
            )?;
        }
        for (field, metrics) in &self.text {
            let scores: Vec<String> = metrics
                .iter()
                .map(|(name, value)| format!("{name}={value:.3}"))
                .collect();
            writeln!(f, " Text '{}': {}", field, scores.join(", "))?;
        }
        Ok(())
    }
}

/// Validates one file's predicted data against its ground truth.
///
/// The metric set is resolved once at construction; every file evaluated
/// through the same `Validator` is scored with the same metrics. `run` holds
/// no mutable state, so one validator may score many files, concurrently if
/// the caller wishes.
///
/// # Examples
///
/// ```
/// use fideval::Validator;
/// use serde_json::json;
///
/// let validator = Validator::new(&["cer"]).unwrap();
/// let results = validator
///     .run("page_001", &json!({"text": "hallo"}), &json!({"text": "hello"}))
///     .unwrap();
/// assert_eq!(results.len(), 1);
/// assert!((results[0].text["text"]["cer"] - 0.2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    engine: MetricEngine,
}

impl Validator {
    /// Build a validator from metric names, validating the set up front.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMetric`] if any name is unknown.
    pub fn new<S: AsRef<str>>(metric_names: &[S]) -> Result<Self> {
        Ok(Self {
            engine: MetricEngine::new(metric_names)?,
        })
    }

    /// Build a validator from already-resolved metrics.
    #[must_use]
    pub fn with_metrics(metrics: Vec<Metric>) -> Self {
        Self {
            engine: MetricEngine::with_metrics(metrics),
        }
    }

    /// The metrics this validator scores.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        self.engine.metrics()
    }

    /// Validate one file. Returns one result per ground-truth record.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyGroundTruth`] when the ground truth is null, `{}`, or
    ///   `[]`;
    /// - [`Error::EmptySample`] when schema inference finds no fields in the
    ///   (first) ground-truth record;
    /// - [`Error::TypeMismatch`] on document- or field-level kind conflicts;
    /// - [`Error::LengthMismatch`] on misaligned list-valued fields.
    pub fn run(
        &self,
        file_id: &str,
        predicted: &Value,
        ground_truth: &Value,
    ) -> Result<Vec<ValidationResult>> {
        check_ground_truth(ground_truth)?;
        let schema = Schema::infer(ground_truth)?;
        log::debug!(
            "validating '{file_id}' against {} required fields",
            schema.required_fields.len()
        );

        let mut results = Vec::new();
        match ground_truth {
            Value::Array(truth_records) => {
                let predicted_records: &[Value] = match predicted {
                    Value::Array(items) => items.as_slice(),
                    Value::Null => &[],
                    other => {
                        return Err(Error::type_mismatch("<document>", json_kind(other), "array"))
                    }
                };
                if predicted_records.len() > truth_records.len() {
                    log::debug!(
                        "prediction has {} extra records; only the first {} are compared",
                        predicted_records.len() - truth_records.len(),
                        truth_records.len()
                    );
                }
                for (index, truth_record) in truth_records.iter().enumerate() {
                    let truth_map = as_ground_truth_record(truth_record, index)?;
                    let predicted_map = match predicted_records.get(index) {
                        None | Some(Value::Null) => None,
                        Some(Value::Object(map)) => Some(map),
                        Some(other) => {
                            return Err(Error::type_mismatch(
                                format!("record {index}"),
                                json_kind(other),
                                "object",
                            ))
                        }
                    };
                    results.push(self.validate_one(file_id, predicted_map, truth_map, &schema)?);
                }
            }
            Value::Object(truth_map) => {
                let predicted_map = match predicted {
                    Value::Object(map) => Some(map),
                    Value::Null => None,
                    other => {
                        return Err(Error::type_mismatch("<document>", json_kind(other), "object"))
                    }
                };
                results.push(self.validate_one(file_id, predicted_map, truth_map, &schema)?);
            }
            // Schema inference already rejected bare scalars.
            other => {
                return Err(Error::empty_sample(format!(
                    "ground truth is a bare {}, not an object or list",
                    json_kind(other)
                )))
            }
        }
        Ok(results)
    }

    fn validate_one(
        &self,
        file_id: &str,
        predicted: Option<&Map<String, Value>>,
        ground_truth: &Map<String, Value>,
        schema: &Schema,
    ) -> Result<ValidationResult> {
        let (fidelity, text) = match predicted {
            Some(predicted) => (
                fidelity::validate_record(predicted, ground_truth, schema),
                text::validate_record(predicted, ground_truth, &self.engine)?,
            ),
            None => (
                FidelityResult::absent_record(schema),
                text::absent_record(schema, &self.engine),
            ),
        };
        Ok(ValidationResult {
            file_id: file_id.to_string(),
            fidelity,
            text,
        })
    }
}

fn check_ground_truth(ground_truth: &Value) -> Result<()> {
    let empty = match ground_truth {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(Error::empty_ground_truth(
            "nothing to validate against".to_string(),
        ));
    }
    Ok(())
}

fn as_ground_truth_record(value: &Value, index: usize) -> Result<&Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::empty_sample(format!(
            "ground-truth record {index} is a bare {}, not an object",
            json_kind(other)
        ))),
    }
}
