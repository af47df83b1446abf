//! # fideval
//!
//! Evaluation harness for structured OCR output.
//!
//! Given a vision-language model's predicted JSON and the ground-truth JSON
//! for the same source image, fideval measures how faithfully the prediction
//! reproduces the truth:
//!
//! - **Schema fidelity**: required fields are inferred from the ground truth
//!   itself; missing predicted fields are reported per record.
//! - **Boolean judgment**: boolean fields are compared by equality and
//!   accumulated into TP/FN/FP counts with per-field F1.
//! - **Text similarity**: string fields are canonicalized and scored with
//!   `accuracy`, `cer`, `wer`, `cosine_similarity`, and
//!   `jaccard_similarity`.
//! - **Aggregation**: per-record results reduce to per-test-set summaries,
//!   and those reduce again to one overall report.
//!
//! It is the measurement half of an OCR pipeline: no OCR, no image handling,
//! no model calls, no file I/O. The caller hands over parsed JSON values and
//! receives JSON-serializable results.
//!
//! ## Quick Start
//!
//! ```rust
//! use fideval::{aggregate_file_results, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::new(&["cer", "accuracy"])?;
//! let results = validator.run(
//!     "page_001",
//!     &json!({"question": "What is 2+2?", "answer": "4", "multiple_choice": false}),
//!     &json!({"question": "What is 2+2?", "answer": "4", "multiple_choice": true}),
//! )?;
//!
//! let report = aggregate_file_results(&results);
//! assert_eq!(report.fidelity_validation_results.schema_validity_percentage, 100.0);
//! # Ok::<(), fideval::Error>(())
//! ```
//!
//! ## Evaluating a whole run
//!
//! [`EvalSession`] buckets per-file results under test-set identifiers and
//! produces the two-level aggregate on demand:
//!
//! ```rust
//! use fideval::EvalSession;
//! use serde_json::json;
//!
//! let mut session = EvalSession::new(&["cer"])?;
//! session.evaluate_file("math", "p1", &json!({"q": "hallo"}), &json!({"q": "hello"}))?;
//! session.evaluate_file("science", "p2", &json!({"q": "cell"}), &json!({"q": "cell"}))?;
//! let overall = session.aggregate_all();
//! assert_eq!(overall.sample_size, 2);
//! # Ok::<(), fideval::Error>(())
//! ```
//!
//! ## Score orientation
//!
//! All metrics live in [0, 1], but their directions differ by design: `cer`
//! and `wer` are error rates where 1.0 is worst, while `accuracy`,
//! `cosine_similarity`, and `jaccard_similarity` are similarities where 1.0
//! is best. Aggregated values keep the same orientation.
//!
//! ## Design Notes
//!
//! - Every validator is a concrete type; there is no runtime dispatch
//!   hierarchy to implement or extend.
//! - The metric registry is the closed [`Metric`] enum, so an unknown metric
//!   name fails when the set is built, never mid-evaluation.
//! - Aggregation is a pure fold: inputs are never mutated, every call builds
//!   a fresh result.

#![warn(missing_docs)]

pub mod aggregate;
mod error;
pub mod harness;
pub mod metric;
pub mod normalize;
pub mod schema;
pub mod validate;

pub use aggregate::{
    aggregate_file_results, aggregate_testset_results, AggregateResult, ConfusionCounts,
    FidelityAggregate,
};
pub use error::{Error, Result};
pub use harness::EvalSession;
pub use metric::{Metric, MetricEngine, TextFieldResult};
pub use normalize::{canonicalize, Normalized};
pub use schema::{FieldType, Schema};
pub use validate::{
    BooleanJudgment, FidelityResult, TextRecordResult, ValidationResult, Validator, FILE_ID_FIELD,
};
