//! Structural schema inference from a ground-truth sample.
//!
//! Predicted output is validated against the *shape* of the ground truth, not
//! a hand-written schema. One sample record is enough: its field names become
//! the required set, its value kinds become the expected types, and its
//! boolean-typed fields are routed to equality judgment instead of text
//! metrics.
//!
//! Type mapping: object → [`FieldType::Object`], array → [`FieldType::Array`]
//! of its first element's type (`String` when empty), boolean →
//! [`FieldType::Boolean`], integer-valued number → [`FieldType::Integer`],
//! fractional number → [`FieldType::Number`], string → [`FieldType::String`].
//! Nulls default to `String`, a documented simplification; whether null
//! object/array fields should infer differently remains open.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Inferred type of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text (also the fallback for nulls).
    String,
    /// Whole number.
    Integer,
    /// Fractional number.
    Number,
    /// Boolean, judged by equality rather than text similarity.
    Boolean,
    /// Homogeneous list, typed after its first element.
    Array(Box<FieldType>),
    /// Nested record with its own schema.
    Object(Box<Schema>),
}

impl FieldType {
    fn infer(value: &Value) -> Result<FieldType> {
        match value {
            Value::Object(_) => Ok(FieldType::Object(Box::new(Schema::infer(value)?))),
            Value::Array(items) => {
                let element = match items.first() {
                    Some(first) => FieldType::infer(first)?,
                    None => FieldType::String,
                };
                Ok(FieldType::Array(Box::new(element)))
            }
            Value::Bool(_) => Ok(FieldType::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(FieldType::Integer),
            Value::Number(_) => Ok(FieldType::Number),
            Value::String(_) | Value::Null => Ok(FieldType::String),
        }
    }

    /// Canonical type name, as it appears in serialized schemas.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array(_) => "array",
            FieldType::Object(_) => "object",
        }
    }
}

/// Minimal structural schema derived from one ground-truth record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Field names in document order; all sample fields are required.
    pub required_fields: Vec<String>,
    /// Inferred type per field.
    pub field_types: BTreeMap<String, FieldType>,
    /// Top-level boolean-typed fields, in document order.
    /// Always a subset of `required_fields`.
    pub boolean_fields: Vec<String>,
}

impl Schema {
    /// Infer a schema from a ground-truth sample.
    ///
    /// A list sample is represented by its first element; every element of a
    /// well-formed ground-truth list shares one shape.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySample`] when the sample (or its first element) carries
    /// no fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use fideval::{FieldType, Schema};
    /// use serde_json::json;
    ///
    /// let schema = Schema::infer(&json!({"a": "x", "b": 3, "c": true})).unwrap();
    /// assert_eq!(schema.required_fields, ["a", "b", "c"]);
    /// assert_eq!(schema.field_types["b"], FieldType::Integer);
    /// assert_eq!(schema.boolean_fields, ["c"]);
    /// ```
    pub fn infer(sample: &Value) -> Result<Schema> {
        let record = match sample {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| Error::empty_sample("sample list has no elements"))?,
            other => other,
        };
        let fields = match record {
            Value::Object(map) if !map.is_empty() => map,
            Value::Object(_) => return Err(Error::empty_sample("sample record has no fields")),
            Value::Null => return Err(Error::empty_sample("sample record is null")),
            other => {
                return Err(Error::empty_sample(format!(
                    "sample record is a bare {}, not an object",
                    crate::error::json_kind(other)
                )))
            }
        };

        let mut required_fields = Vec::with_capacity(fields.len());
        let mut field_types = BTreeMap::new();
        let mut boolean_fields = Vec::new();
        for (name, value) in fields {
            let field_type = FieldType::infer(value)?;
            if field_type == FieldType::Boolean {
                boolean_fields.push(name.clone());
            }
            required_fields.push(name.clone());
            field_types.insert(name.clone(), field_type);
        }

        Ok(Schema {
            required_fields,
            field_types,
            boolean_fields,
        })
    }

    /// Whether a top-level field is boolean-typed.
    #[must_use]
    pub fn is_boolean_field(&self, name: &str) -> bool {
        self.boolean_fields.iter().any(|f| f == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_primitive_types() {
        let schema = Schema::infer(&json!({
            "a": "x",
            "b": 3,
            "c": true,
            "d": [1, 2],
            "e": null,
        }))
        .unwrap();

        assert_eq!(schema.required_fields, ["a", "b", "c", "d", "e"]);
        assert_eq!(schema.field_types["a"], FieldType::String);
        assert_eq!(schema.field_types["b"], FieldType::Integer);
        assert_eq!(schema.field_types["c"], FieldType::Boolean);
        assert_eq!(
            schema.field_types["d"],
            FieldType::Array(Box::new(FieldType::Integer))
        );
        assert_eq!(schema.field_types["e"], FieldType::String);
        assert_eq!(schema.boolean_fields, ["c"]);
    }

    #[test]
    fn test_infer_fractional_number() {
        let schema = Schema::infer(&json!({"score": 0.5})).unwrap();
        assert_eq!(schema.field_types["score"], FieldType::Number);
    }

    #[test]
    fn test_infer_from_list_uses_first_element() {
        let schema = Schema::infer(&json!([
            {"q": "one", "ok": true},
            {"q": 2, "ok": "not a bool"},
        ]))
        .unwrap();
        assert_eq!(schema.field_types["q"], FieldType::String);
        assert_eq!(schema.boolean_fields, ["ok"]);
    }

    #[test]
    fn test_infer_nested_object() {
        let schema = Schema::infer(&json!({
            "meta": {"page": 1, "scanned": true},
        }))
        .unwrap();
        match &schema.field_types["meta"] {
            FieldType::Object(nested) => {
                assert_eq!(nested.field_types["page"], FieldType::Integer);
                // Nested booleans belong to the nested schema, not the top level.
                assert_eq!(nested.boolean_fields, ["scanned"]);
            }
            other => panic!("expected object type, got {other:?}"),
        }
        assert!(schema.boolean_fields.is_empty());
    }

    #[test]
    fn test_infer_empty_array_defaults_to_string() {
        let schema = Schema::infer(&json!({"tags": []})).unwrap();
        assert_eq!(
            schema.field_types["tags"],
            FieldType::Array(Box::new(FieldType::String))
        );
    }

    #[test]
    fn test_empty_samples_rejected() {
        assert!(matches!(
            Schema::infer(&json!({})),
            Err(Error::EmptySample(_))
        ));
        assert!(matches!(
            Schema::infer(&json!([])),
            Err(Error::EmptySample(_))
        ));
        assert!(matches!(
            Schema::infer(&json!([{}])),
            Err(Error::EmptySample(_))
        ));
        assert!(matches!(
            Schema::infer(&json!(null)),
            Err(Error::EmptySample(_))
        ));
    }

    #[test]
    fn test_boolean_fields_subset_of_required() {
        let schema = Schema::infer(&json!({"a": true, "b": "x", "c": false})).unwrap();
        for field in &schema.boolean_fields {
            assert!(schema.required_fields.contains(field));
        }
    }
}
