//! Declarative parameter schemas and the checks behind the validator
//! middleware.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Structural type a field must conform to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

/// Declarative spec for one body field.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: ParamType,

    /// Absence of the field is only an error when this is set.
    #[serde(default)]
    pub required: bool,

    /// Normalize string values to lowercase.
    #[serde(default)]
    pub lowercase: bool,

    /// Normalize string values to uppercase.
    #[serde(default)]
    pub uppercase: bool,
}

/// Field name → spec. Ordered so "first failure" is deterministic.
pub type ParamSchema = BTreeMap<String, FieldSpec>;

/// Structured validation failure, serialized as `{"error": code, "msg": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be an object")]
    NotAnObject,

    #[error("{0} is required")]
    MissingField(String),

    #[error("{field} is not with the correct type {}", expected.name())]
    WrongType { field: String, expected: ParamType },
}

impl ValidationError {
    pub fn code(&self) -> u8 {
        match self {
            ValidationError::NotAnObject => 2,
            ValidationError::MissingField(_) => 3,
            ValidationError::WrongType { .. } => 4,
        }
    }

    /// Wire form of the error, matching what the validator middleware
    /// sends to the caller.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "error": self.code(),
            "msg": self.to_string(),
        })
    }
}

/// Check structural conformity of `body` against `schema`: the body must
/// be an object, and every required field must be present. Reports the
/// first failure found.
pub fn test_params(schema: &ParamSchema, body: &Value) -> Result<(), ValidationError> {
    let Some(object) = body.as_object() else {
        return Err(ValidationError::NotAnObject);
    };

    for (field, spec) in schema {
        if spec.required && !object.contains_key(field) {
            return Err(ValidationError::MissingField(field.clone()));
        }
    }

    Ok(())
}

/// Structural type check of one value against its spec.
pub fn is_valid_type(value: &Value, spec: &FieldSpec) -> bool {
    match spec.kind {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Object => value.is_object(),
        ParamType::Array => value.is_array(),
    }
}

/// Return `value` lowercased when the spec requests it; non-strings and
/// unmarked fields pass through unchanged.
pub fn to_lowercase_if_set(value: &Value, spec: &FieldSpec) -> Value {
    match (spec.lowercase, value.as_str()) {
        (true, Some(s)) => Value::String(s.to_lowercase()),
        _ => value.clone(),
    }
}

/// Return `value` uppercased when the spec requests it; non-strings and
/// unmarked fields pass through unchanged.
pub fn to_uppercase_if_set(value: &Value, spec: &FieldSpec) -> Value {
    match (spec.uppercase, value.as_str()) {
        (true, Some(s)) => Value::String(s.to_uppercase()),
        _ => value.clone(),
    }
}
