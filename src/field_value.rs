use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

use crate::field_types::FieldType;

/// A coerced field value as stored on a [`Metric`](crate::Metric).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn kind(&self) -> FieldType {
        match self {
            FieldValue::Str(_) => FieldType::String,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// Why a resolved value could not become a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    /// The value was `null`; treated as absence.
    Null,
    Unsupported { target: Target, found: String },
}

/// Coercion target: a declared type or the decoded native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Native,
    Declared(FieldType),
}

impl From<Option<FieldType>> for Target {
    fn from(ty: Option<FieldType>) -> Self {
        ty.map_or(Target::Native, Target::Declared)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Native => f.write_str("native"),
            Target::Declared(ty) => write!(f, "{ty}"),
        }
    }
}

/// Decoded scalar, split out of the JSON tree before dispatch.
enum Scalar<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
}

fn scalar_of(value: &Value) -> Result<Scalar<'_>, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Null),
        Value::Bool(b) => Ok(Scalar::Bool(*b)),
        Value::Number(n) => Ok(number_scalar(n)),
        Value::String(s) => Ok(Scalar::Str(s)),
        Value::Array(_) | Value::Object(_) => Err(CoerceError::Unsupported {
            target: Target::Native,
            found: describe(value),
        }),
    }
}

// Integral literals within i64 stay integers; everything else widens.
fn number_scalar(n: &Number) -> Scalar<'static> {
    match n.as_i64() {
        Some(i) => Scalar::Int(i),
        None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Converts a resolved JSON value into a field value.
///
/// | target | bool           | number                 | string                       |
/// |--------|----------------|------------------------|------------------------------|
/// | string | "true"/"false" | shortest decimal text  | unchanged                    |
/// | int    | 1 / 0          | truncate toward zero   | integer literal              |
/// | float  | 1.0 / 0.0      | widen                  | float literal                |
/// | bool   | unchanged      | nonzero                | "true" "false" "1" "0"       |
/// | native | bool           | int if integral, float | string                       |
pub fn coerce(value: &Value, target: Target) -> Result<FieldValue, CoerceError> {
    let scalar = match scalar_of(value) {
        Err(CoerceError::Unsupported { found, .. }) => {
            return Err(CoerceError::Unsupported { target, found });
        }
        other => other?,
    };

    let coerced = match target {
        Target::Native => Some(match scalar {
            Scalar::Bool(b) => FieldValue::Bool(b),
            Scalar::Int(i) => FieldValue::Int(i),
            Scalar::Float(f) => FieldValue::Float(f),
            Scalar::Str(s) => FieldValue::Str(s.to_string()),
        }),
        Target::Declared(ty) => convert(ty, scalar),
    };

    coerced.ok_or_else(|| CoerceError::Unsupported {
        target,
        found: describe(value),
    })
}

fn convert(ty: FieldType, scalar: Scalar<'_>) -> Option<FieldValue> {
    match (ty, scalar) {
        (FieldType::String, Scalar::Bool(b)) => Some(FieldValue::Str(b.to_string())),
        (FieldType::String, Scalar::Int(i)) => Some(FieldValue::Str(i.to_string())),
        (FieldType::String, Scalar::Float(f)) => Some(FieldValue::Str(format_float(f))),
        (FieldType::String, Scalar::Str(s)) => Some(FieldValue::Str(s.to_string())),

        (FieldType::Int, Scalar::Bool(b)) => Some(FieldValue::Int(i64::from(b))),
        (FieldType::Int, Scalar::Int(i)) => Some(FieldValue::Int(i)),
        (FieldType::Int, Scalar::Float(f)) => truncate(f).map(FieldValue::Int),
        (FieldType::Int, Scalar::Str(s)) => s.parse::<i64>().ok().map(FieldValue::Int),

        (FieldType::Float, Scalar::Bool(b)) => Some(FieldValue::Float(if b { 1.0 } else { 0.0 })),
        (FieldType::Float, Scalar::Int(i)) => Some(FieldValue::Float(i as f64)),
        (FieldType::Float, Scalar::Float(f)) => Some(FieldValue::Float(f)),
        (FieldType::Float, Scalar::Str(s)) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float),

        (FieldType::Bool, Scalar::Bool(b)) => Some(FieldValue::Bool(b)),
        (FieldType::Bool, Scalar::Int(i)) => Some(FieldValue::Bool(i != 0)),
        (FieldType::Bool, Scalar::Float(f)) => Some(FieldValue::Bool(f != 0.0)),
        (FieldType::Bool, Scalar::Str(s)) => parse_bool_text(s).map(FieldValue::Bool),
    }
}

/// Shortest round-trip text for a float. Plain decimal for ordinary
/// magnitudes, exponent form below 1e-7 or from 1e21 up.
pub(crate) fn format_float(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && (magnitude < 1e-7 || magnitude >= 1e21) {
        format!("{f:e}")
    } else {
        f.to_string()
    }
}

fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(t as i64)
    } else {
        None
    }
}

fn parse_bool_text(s: &str) -> Option<bool> {
    match s {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
