//! Literal type inference for comparison values.

use crate::model::AttributeKeyDataType;

/// Primitive kind of a comparison literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int64,
    Float64,
    String,
}

impl ValueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }

    pub const fn data_type(&self) -> AttributeKeyDataType {
        match self {
            Self::Bool => AttributeKeyDataType::Bool,
            Self::Int64 => AttributeKeyDataType::Int64,
            Self::Float64 => AttributeKeyDataType::Float64,
            Self::String => AttributeKeyDataType::String,
        }
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

/// A literal after type sniffing.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl ScalarValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float64(_) => ValueKind::Float64,
            Self::String(_) => ValueKind::String,
        }
    }
}

impl From<ScalarValue> for serde_json::Value {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(b) => Self::Bool(b),
            ScalarValue::Int64(i) => Self::from(i),
            // NaN and infinities have no JSON number form
            ScalarValue::Float64(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            ScalarValue::String(s) => Self::String(s),
        }
    }
}

/// Infer the most specific type of a string literal.
///
/// Tries bool (`true`/`false`), then i64, then f64, and falls back to the
/// string itself. The operator does not influence the result.
pub fn parse_str_value(value: &str, _operator: &str) -> ScalarValue {
    if let Ok(b) = value.parse::<bool>() {
        ScalarValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        ScalarValue::Int64(i)
    } else if let Ok(f) = value.parse::<f64>() {
        ScalarValue::Float64(f)
    } else {
        ScalarValue::String(value.to_owned())
    }
}
