//! JSON value kinds and their wire scalar types.
use serde_json::Value;

use crate::error::{ConvertError, Result};
use crate::ir::ScalarType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JsonKind {
    Null,
    Bool,
    Integer,
    /// Non-negative integer above `i64::MAX`.
    UnsignedInteger,
    Double,
    String,
    Array,
    Object,
}

pub fn kind_of(v: &Value) -> JsonKind {
    match v {
        Value::Null => JsonKind::Null,
        Value::Bool(_) => JsonKind::Bool,
        Value::Number(n) if n.is_i64() => JsonKind::Integer,
        Value::Number(n) if n.is_u64() => JsonKind::UnsignedInteger,
        Value::Number(_) => JsonKind::Double,
        Value::String(_) => JsonKind::String,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
    }
}

impl JsonKind {
    pub fn is_container(self) -> bool {
        matches!(self, JsonKind::Array | JsonKind::Object)
    }

    pub fn label(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Integer => "integer",
            JsonKind::UnsignedInteger => "unsigned integer",
            JsonKind::Double => "double",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

/// Wire scalar type for a JSON scalar. Containers are handled by the walks;
/// null has no mapping.
pub fn scalar_type(kind: JsonKind, path: &str) -> Result<ScalarType> {
    match kind {
        JsonKind::Bool => Ok(ScalarType::Bool),
        JsonKind::Integer => Ok(ScalarType::Int64),
        JsonKind::UnsignedInteger => Ok(ScalarType::Uint64),
        JsonKind::Double => Ok(ScalarType::Double),
        JsonKind::String => Ok(ScalarType::String),
        JsonKind::Null | JsonKind::Array | JsonKind::Object => Err(ConvertError::UnsupportedType {
            path: path.to_string(),
            kind: kind.label(),
        }),
    }
}
