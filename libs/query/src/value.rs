//! Declared attribute types and the typed scalars request values are coerced into

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Declared scalar type of an attribute.
///
/// Anything that is not one of the recognised types is treated as text, so
/// unknown storage types still accept filters as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScalarType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Uuid,
    Text,
}

impl ScalarType {
    /// Map a declared type name onto a scalar type. Never fails: unrecognised
    /// names fall back to `Text`.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Boolean,
            "i16" | "short" | "smallint" | "int2" | "smallserial" | "serial2" => Self::SmallInt,
            "i32" | "int" | "integer" | "int4" | "serial" | "serial4" => Self::Integer,
            "i64" | "long" | "bigint" | "int8" | "bigserial" | "serial8" => Self::BigInt,
            "uuid" => Self::Uuid,
            _ => Self::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Uuid => "uuid",
            Self::Text => "text",
        }
    }

    /// Coerce a raw request token into a value of this type.
    pub fn coerce(self, attribute: &str, raw: &str) -> Result<Value> {
        let parse_err = |reason: String| Error::Parse {
            attribute: attribute.to_string(),
            value: raw.to_string(),
            reason,
        };

        match self {
            Self::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(parse_err("expected true or false".to_string()))
                }
            }
            Self::SmallInt => raw
                .parse::<i16>()
                .map(Value::SmallInt)
                .map_err(|e| parse_err(e.to_string())),
            Self::Integer => raw
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| parse_err(e.to_string())),
            Self::BigInt => raw
                .parse::<i64>()
                .map(Value::BigInt)
                .map_err(|e| parse_err(e.to_string())),
            Self::Uuid => Uuid::parse_str(raw)
                .map(Value::Uuid)
                .map_err(|e| parse_err(e.to_string())),
            Self::Text => Ok(Value::Text(raw.to_string())),
        }
    }
}

impl From<String> for ScalarType {
    fn from(name: String) -> Self {
        Self::from_type_name(&name)
    }
}

impl From<ScalarType> for String {
    fn from(ty: ScalarType) -> Self {
        ty.as_str().to_string()
    }
}

/// A typed scalar produced by coercing a request token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Uuid(Uuid),
    Text(String),
}

impl Value {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Value::Bool(_) => ScalarType::Boolean,
            Value::SmallInt(_) => ScalarType::SmallInt,
            Value::Int(_) => ScalarType::Integer,
            Value::BigInt(_) => ScalarType::BigInt,
            Value::Uuid(_) => ScalarType::Uuid,
            Value::Text(_) => ScalarType::Text,
        }
    }

    /// True when `json` holds the same scalar, comparing numbers by value and
    /// UUIDs case-insensitively. Text matches the text form of a number or
    /// boolean, the way a column compares once cast with `::text`.
    pub fn matches_json(&self, json: &JsonValue) -> bool {
        match (self, json) {
            (Value::Bool(b), JsonValue::Bool(j)) => b == j,
            (Value::SmallInt(n), JsonValue::Number(j)) => j.as_i64() == Some(i64::from(*n)),
            (Value::Int(n), JsonValue::Number(j)) => j.as_i64() == Some(i64::from(*n)),
            (Value::BigInt(n), JsonValue::Number(j)) => j.as_i64() == Some(*n),
            (Value::Uuid(u), JsonValue::String(j)) => {
                Uuid::parse_str(j).map(|parsed| parsed == *u).unwrap_or(false)
            }
            (Value::Text(s), JsonValue::String(j)) => s == j,
            (Value::Text(s), JsonValue::Number(_) | JsonValue::Bool(_)) => *s == json.to_string(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::SmallInt(n) => write!(f, "{n}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}
