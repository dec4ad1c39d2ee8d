//! Typed path arguments and the coercions that produce them.

use serde::Serialize;
use uuid::Uuid;

use crate::error::DispatchError;

/// How a textual path segment is converted before it reaches a handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Pass the segment through unchanged.
    #[default]
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Hyphenated or simple UUID.
    Uuid,
}

impl Coercion {
    /// Convert one path segment. `name` is only used for the error message.
    pub fn apply(self, name: &str, raw: &str) -> Result<Arg, DispatchError> {
        let invalid = |kind: &str| {
            DispatchError::bad_request(format!("invalid {kind} for '{name}': '{raw}'"))
        };

        match self {
            Coercion::Text => Ok(Arg::Text(raw.to_string())),
            Coercion::Integer => raw
                .parse::<i64>()
                .map(Arg::Int)
                .map_err(|_| invalid("integer")),
            Coercion::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Arg::Float)
                .ok_or_else(|| invalid("number")),
            Coercion::Uuid => Uuid::parse_str(raw)
                .map(Arg::Uuid)
                .map_err(|_| invalid("uuid")),
        }
    }
}

/// A coerced positional argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Text(String),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Arg::Float(f) => Some(*f),
            Arg::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Arg::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// JSON form, for handlers that forward arguments to storage as query params.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Arg::Text(s) => serde_json::Value::from(s.as_str()),
            Arg::Int(n) => serde_json::Value::from(*n),
            Arg::Float(f) => serde_json::Value::from(*f),
            Arg::Uuid(u) => serde_json::Value::from(u.to_string()),
        }
    }
}
