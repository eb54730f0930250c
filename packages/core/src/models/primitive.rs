//! Primitive Kinds and Values
//!
//! Leaves of a value tree carry a [`PrimitiveValue`], a closed sum over the
//! six primitive kinds the model understands. Anything that is not one of
//! these kinds is represented structurally (enum, array or object node).
//!
//! ## JSON scalar form
//!
//! | Kind       | JSON                                   |
//! |------------|----------------------------------------|
//! | `string`   | string                                 |
//! | `integer`  | number (`i64`)                         |
//! | `decimal`  | string (exact decimal text)            |
//! | `boolean`  | boolean                                |
//! | `dateTime` | string (RFC 3339, UTC)                 |
//! | `duration` | string (seconds, exact to the nanosecond) |
//!
//! Durations written as a JSON integer are read as milliseconds.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of data stored in a leaf node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Duration,
}

impl PrimitiveKind {
    /// All kinds, in declaration order
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::String,
        PrimitiveKind::Integer,
        PrimitiveKind::Decimal,
        PrimitiveKind::Boolean,
        PrimitiveKind::DateTime,
        PrimitiveKind::Duration,
    ];
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Decimal => write!(f, "decimal"),
            Self::Boolean => write!(f, "boolean"),
            Self::DateTime => write!(f, "dateTime"),
            Self::Duration => write!(f, "duration"),
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "decimal" => Ok(Self::Decimal),
            "boolean" => Ok(Self::Boolean),
            "dateTime" => Ok(Self::DateTime),
            "duration" => Ok(Self::Duration),
            _ => Err(format!("Invalid primitive kind: {}", s)),
        }
    }
}

/// Value stored in a leaf node
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Duration(TimeDelta),
}

impl PrimitiveValue {
    /// Default value for a kind: empty string, zero, `false`, now, zero duration
    pub fn default_for(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::String => Self::String(String::new()),
            PrimitiveKind::Integer => Self::Integer(0),
            PrimitiveKind::Decimal => Self::Decimal(Decimal::ZERO),
            PrimitiveKind::Boolean => Self::Boolean(false),
            PrimitiveKind::DateTime => Self::DateTime(Utc::now()),
            PrimitiveKind::Duration => Self::Duration(TimeDelta::zero()),
        }
    }

    /// Kind of this value
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::String(_) => PrimitiveKind::String,
            Self::Integer(_) => PrimitiveKind::Integer,
            Self::Decimal(_) => PrimitiveKind::Decimal,
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::DateTime(_) => PrimitiveKind::DateTime,
            Self::Duration(_) => PrimitiveKind::Duration,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Self::Duration(value) => Some(*value),
            _ => None,
        }
    }

    /// Lossless JSON scalar form (see module docs)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(value) => serde_json::Value::String(value.clone()),
            Self::Integer(value) => serde_json::Value::from(*value),
            Self::Decimal(value) => serde_json::Value::String(value.to_string()),
            Self::Boolean(value) => serde_json::Value::Bool(*value),
            Self::DateTime(value) => serde_json::Value::String(
                value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            Self::Duration(value) => serde_json::Value::String(duration_seconds(value)),
        }
    }

    /// Lossy JSON form for display: decimals become JSON numbers
    pub fn to_plain_json(&self) -> serde_json::Value {
        match self {
            Self::Decimal(value) => value
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(value.to_string())),
            other => other.to_json(),
        }
    }

    /// Parse a JSON scalar as a value of `kind`
    ///
    /// Decimals are accepted both as strings and as JSON numbers.
    pub fn from_json(kind: PrimitiveKind, json: &serde_json::Value) -> Result<Self, String> {
        let mismatch = || format!("expected {} scalar, found {}", kind, json);

        match kind {
            PrimitiveKind::String => json
                .as_str()
                .map(|s| Self::String(s.to_string()))
                .ok_or_else(mismatch),
            PrimitiveKind::Integer => json.as_i64().map(Self::Integer).ok_or_else(mismatch),
            PrimitiveKind::Decimal => {
                let text = match json {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return Err(mismatch()),
                };
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(Self::Decimal)
                    .map_err(|e| format!("invalid decimal '{}': {}", text, e))
            }
            PrimitiveKind::Boolean => json.as_bool().map(Self::Boolean).ok_or_else(mismatch),
            PrimitiveKind::DateTime => {
                let text = json.as_str().ok_or_else(mismatch)?;
                DateTime::parse_from_rfc3339(text)
                    .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|e| format!("invalid date-time '{}': {}", text, e))
            }
            PrimitiveKind::Duration => match json {
                serde_json::Value::String(text) => parse_duration_seconds(text).map(Self::Duration),
                serde_json::Value::Number(_) => {
                    let millis = json.as_i64().ok_or_else(mismatch)?;
                    TimeDelta::try_milliseconds(millis)
                        .map(Self::Duration)
                        .ok_or_else(|| format!("duration out of range: {} ms", millis))
                }
                _ => Err(mismatch()),
            },
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Decimal(value) => write!(f, "{}", value),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Duration(value) => write!(f, "{}s", duration_seconds(value)),
        }
    }
}

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Exact decimal seconds of a duration, e.g. `"90"` or `"-0.0015"`
fn duration_seconds(value: &TimeDelta) -> String {
    let nanos = i128::from(value.num_seconds()) * i128::from(NANOS_PER_SECOND)
        + i128::from(value.subsec_nanos());
    Decimal::from_i128_with_scale(nanos, 9).normalize().to_string()
}

fn parse_duration_seconds(text: &str) -> Result<TimeDelta, String> {
    let invalid = |reason: &str| format!("invalid duration '{}': {}", text, reason);

    let seconds = Decimal::from_str(text.trim()).map_err(|e| invalid(&e.to_string()))?;
    if seconds.round_dp_with_strategy(9, RoundingStrategy::ToZero) != seconds {
        return Err(invalid("finer than a nanosecond"));
    }

    let whole = seconds.trunc();
    let fraction = (seconds - whole) * Decimal::from(NANOS_PER_SECOND);
    let (whole, fraction) = match (whole.to_i64(), fraction.to_i64()) {
        (Some(whole), Some(fraction)) => (whole, fraction),
        _ => return Err(invalid("out of range")),
    };

    // TimeDelta keeps a non-negative nanosecond part
    let (secs, nanos) = if fraction < 0 {
        (whole.checked_sub(1), fraction + NANOS_PER_SECOND)
    } else {
        (Some(whole), fraction)
    };
    secs.zip(u32::try_from(nanos).ok())
        .and_then(|(secs, nanos)| TimeDelta::new(secs, nanos))
        .ok_or_else(|| invalid("out of range"))
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Decimal> for PrimitiveValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for PrimitiveValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<TimeDelta> for PrimitiveValue {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}
