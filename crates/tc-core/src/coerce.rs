//! Lenient decoding for loosely-typed backend fields.
//!
//! The backend serializes SQLite rows, so numbers sometimes arrive as strings
//! and optional columns arrive as `null`. These helpers are used with
//! `#[serde(default, deserialize_with = "...")]` so that a single bad field
//! degrades to zero instead of failing the whole payload.

use crate::models::Decision;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interprets a JSON value as a finite number.
///
/// Numbers and numeric strings are accepted; everything else yields `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Converts a float into a non-negative counter.
pub fn to_count(n: f64) -> u64 {
    if n.is_finite() && n > 0.0 {
        n.trunc() as u64
    } else {
        0
    }
}

/// Counter field: non-numeric or negative input decodes to 0.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value).map(to_count).unwrap_or(0))
}

/// Optional counter: `null` stays absent, non-numeric input decodes to 0.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(as_number(&other).map(to_count).unwrap_or(0)),
    })
}

/// Floating point field: non-numeric input decodes to 0.0.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value).unwrap_or(0.0))
}

/// Severity score clamped to 0-100.
pub fn severity<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value)
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0))
}

/// Text field: numbers are stringified, `null` becomes empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Decision field: `null`, non-strings and unknown labels decode to
/// [`Decision::Unknown`].
pub fn decision<'de, D>(deserializer: D) -> Result<Decision, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.parse().unwrap_or(Decision::Unknown),
        _ => Decision::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "count")]
        n: u64,
        #[serde(default, deserialize_with = "optional_count")]
        maybe: Option<u64>,
        #[serde(default, deserialize_with = "severity")]
        sev: u8,
        #[serde(default, deserialize_with = "text")]
        label: String,
    }

    fn decode(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_count_accepts_numeric_strings() {
        assert_eq!(decode(json!({"n": "42"})).n, 42);
        assert_eq!(decode(json!({"n": 7.9})).n, 7);
    }

    #[test]
    fn test_count_defaults_to_zero() {
        assert_eq!(decode(json!({})).n, 0);
        assert_eq!(decode(json!({"n": "many"})).n, 0);
        assert_eq!(decode(json!({"n": -3})).n, 0);
        assert_eq!(decode(json!({"n": null})).n, 0);
    }

    #[test]
    fn test_optional_count_keeps_absence() {
        assert_eq!(decode(json!({})).maybe, None);
        assert_eq!(decode(json!({"maybe": null})).maybe, None);
        assert_eq!(decode(json!({"maybe": "x"})).maybe, Some(0));
        assert_eq!(decode(json!({"maybe": 12})).maybe, Some(12));
    }

    #[test]
    fn test_severity_is_clamped() {
        assert_eq!(decode(json!({"sev": 250})).sev, 100);
        assert_eq!(decode(json!({"sev": -5})).sev, 0);
        assert_eq!(decode(json!({"sev": "73"})).sev, 73);
    }

    #[test]
    fn test_text_stringifies_numbers() {
        assert_eq!(decode(json!({"label": 12})).label, "12");
        assert_eq!(decode(json!({"label": null})).label, "");
    }

    #[test]
    fn test_non_finite_is_rejected() {
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!("inf")), None);
    }
}
