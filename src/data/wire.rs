//! Serde helpers for the loosely-typed feed payloads.
//!
//! The feed sends ids as strings or numbers, counts as integers or numeric
//! strings, and occasionally a non-boolean where a flag is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::protocol::path::normalize_id;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Num(serde_json::Number),
}

impl IdRepr {
    fn into_id(self) -> String {
        match self {
            Self::Str(s) => normalize_id(&s),
            Self::Num(n) => normalize_id(&n.to_string()),
        }
    }
}

pub fn de_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(d).map(IdRepr::into_id)
}

pub fn de_opt_id<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRepr>::deserialize(d)?.map(IdRepr::into_id))
}

/// Integer or numeric string; anything else is an error.
pub fn de_count<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    int_value(&value).ok_or_else(|| serde::de::Error::custom(format!("expected a count, got {value}")))
}

pub fn de_opt_count<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => int_value(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a count, got {value}"))),
    }
}

/// Flags that fall back to `None` instead of failing the whole object.
pub fn de_lenient_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| v.as_bool()))
}

/// Text fields that sometimes arrive as numbers (market lines, prices).
pub fn de_opt_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Loose id from an already-parsed value.
pub fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_id(s)),
        Value::Number(n) => Some(normalize_id(&n.to_string())),
        _ => None,
    }
}

pub fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `tsstart` values: RFC 3339, with or without milliseconds, or with
/// a colon-less offset (`+0200`).
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "de_id")]
        id: String,
        #[serde(default, deserialize_with = "de_opt_count")]
        count: Option<i64>,
    }

    #[test]
    fn test_ids_from_strings_and_numbers() {
        let a: Probe = serde_json::from_value(json!({"id": "123.0"})).unwrap();
        let b: Probe = serde_json::from_value(json!({"id": 123.0})).unwrap();
        let c: Probe = serde_json::from_value(json!({"id": 77})).unwrap();
        assert_eq!(a.id, "123");
        assert_eq!(b.id, "123");
        assert_eq!(c.id, "77");
    }

    #[test]
    fn test_counts() {
        let p: Probe = serde_json::from_value(json!({"id": "1", "count": "12"})).unwrap();
        assert_eq!(p.count, Some(12));
        let p: Probe = serde_json::from_value(json!({"id": "1"})).unwrap();
        assert_eq!(p.count, None);
        assert!(serde_json::from_value::<Probe>(json!({"id": "1", "count": "many"})).is_err());
    }

    #[test]
    fn test_start_date_formats() {
        assert!(parse_start_date("2023-04-05T23:25:00.000+02:00").is_some());
        assert!(parse_start_date("2023-04-05T23:25:00+02:00").is_some());
        assert!(parse_start_date("2023-04-05T23:25:00.000+0200").is_some());
        assert!(parse_start_date("05/04/2023").is_none());
    }
}
