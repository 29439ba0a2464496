//! Fail-soft collection decoding.
//!
//! One bad element must not take down a whole batch: each element decodes
//! on its own, failures are logged and counted, survivors keep their order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::errors::DecodeError;

#[derive(Debug, Clone, PartialEq)]
pub struct FailSoft<T> {
    pub items: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for FailSoft<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dropped: 0,
        }
    }
}

pub fn collect_fail_soft<T, F>(values: &[Value], what: &'static str, mut decode: F) -> FailSoft<T>
where
    F: FnMut(&Value) -> Result<T, DecodeError>,
{
    let mut out = FailSoft {
        items: Vec::with_capacity(values.len()),
        dropped: 0,
    };
    for (index, value) in values.iter().enumerate() {
        match decode(value) {
            Ok(item) => out.items.push(item),
            Err(e) => {
                out.dropped += 1;
                warn!(what, index, error = %e, "Dropping undecodable element");
            }
        }
    }
    out
}

/// Fail-soft decode of a JSON array of `T`.
pub fn decode_array<T: DeserializeOwned>(values: &[Value], what: &'static str) -> FailSoft<T> {
    collect_fail_soft(values, what, |v| T::deserialize(v).map_err(DecodeError::from))
}

/// `deserialize_with` adapter for fail-soft arrays nested in a model.
pub fn de_fail_soft<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<Value>::deserialize(d)?;
    Ok(decode_array(&values, "element").items)
}
