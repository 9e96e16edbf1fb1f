//! Lenient field deserializers for loosely typed portal and input JSON

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, number, boolean, or null and yields it as a string
///
/// Null becomes an empty string. Identifiers such as `jobid` or `facility_id`
/// arrive as either strings or numbers depending on the producer.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
