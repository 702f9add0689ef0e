//! Lenient deserializers for values that arrive either as JSON scalars or as
//! form-encoded text.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crowd_core::audit::fields::parse_flag;

/// Deserialize an optional boolean from `true`, `"True"`, `"on"`, `1`, ...
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64() != Some(0.0))),
        Some(Value::String(s)) => parse_flag(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid boolean '{s}'"))),
        Some(other) => Err(de::Error::custom(format!("invalid boolean {other}"))),
    }
}

/// Deserialize an optional integer from a JSON number or decimal text. Empty
/// text is treated as absent.
pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid integer {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer '{s}'"))),
        Some(other) => Err(de::Error::custom(format!("invalid integer {other}"))),
    }
}
