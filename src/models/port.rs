//! Port values in binding credentials arrive either as a JSON string
//! (`"3306"`) or a JSON number (`3306`) depending on the service broker.

use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

use crate::errors::CfMysqlError;

/// Raw port as it appeared on the wire.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePort {
    Text(String),
    Number(i64),
}

/// Resolves a raw port payload to its decimal string form.
///
/// A missing field resolves to `""`; anything that is neither a string nor an
/// integer (`null`, booleans, objects, arrays, fractions) is an error that
/// carries the raw payload.
pub fn resolve_port(raw: Option<&RawValue>) -> Result<String, CfMysqlError> {
    let raw = match raw {
        Some(raw) if !raw.get().trim().is_empty() => raw.get(),
        _ => return Ok(String::new()),
    };

    match serde_json::from_str::<WirePort>(raw) {
        Ok(WirePort::Text(port)) => Ok(port),
        Ok(WirePort::Number(port)) => Ok(port.to_string()),
        Err(_) => Err(CfMysqlError::InvalidPort {
            raw: raw.to_string(),
        }),
    }
}

/// Keeps an explicit `null` distinguishable from an absent field: absent
/// stays `None` through `#[serde(default)]`, `null` becomes `Some("null")`.
pub(crate) fn deserialize_raw<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}
