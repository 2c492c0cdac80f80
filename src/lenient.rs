//! Field deserializers for request bodies that never fail.
//!
//! A value of the wrong JSON type is read as "not supplied" so the
//! validators, not the JSON extractor, decide what to report.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

/// An owner id as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmittedId {
    Id(Uuid),
    /// Present and truthy, but not a UUID string.
    Malformed,
}

impl SubmittedId {
    pub fn id(self) -> Option<Uuid> {
        match self {
            SubmittedId::Id(id) => Some(id),
            SubmittedId::Malformed => None,
        }
    }
}

/// Strings pass through; anything else is treated as absent.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Tells an explicit `null` (`Some(None)`) from a missing field (`None`,
/// via `#[serde(default)]`). Other non-string values count as missing.
pub fn nullable_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s)),
        _ => None,
    })
}

/// `null`, `""` and `false` mean no id was sent; any other value that is
/// not a UUID string is `Malformed`.
pub fn submitted_id<'de, D>(deserializer: D) -> Result<Option<SubmittedId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(
            s.parse::<Uuid>()
                .map(SubmittedId::Id)
                .unwrap_or(SubmittedId::Malformed),
        ),
        _ => Some(SubmittedId::Malformed),
    })
}
