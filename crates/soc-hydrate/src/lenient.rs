//! Field decoders that treat a wrongly-typed value as absent
//!
//! Persisted payloads come from several app generations. A field holding an
//! unexpected JSON type must not fail the surrounding record; it is dropped
//! and later backfilled from defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode `T`, yielding `None` on any type mismatch
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode free text, accepting numbers as their decimal rendering
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Keep only string values of a JSON object
pub(crate) fn string_entries(
    map: Option<serde_json::Map<String, Value>>,
) -> impl Iterator<Item = (String, String)> {
    map.into_iter().flatten().filter_map(|(key, value)| match value {
        Value::String(text) => Some((key, text)),
        _ => None,
    })
}

/// Decode each element independently, skipping the ones that do not fit
pub(crate) fn each<T: DeserializeOwned>(values: Option<Vec<Value>>) -> Vec<T> {
    values
        .into_iter()
        .flatten()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

/// Treat blank strings as absent
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Probe {
        #[serde(deserialize_with = "lenient")]
        flag: Option<bool>,
        #[serde(deserialize_with = "lenient_text")]
        text: Option<String>,
    }

    #[test]
    fn mismatched_types_become_none() {
        let probe: Probe = serde_json::from_value(json!({"flag": "yes", "text": [1]})).unwrap();
        assert_eq!(probe.flag, None);
        assert_eq!(probe.text, None);
    }

    #[test]
    fn numbers_are_accepted_as_text() {
        let probe: Probe = serde_json::from_value(json!({"text": 25000})).unwrap();
        assert_eq!(probe.text.as_deref(), Some("25000"));
    }

    #[test]
    fn missing_fields_default() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert_eq!(probe.flag, None);
    }

    #[test]
    fn string_entries_drop_non_strings() {
        let map = json!({"a": "x", "b": 3, "c": null}).as_object().cloned();
        let entries: Vec<_> = string_entries(map).collect();
        assert_eq!(entries, vec![("a".to_string(), "x".to_string())]);
    }

    #[test]
    fn each_skips_bad_elements() {
        let decoded: Vec<Probe> = each(Some(vec![json!({"flag": true}), json!(7)]));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].flag, Some(true));
    }
}
