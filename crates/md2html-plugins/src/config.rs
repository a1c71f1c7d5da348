//! Helpers shared by plugin configuration and payload parsing.

use std::collections::HashSet;

use md2html_metadata::MetadataError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::PluginError;

/// Deserialize plugin configuration.
pub(crate) fn parse_data<T: DeserializeOwned>(plugin: &str, data: &Value) -> Result<T, PluginError> {
    T::deserialize(data)
        .map_err(|e| PluginError::config(plugin, format!("invalid configuration: {e}")))
}

/// Uppercase `markers`, rejecting case-insensitive duplicates.
pub(crate) fn unique_markers<'m>(
    plugin: &str,
    markers: impl IntoIterator<Item = &'m str>,
) -> Result<Vec<String>, PluginError> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for marker in markers {
        let marker = marker.to_uppercase();
        if !seen.insert(marker.clone()) {
            return Err(PluginError::config(
                plugin,
                format!("Marker duplication (case-insensitively): {marker}"),
            ));
        }
        result.push(marker);
    }
    Ok(result)
}

/// Deserialize a JSON block payload.
pub(crate) fn parse_payload<T: DeserializeOwned>(what: &str, text: &str) -> Result<T, MetadataError> {
    serde_json::from_str(text)
        .map_err(|e| MetadataError::content(format!("Incorrect JSON in {what}: {e}")))
}

/// A payload that is either a single value or a JSON array of values.
pub(crate) fn payload_values(what: &str, text: &str) -> Result<Vec<String>, MetadataError> {
    if !text.starts_with('[') {
        return Ok(vec![text.to_owned()]);
    }
    let values: Vec<Value> = parse_payload(what, text)?;
    Ok(values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}
