//! Custom-field definitions.
//!
//! Definitions are supplied as a JSON array. Property names are matched
//! case-insensitively so schema files written by hand (`DisplayName`,
//! `displayname`, `displayName`) all load.

use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ErrorCode;

/// One configured custom field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldDefinition {
    /// Tracker field id, e.g. `customfield_10002`.
    pub identifier: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Why a custom-field schema could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read custom field schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("custom field schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("custom field schema must be a JSON array of objects")]
    NotAnArray,

    #[error("custom field #{index} has no identifier")]
    MissingIdentifier { index: usize },
}

impl SchemaError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::CustomFieldSchemaInvalid
    }
}

/// Lowercased-key view of one schema entry.
#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default, alias = "id", alias = "customfieldid")]
    identifier: String,
    #[serde(default, alias = "name")]
    displayname: String,
    #[serde(default, rename = "type")]
    field_type: String,
}

fn lowercase_keys(map: Map<String, JsonValue>) -> Map<String, JsonValue> {
    map.into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect()
}

/// Parse definitions from a JSON string.
///
/// # Errors
///
/// Returns [`SchemaError`] for invalid JSON, a non-array document, or an
/// entry without an identifier.
pub fn parse_custom_fields(json: &str) -> Result<Vec<CustomFieldDefinition>, SchemaError> {
    let document: JsonValue = serde_json::from_str(json)?;
    from_value(document)
}

/// Parse definitions from a reader.
///
/// # Errors
///
/// Same as [`parse_custom_fields`], plus I/O failures.
pub fn read_custom_fields(mut reader: impl Read) -> Result<Vec<CustomFieldDefinition>, SchemaError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_custom_fields(&buf)
}

fn from_value(document: JsonValue) -> Result<Vec<CustomFieldDefinition>, SchemaError> {
    let JsonValue::Array(entries) = document else {
        return Err(SchemaError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let JsonValue::Object(map) = entry else {
                return Err(SchemaError::NotAnArray);
            };
            let raw: RawDefinition =
                serde_json::from_value(JsonValue::Object(lowercase_keys(map)))?;
            if raw.identifier.trim().is_empty() {
                return Err(SchemaError::MissingIdentifier { index });
            }
            Ok(CustomFieldDefinition {
                identifier: raw.identifier,
                display_name: raw.displayname,
                field_type: raw.field_type,
            })
        })
        .collect()
}
