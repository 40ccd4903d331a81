use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::dates::parse_timestamp;
use crate::error::ErrorCode;
use crate::model::custom_field::{CustomFieldDefinition, SchemaError, read_custom_fields};

/// Environment variable overriding `end_date` from the config file.
pub const END_DATE_ENV: &str = "ISSUELINE_END_DATE";

/// Allow-lists gating the delivery lead time metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLeadTime {
    /// Statuses whose dwell time counts toward lead time.
    #[serde(default)]
    pub statuses: BTreeSet<String>,
    /// Issue types the metric is reported for.
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// Resolutions the metric is reported for.
    #[serde(default)]
    pub resolutions: BTreeSet<String>,
}

/// Everything the engine reads besides the issue itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineConfig {
    /// As-of boundary for the terminal snapshot.
    pub end_date: DateTime<FixedOffset>,
    pub delivery_lead_time: DeliveryLeadTime,
    /// Ordered; each definition produces one custom-field column.
    pub custom_fields: Vec<CustomFieldDefinition>,
}

impl TimelineConfig {
    #[must_use]
    pub const fn new(end_date: DateTime<FixedOffset>) -> Self {
        Self {
            end_date,
            delivery_lead_time: DeliveryLeadTime {
                statuses: BTreeSet::new(),
                types: BTreeSet::new(),
                resolutions: BTreeSet::new(),
            },
            custom_fields: Vec::new(),
        }
    }
}

/// On-disk TOML layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub end_date: Option<String>,
    /// JSON custom-field schema, relative to the config file.
    #[serde(default)]
    pub custom_fields_path: Option<PathBuf>,
    #[serde(default)]
    pub delivery_lead_time: DeliveryLeadTime,
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigFile>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load and resolve a config file. A non-blank `end_date_override` beats the
/// file's `end_date`.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, when no end date is set, or
/// when the custom-field schema cannot be loaded. [`config_error_code`] maps
/// the failure to an [`ErrorCode`].
pub fn load_config(path: &Path, end_date_override: Option<String>) -> Result<TimelineConfig> {
    let file = load_config_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_config(file, base_dir, end_date_override)
}

/// Stable code for a config loading failure.
#[must_use]
pub fn config_error_code(err: &anyhow::Error) -> ErrorCode {
    err.downcast_ref::<SchemaError>()
        .map_or(ErrorCode::ConfigParseError, SchemaError::code)
}

pub fn resolve_config(
    file: ConfigFile,
    base_dir: &Path,
    end_date_override: Option<String>,
) -> Result<TimelineConfig> {
    let raw_end_date = resolve_end_date(file.end_date, end_date_override)?;
    let end_date = parse_timestamp("end_date", &raw_end_date)
        .with_context(|| format!("Invalid end_date '{raw_end_date}'"))?;

    let custom_fields = match file.custom_fields_path {
        Some(rel) => {
            let schema_path = base_dir.join(rel);
            let reader = std::fs::File::open(&schema_path)
                .map_err(SchemaError::from)
                .with_context(|| format!("Failed to open {}", schema_path.display()))?;
            read_custom_fields(reader)
                .with_context(|| format!("Failed to load {}", schema_path.display()))?
        }
        None => Vec::new(),
    };

    Ok(TimelineConfig {
        end_date,
        delivery_lead_time: file.delivery_lead_time,
        custom_fields,
    })
}

fn resolve_end_date(file_value: Option<String>, override_value: Option<String>) -> Result<String> {
    override_value
        .filter(|value| !value.trim().is_empty())
        .or(file_value)
        .ok_or_else(|| anyhow!("end_date is not set (config file or {END_DATE_ENV})"))
}
