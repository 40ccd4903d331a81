use anyhow::Result;
use clap::Args;
use issueline_core::config::TimelineConfig;
use issueline_core::model::CustomFieldDefinition;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cmd::load_effective_config;
use crate::output::{OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Config file.
    #[arg(short, long, value_name = "PATH", default_value = "issueline.toml")]
    pub config: PathBuf,

    /// Override the as-of end date.
    #[arg(long, value_name = "TIMESTAMP")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    end_date: String,
    delivery_statuses: &'a BTreeSet<String>,
    delivery_types: &'a BTreeSet<String>,
    delivery_resolutions: &'a BTreeSet<String>,
    custom_fields: &'a [CustomFieldDefinition],
}

impl<'a> ConfigReport<'a> {
    fn new(config: &'a TimelineConfig) -> Self {
        Self {
            end_date: config.end_date.to_rfc3339(),
            delivery_statuses: &config.delivery_lead_time.statuses,
            delivery_types: &config.delivery_lead_time.types,
            delivery_resolutions: &config.delivery_lead_time.resolutions,
            custom_fields: &config.custom_fields,
        }
    }
}

pub fn run_check_config(args: &CheckConfigArgs, output: OutputMode) -> Result<()> {
    let config = load_effective_config(&args.config, args.end_date.as_deref())?;
    let report = ConfigReport::new(&config);
    render(&mut io::stdout().lock(), output, &report, render_human)
}

fn joined(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

fn render_human(report: &ConfigReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(w, "end_date", &report.end_date)?;
    pretty_kv(w, "delivery statuses", joined(report.delivery_statuses))?;
    pretty_kv(w, "delivery types", joined(report.delivery_types))?;
    pretty_kv(w, "delivery resolutions", joined(report.delivery_resolutions))?;
    pretty_kv(w, "custom fields", report.custom_fields.len().to_string())?;
    for field in report.custom_fields {
        writeln!(
            w,
            "  {} ({}, {})",
            field.identifier, field.display_name, field.field_type
        )?;
    }
    Ok(())
}
