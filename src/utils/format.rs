//! Output formatting
//!
//! Command results are printed as a table for people or as JSON/YAML for
//! scripts.

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Render rows in the requested format
pub fn render_rows<T: Tabled + Serialize>(format: OutputFormat, rows: &[T]) -> Result<String> {
    match format {
        OutputFormat::Text => {
            if rows.is_empty() {
                return Ok("No data to display".to_string());
            }
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(rows)?),
    }
}

/// Render a single value; text output falls back to YAML
pub fn render_value<T: Serialize>(format: OutputFormat, value: &T) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text | OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}
