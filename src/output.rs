//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON serialization, gzip encoding and CSV append.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::stats::YearOverYear;
use csv::WriterBuilder;

/// One summary run, flattened for CSV.
#[derive(Debug, Default, Serialize)]
pub struct SummaryRecord {
    pub timestamp: DateTime<Utc>,
    pub start_year: i32,
    pub end_year: i32,
    pub prior_year: Option<i32>,
    pub current_year: Option<i32>,
    pub last_change_pct: Option<f64>,
    pub avg_change_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub wind_correlation: Option<f64>,
}

impl SummaryRecord {
    pub fn new(start_year: i32, end_year: i32, yoy: Option<&YearOverYear>, wind_correlation: Option<f64>) -> Self {
        SummaryRecord {
            timestamp: Utc::now(),
            start_year,
            end_year,
            prior_year: yoy.map(|y| y.prior_year),
            current_year: yoy.map(|y| y.current_year),
            last_change_pct: yoy.map(|y| y.last_change),
            avg_change_pct: yoy.map(|y| y.avg_change),
            volatility_pct: yoy.map(|y| y.volatility),
            wind_correlation,
        }
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes a value to JSON bytes, gzip-compressed when `gzip` is set.
pub fn encode_json(value: &impl Serialize, gzip: bool) -> Result<Vec<u8>> {
    let body = serde_json::to_vec_pretty(value)?;
    if !gzip {
        return Ok(body);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&body)?;
    Ok(encoder.finish()?)
}

/// Writes a value as JSON to `path`, creating parent directories.
pub fn write_json(path: &str, value: &impl Serialize, gzip: bool) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for '{path}'"))?;
        }
    }
    let bytes = encode_json(value, gzip)?;
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write '{path}'"))?;
    info!(path, bytes = bytes.len(), gzip, "JSON written");
    Ok(())
}

/// Appends a [`SummaryRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &SummaryRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
