// src/input.rs
//
// Input-table loader. The engine consumes a tidy CSV with one row per
// exporter-year and the fixed header
//
//   year,exporter,quantity_tons,value_usd,p_fob,tariff_china
//
// produced upstream by the data-cleaning pipeline. Rows for exporters
// outside the registered set are skipped, mirroring the upstream filter.

use std::path::Path;

use serde::Deserialize;

use crate::types::{ExporterObservation, ExporterSet};

/// Raw CSV record with the documented input header.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    year: i32,
    exporter: String,
    quantity_tons: f64,
    value_usd: f64,
    p_fob: f64,
    tariff_china: f64,
}

impl From<ImportRecord> for ExporterObservation {
    fn from(r: ImportRecord) -> Self {
        ExporterObservation {
            exporter: r.exporter,
            year: r.year,
            quantity_tons: r.quantity_tons,
            fob_price: r.p_fob,
            tariff_rate: r.tariff_china,
            value_usd: r.value_usd,
        }
    }
}

/// Errors that can occur while loading the input table.
#[derive(Debug)]
pub enum InputError {
    Io { path: String, source: String },
    Parse { path: String, source: String },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Io { path, source } => {
                write!(f, "failed to read input table '{}': {}", path, source)
            }
            InputError::Parse { path, source } => {
                write!(f, "failed to parse input table '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Load all observations for the registered exporters from `path`.
///
/// Rows are returned in file order; year filtering happens later, during
/// calibration.
pub fn load_observations<P: AsRef<Path>>(
    path: P,
    exporters: &ExporterSet,
) -> Result<Vec<ExporterObservation>, InputError> {
    let display = path.as_ref().display().to_string();
    let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| InputError::Io {
        path: display.clone(),
        source: e.to_string(),
    })?;

    let mut observations = Vec::new();
    for record in reader.deserialize::<ImportRecord>() {
        let record = record.map_err(|e| InputError::Parse {
            path: display.clone(),
            source: e.to_string(),
        })?;
        if exporters.contains(&record.exporter) {
            observations.push(record.into());
        }
    }
    Ok(observations)
}
