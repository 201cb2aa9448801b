// src/types.rs
//
// Shared types for the import-demand model: the registered exporter set
// and the per-exporter-per-year input observation.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The registered set of exporting countries for one model instance.
///
/// Every keyed input (transport costs, scenario shocks, supply caps) is
/// validated against this set; unknown keys are rejected early rather than
/// silently ignored. Order is preserved and is the canonical iteration and
/// output order everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterSet {
    names: Vec<String>,
}

impl ExporterSet {
    /// Build a set from a list of names, preserving first-occurrence order
    /// and dropping duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of `name` in canonical order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Reject any key outside the registered set. `context` names the
    /// offending input in the error message (e.g. "scenario shocks").
    pub fn check_keys<'a, I>(&self, keys: I, context: &'static str) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for key in keys {
            if !self.contains(key) {
                return Err(ModelError::UnknownExporter {
                    exporter: key.to_string(),
                    context,
                });
            }
        }
        Ok(())
    }
}

/// One input row: an exporter's trade with the importing market in one year.
///
/// `value_usd` is the reported FOB trade value and is informational only;
/// calibration builds its expenditure weights from the internally computed
/// CIF value `quantity_tons * cif_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterObservation {
    pub exporter: String,
    pub year: i32,
    /// Shipped quantity in tons. Must be > 0 for calibration rows.
    pub quantity_tons: f64,
    /// Free-on-board unit price in currency per ton. Must be > 0 for
    /// calibration rows.
    pub fob_price: f64,
    /// Ad-valorem tariff as a fraction (0.13 = 13%).
    pub tariff_rate: f64,
    /// Reported FOB trade value.
    pub value_usd: f64,
}
