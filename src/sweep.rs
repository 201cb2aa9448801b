// src/sweep.rs
//
// Sensitivity runner: re-calibrate and re-simulate a fixed scenario across
// a sequence of elasticity values, collecting one summary row per value.
//
// Each sweep point is fully independent (fresh calibration, fresh
// simulation, no shared mutable state), so the loop is trivially
// parallelizable if it ever needs to be. Output order matches input order;
// values are neither sorted nor de-duplicated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibrate::calibrate;
use crate::error::ModelError;
use crate::scenario::ScenarioSpec;
use crate::simulate::simulate;
use crate::types::{ExporterObservation, ExporterSet};

/// Which elasticity the sweep varies. The other one stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    Sigma,
    Eta,
}

impl SweepParameter {
    /// Stable lowercase name (used in logs and output file names).
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepParameter::Sigma => "sigma",
            SweepParameter::Eta => "eta",
        }
    }

    /// Parse a parameter name (case-insensitive). Returns None if
    /// unrecognized.
    pub fn parse(s: &str) -> Option<SweepParameter> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigma" => Some(SweepParameter::Sigma),
            "eta" => Some(SweepParameter::Eta),
            _ => None,
        }
    }
}

impl std::fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sweep summary row: the swept value plus the focus exporter's
/// response, the aggregate demand change, and optionally a competitor's
/// counterfactual share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    #[serde(rename = "swept_parameter_value")]
    pub value: f64,
    /// Focus exporter's fractional quantity change vs. base.
    pub focus_pct_change_q: f64,
    /// Focus exporter's counterfactual value share.
    pub focus_share_new: f64,
    /// Fractional change of total quantity vs. the base-year total.
    pub total_pct_change_q: f64,
    /// Competitor exporter's counterfactual value share, when a competitor
    /// was requested. Serialized as an empty CSV field otherwise.
    #[serde(default)]
    pub competitor_share_new: Option<f64>,
}

/// Sweep `parameter` over `values`, holding everything else fixed.
///
/// `sigma` and `eta` give the fixed baseline; the swept one is replaced
/// per value. `focus_exporter` selects which exporter's response each row
/// reports; `competitor_exporter` optionally adds a second exporter's
/// counterfactual share to each row.
#[allow(clippy::too_many_arguments)]
pub fn run_sweep(
    observations: &[ExporterObservation],
    exporters: &ExporterSet,
    base_year: i32,
    parameter: SweepParameter,
    values: &[f64],
    sigma: f64,
    eta: f64,
    transport_costs: Option<&BTreeMap<String, f64>>,
    scenario: &ScenarioSpec,
    focus_exporter: &str,
    competitor_exporter: Option<&str>,
) -> Result<Vec<SweepRow>, ModelError> {
    if !exporters.contains(focus_exporter) {
        return Err(ModelError::UnknownExporter {
            exporter: focus_exporter.to_string(),
            context: "sweep focus exporter",
        });
    }
    if let Some(competitor) = competitor_exporter {
        if !exporters.contains(competitor) {
            return Err(ModelError::UnknownExporter {
                exporter: competitor.to_string(),
                context: "sweep competitor exporter",
            });
        }
    }
    scenario.check_exporters(exporters)?;

    let mut rows = Vec::with_capacity(values.len());
    for &value in values {
        let (s, e) = match parameter {
            SweepParameter::Sigma => (value, eta),
            SweepParameter::Eta => (sigma, value),
        };
        let params = calibrate(observations, exporters, base_year, s, e, transport_costs)?;
        let outcomes = simulate(&params, scenario)?;

        let focus = outcomes
            .iter()
            .find(|r| r.exporter == focus_exporter)
            .ok_or_else(|| ModelError::UnknownExporter {
                exporter: focus_exporter.to_string(),
                context: "sweep focus exporter",
            })?;
        let total_base: f64 = outcomes.iter().map(|r| r.quantity_base).sum();
        let total_new: f64 = outcomes.iter().map(|r| r.quantity_new).sum();
        let competitor_share_new = competitor_exporter.and_then(|competitor| {
            outcomes
                .iter()
                .find(|r| r.exporter == competitor)
                .map(|r| r.market_share_new)
        });

        rows.push(SweepRow {
            value,
            focus_pct_change_q: focus.pct_change_quantity,
            focus_share_new: focus.market_share_new,
            total_pct_change_q: (total_new - total_base) / total_base,
            competitor_share_new,
        });
    }
    Ok(rows)
}
