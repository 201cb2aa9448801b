// src/report.rs
//
// Vulnerability / impact reporting: scalar exposure metrics derived from a
// simulation result, for the importing market's supply-chain view.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::calibrate::ModelParameters;
use crate::simulate::ExporterOutcome;

/// Supply-chain vulnerability summary for one scenario run.
///
/// Two headline ratios — the aggregate import-volume loss and the
/// quantity-weighted average CIF price change — plus the totals they are
/// built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityReport {
    pub scenario_id: String,
    /// Baseline total import quantity (tons).
    pub baseline_total_quantity: f64,
    /// Counterfactual total import quantity (tons).
    pub scenario_total_quantity: f64,
    /// (baseline - scenario) / baseline. Positive means volume lost.
    pub quantity_loss_fraction: f64,
    /// Quantity-weighted average CIF price at base tariffs/prices.
    pub baseline_avg_cif_price: f64,
    /// Quantity-weighted average CIF price under the scenario.
    pub scenario_avg_cif_price: f64,
    /// (scenario - baseline) / baseline. Positive means imports got dearer.
    pub price_change_fraction: f64,
}

impl VulnerabilityReport {
    /// Derive the report from a scenario's result rows.
    ///
    /// Base CIF prices are reconstructed from the calibrated parameters;
    /// scenario CIF prices and quantities come from the result rows.
    pub fn from_outcomes(
        scenario_id: &str,
        params: &ModelParameters,
        outcomes: &[ExporterOutcome],
    ) -> Self {
        let baseline_total_quantity: f64 = outcomes.iter().map(|r| r.quantity_base).sum();
        let scenario_total_quantity: f64 = outcomes.iter().map(|r| r.quantity_new).sum();

        let baseline_cif_value: f64 = params
            .exporters
            .iter()
            .map(|e| e.base_cif_price() * e.base_quantity)
            .sum();
        let scenario_cif_value: f64 = outcomes
            .iter()
            .map(|r| r.cif_price_new * r.quantity_new)
            .sum();

        let baseline_avg_cif_price = baseline_cif_value / baseline_total_quantity;
        let scenario_avg_cif_price = scenario_cif_value / scenario_total_quantity;

        Self {
            scenario_id: scenario_id.to_string(),
            baseline_total_quantity,
            scenario_total_quantity,
            quantity_loss_fraction: (baseline_total_quantity - scenario_total_quantity)
                / baseline_total_quantity,
            baseline_avg_cif_price,
            scenario_avg_cif_price,
            price_change_fraction: (scenario_avg_cif_price - baseline_avg_cif_price)
                / baseline_avg_cif_price,
        }
    }

    /// Render the human-readable key-value report.
    pub fn write_text<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(
            writer,
            "Supply Chain Vulnerability Analysis ({})",
            self.scenario_id
        )?;
        writeln!(writer, "================================================")?;
        writeln!(
            writer,
            "Import Volume Loss (Vul_Q): {:.4} ({:.2}%)",
            self.quantity_loss_fraction,
            self.quantity_loss_fraction * 100.0
        )?;
        writeln!(
            writer,
            "Price Increase (Vul_P):     {:.4} ({:.2}%)",
            self.price_change_fraction,
            self.price_change_fraction * 100.0
        )?;
        writeln!(writer)?;
        writeln!(writer, "Details:")?;
        writeln!(
            writer,
            "Baseline Total Import: {:.2} Tons",
            self.baseline_total_quantity
        )?;
        writeln!(
            writer,
            "Scenario Total Import: {:.2} Tons",
            self.scenario_total_quantity
        )?;
        writeln!(
            writer,
            "Baseline Avg CIF Price: ${:.2}/Ton",
            self.baseline_avg_cif_price
        )?;
        writeln!(
            writer,
            "Scenario Avg CIF Price: ${:.2}/Ton",
            self.scenario_avg_cif_price
        )?;
        Ok(())
    }
}
