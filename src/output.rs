// src/output.rs
//
// Output layer for scenario and sweep runs:
// - results.csv: one row per exporter, fixed documented header
// - sensitivity_<parameter>.csv: one row per swept value
// - run_summary.json: small, stable summary with a determinism checksum
// - vulnerability_report.txt: human-readable exposure report
//
// All interchange is flat delimited tables or JSON; no binary formats.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::calibrate::ModelParameters;
use crate::report::VulnerabilityReport;
use crate::simulate::ExporterOutcome;
use crate::sweep::{SweepParameter, SweepRow};

/// Output schema version.
pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

/// Create the per-run output directory `base_dir/<scenario_id>/`.
pub fn create_output_dir(base_dir: &Path, scenario_id: &str) -> io::Result<PathBuf> {
    let path = base_dir.join(scenario_id);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Write the scenario result table.
///
/// Header: exporter,q0,q_new,delta_q,pct_change_q,V_new,share_new,
/// tariff_new,p_fob_new,cif_price_new,alpha
pub fn write_results_csv<P: AsRef<Path>>(
    path: P,
    outcomes: &[ExporterOutcome],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in outcomes {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the sensitivity table (one row per swept value, input order).
pub fn write_sweep_csv<P: AsRef<Path>>(path: P, rows: &[SweepRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Calibration snapshot embedded in the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResolved {
    pub base_year: i32,
    pub sigma: f64,
    pub eta: f64,
    pub demand_shifter: f64,
    pub base_price_index: f64,
    pub base_quantity: f64,
    pub exporters: Vec<String>,
}

impl CalibrationResolved {
    pub fn from_params(params: &ModelParameters) -> Self {
        Self {
            base_year: params.base_year,
            sigma: params.sigma,
            eta: params.eta,
            demand_shifter: params.demand_shifter,
            base_price_index: params.base_price_index,
            base_quantity: params.base_quantity,
            exporters: params.exporter_names().map(str::to_string).collect(),
        }
    }
}

/// Determinism information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterminismInfo {
    /// SHA-256 over the rounded result rows.
    pub checksum: String,
}

/// Machine-readable summary of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub scenario_id: String,
    pub scenario_version: u32,
    pub calibration: CalibrationResolved,
    pub vulnerability: VulnerabilityReport,
    pub determinism: DeterminismInfo,
}

impl RunSummary {
    pub fn new(
        scenario_id: &str,
        scenario_version: u32,
        params: &ModelParameters,
        outcomes: &[ExporterOutcome],
        vulnerability: VulnerabilityReport,
    ) -> Self {
        let checksum = compute_checksum(outcomes);
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            scenario_id: scenario_id.to_string(),
            scenario_version,
            calibration: CalibrationResolved::from_params(params),
            vulnerability,
            determinism: DeterminismInfo { checksum },
        }
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Checksum of the result rows, rounded to 6 decimal places so repeated
/// runs can be byte-compared in CI.
pub fn compute_checksum(outcomes: &[ExporterOutcome]) -> String {
    let mut hasher = Sha256::new();
    for row in outcomes {
        hasher.update(row.exporter.as_bytes());
        for value in [
            row.quantity_base,
            row.quantity_new,
            row.market_share_new,
            row.tariff_new,
            row.fob_price_new,
            row.cif_price_new,
        ] {
            let rounded = (value * 1_000_000.0).round() as i64;
            hasher.update(rounded.to_le_bytes());
        }
    }
    let hash = hasher.finalize();
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write vulnerability_report.txt next to the other run outputs.
pub fn write_vulnerability_report<P: AsRef<Path>>(
    path: P,
    report: &VulnerabilityReport,
) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    report.write_text(&mut writer)?;
    writer.flush()
}

/// Print the scenario result table as fixed-width text.
pub fn print_results_table<W: Write>(outcomes: &[ExporterOutcome], mut writer: W) -> io::Result<()> {
    writeln!(
        writer,
        "{:<12} {:>15} {:>15} {:>15} {:>9} {:>18} {:>9} {:>11}",
        "EXPORTER", "Q0", "Q_NEW", "DELTA_Q", "PCT_Q", "V_NEW", "SHARE", "TARIFF_NEW",
    )?;
    for row in outcomes {
        writeln!(
            writer,
            "{:<12} {:>15.0} {:>15.0} {:>15.0} {:>8.2}% {:>18.0} {:>9.4} {:>11.4}",
            row.exporter,
            row.quantity_base,
            row.quantity_new,
            row.delta_quantity,
            row.pct_change_quantity * 100.0,
            row.export_value_new,
            row.market_share_new,
            row.tariff_new,
        )?;
    }
    Ok(())
}

/// Print the sensitivity table as fixed-width text.
pub fn print_sweep_table<W: Write>(
    parameter: SweepParameter,
    rows: &[SweepRow],
    mut writer: W,
) -> io::Result<()> {
    let with_competitor = rows.iter().any(|r| r.competitor_share_new.is_some());
    write!(
        writer,
        "{:<10} {:>16} {:>16} {:>16}",
        parameter.as_str().to_ascii_uppercase(),
        "FOCUS_PCT_Q",
        "FOCUS_SHARE",
        "TOTAL_PCT_Q",
    )?;
    if with_competitor {
        write!(writer, " {:>16}", "COMP_SHARE")?;
    }
    writeln!(writer)?;
    for row in rows {
        write!(
            writer,
            "{:<10.4} {:>16.4} {:>16.4} {:>16.4}",
            row.value, row.focus_pct_change_q, row.focus_share_new, row.total_pct_change_q,
        )?;
        if with_competitor {
            match row.competitor_share_new {
                Some(share) => write!(writer, " {:>16.4}", share)?,
                None => write!(writer, " {:>16}", "-")?,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(exporter: &str, q_new: f64) -> ExporterOutcome {
        ExporterOutcome {
            exporter: exporter.to_string(),
            quantity_base: 30_000_000.0,
            quantity_new: q_new,
            delta_quantity: q_new - 30_000_000.0,
            pct_change_quantity: (q_new - 30_000_000.0) / 30_000_000.0,
            export_value_new: q_new * 500.0,
            market_share_new: 0.5,
            tariff_new: 0.13,
            fob_price_new: 500.0,
            cif_price_new: 565.0,
            preference_weight: 0.42,
        }
    }

    #[test]
    fn checksum_is_deterministic() {
        let rows = vec![outcome("US", 16_000_000.0), outcome("Brazil", 70_000_000.0)];
        assert_eq!(compute_checksum(&rows), compute_checksum(&rows.clone()));
    }

    #[test]
    fn checksum_differs_for_different_results() {
        let a = vec![outcome("US", 16_000_000.0)];
        let b = vec![outcome("US", 16_000_001.0)];
        assert_ne!(compute_checksum(&a), compute_checksum(&b));
    }

    #[test]
    fn results_table_prints_every_exporter() {
        let rows = vec![outcome("US", 16_000_000.0), outcome("Brazil", 70_000_000.0)];
        let mut out = Vec::new();
        print_results_table(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("US"));
        assert!(text.contains("Brazil"));
        assert!(text.contains("EXPORTER"));
    }
}
