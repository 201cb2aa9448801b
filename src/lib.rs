//! Armington core library.
//!
//! This crate calibrates and simulates a CES (Armington) import-demand
//! model for a single importing market sourcing one commodity from several
//! exporting countries, and quantifies how tariff and price shocks
//! redistribute trade volumes and values among the exporters. The binary
//! (`src/main.rs`) is just a thin CLI harness around these components.
//!
//! # Architecture
//!
//! The codebase keeps a strict separation between the pure compute core
//! and I/O:
//!
//! - **Calibrator** (`calibrate`): pure function from one base-year slice
//!   of the input table to an immutable [`ModelParameters`] (preference
//!   weights, price index, demand shifter).
//!
//! - **Simulator** (`simulate`): pure function from `ModelParameters` plus
//!   a [`ScenarioSpec`] to per-exporter result rows, including the
//!   one-shot supply-cap price adjustment.
//!
//! - **Sensitivity runner** (`sweep`): re-runs calibration + simulation
//!   across an elasticity sweep, one summary row per value.
//!
//! - **I/O layer** (`input`, `output`, `report`): CSV input table loading,
//!   result/sweep tables, run summaries with determinism checksums, and
//!   the vulnerability report. Nothing in the compute core touches the
//!   filesystem.
//!
//! Calibration and simulation share no mutable state: a `ModelParameters`
//! value is built once and read by any number of simulation calls, so
//! sweep points are fully independent of each other.

pub mod calibrate;
pub mod error;
pub mod input;
pub mod output;
pub mod report;
pub mod scenario;
pub mod simulate;
pub mod sweep;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use calibrate::{calibrate, cif_price, ExporterParams, ModelParameters};
pub use error::ModelError;
pub use input::{load_observations, InputError};
pub use report::VulnerabilityReport;
pub use scenario::{ExporterShock, ScenarioError, ScenarioSpec, SupplyCap};
pub use simulate::{simulate, ExporterOutcome};
pub use sweep::{run_sweep, SweepParameter, SweepRow};
pub use types::{ExporterObservation, ExporterSet};
