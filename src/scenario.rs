// src/scenario.rs
//
// Scenario specification parsing and validation.
//
// A scenario fully defines one counterfactual run against a calibrated
// model:
// - scenario_id + scenario_version for tracking
// - optional aggregate demand shock
// - per-exporter tariff / FOB price overrides
// - optional per-exporter supply caps with price markups
//
// Scenarios are constructed per run, validated up front, and consumed
// read-only by the simulator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ModelError;
use crate::types::ExporterSet;

/// Current scenario schema version.
pub const SCENARIO_SCHEMA_VERSION: u32 = 1;

/// Per-exporter price-side overrides.
///
/// `new_tariff`, when present, wins over `base_tariff + delta_tariff`.
/// `new_fob_price` defaults to the calibrated base FOB price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExporterShock {
    /// Absolute replacement tariff (fraction).
    #[serde(default)]
    pub new_tariff: Option<f64>,
    /// Additive tariff change on top of the base tariff (fraction).
    #[serde(default)]
    pub delta_tariff: f64,
    /// Replacement FOB price (currency per ton).
    #[serde(default)]
    pub new_fob_price: Option<f64>,
}

/// Supply cap with an elastic-supply price markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyCap {
    /// Quantity ceiling in tons.
    pub cap_quantity: f64,
    /// Price inflation per unit of overflow ratio. A markup of 0 disables
    /// the adjustment even when the cap is exceeded.
    #[serde(default)]
    pub markup_rate: f64,
}

/// Complete scenario specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique scenario identifier (used for output directory naming).
    pub scenario_id: String,
    /// Schema version (starts at 1).
    pub scenario_version: u32,
    /// Fractional multiplier on total demand (-0.1 = 10% contraction).
    #[serde(default)]
    pub demand_shock: f64,
    /// Per-exporter tariff / price overrides, keyed by exporter name.
    #[serde(default)]
    pub shocks: BTreeMap<String, ExporterShock>,
    /// Per-exporter supply caps, keyed by exporter name.
    #[serde(default)]
    pub supply_caps: BTreeMap<String, SupplyCap>,
}

impl ScenarioSpec {
    /// A no-op scenario: base tariffs, base prices, no demand shock.
    pub fn baseline(scenario_id: &str) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            scenario_version: SCENARIO_SCHEMA_VERSION,
            demand_shock: 0.0,
            shocks: BTreeMap::new(),
            supply_caps: BTreeMap::new(),
        }
    }

    /// Load a scenario from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ScenarioError::Io {
            path: path.as_ref().display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse a scenario from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScenarioError> {
        let spec: ScenarioSpec = serde_yaml::from_str(yaml).map_err(|e| ScenarioError::Parse {
            source: e.to_string(),
        })?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate field-level constraints.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.scenario_id.is_empty() {
            return Err(ScenarioError::Validation {
                field: "scenario_id".to_string(),
                message: "scenario_id cannot be empty".to_string(),
            });
        }
        if self.scenario_version == 0 {
            return Err(ScenarioError::Validation {
                field: "scenario_version".to_string(),
                message: "scenario_version must be >= 1".to_string(),
            });
        }
        if self.demand_shock <= -1.0 {
            return Err(ScenarioError::Validation {
                field: "demand_shock".to_string(),
                message: "demand_shock must be > -1".to_string(),
            });
        }
        for (exporter, shock) in &self.shocks {
            if let Some(t) = shock.new_tariff {
                if t < 0.0 {
                    return Err(ScenarioError::Validation {
                        field: format!("shocks.{exporter}.new_tariff"),
                        message: "new_tariff must be >= 0".to_string(),
                    });
                }
            }
            if let Some(p) = shock.new_fob_price {
                if p <= 0.0 {
                    return Err(ScenarioError::Validation {
                        field: format!("shocks.{exporter}.new_fob_price"),
                        message: "new_fob_price must be > 0".to_string(),
                    });
                }
            }
        }
        for (exporter, cap) in &self.supply_caps {
            if cap.cap_quantity <= 0.0 {
                return Err(ScenarioError::Validation {
                    field: format!("supply_caps.{exporter}.cap_quantity"),
                    message: "cap_quantity must be > 0".to_string(),
                });
            }
            if cap.markup_rate < 0.0 {
                return Err(ScenarioError::Validation {
                    field: format!("supply_caps.{exporter}.markup_rate"),
                    message: "markup_rate must be >= 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reject shocks or caps that name an exporter outside the registered
    /// set.
    pub fn check_exporters(&self, exporters: &ExporterSet) -> Result<(), ModelError> {
        exporters.check_keys(self.shocks.keys().map(String::as_str), "scenario shocks")?;
        exporters.check_keys(
            self.supply_caps.keys().map(String::as_str),
            "scenario supply caps",
        )?;
        Ok(())
    }
}

/// Errors that can occur when working with scenario files.
#[derive(Debug, Clone)]
pub enum ScenarioError {
    Io { path: String, source: String },
    Parse { source: String },
    Validation { field: String, message: String },
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io { path, source } => {
                write!(f, "failed to read scenario file '{}': {}", path, source)
            }
            ScenarioError::Parse { source } => {
                write!(f, "failed to parse scenario YAML: {}", source)
            }
            ScenarioError::Validation { field, message } => {
                write!(f, "scenario validation error in '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}
