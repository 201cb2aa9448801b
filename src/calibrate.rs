// src/calibrate.rs
//
// CES calibration: fit the demand system to one base-year slice of the
// input table.
//
// Calibration is a pure function over immutable inputs. The resulting
// ModelParameters are built once and shared read-only across any number of
// simulation calls; nothing in this crate mutates them afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{ExporterObservation, ExporterSet};

/// Landed (CIF) unit price: tariff applies to FOB-plus-transport value.
///
/// This convention is applied uniformly in calibration and simulation.
pub fn cif_price(fob_price: f64, transport_cost: f64, tariff_rate: f64) -> f64 {
    (fob_price + transport_cost) * (1.0 + tariff_rate)
}

/// Per-exporter calibrated parameters, frozen at the base year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterParams {
    pub name: String,
    /// CES preference weight alpha. Weights sum to 1 across exporters.
    pub preference_weight: f64,
    pub base_fob_price: f64,
    pub base_quantity: f64,
    pub base_tariff: f64,
    pub transport_cost: f64,
}

impl ExporterParams {
    /// Base-year landed price under the calibrated tariff.
    pub fn base_cif_price(&self) -> f64 {
        cif_price(self.base_fob_price, self.transport_cost, self.base_tariff)
    }
}

/// Calibration output: the fitted demand system.
///
/// Immutable once built. Exporters are stored in registered-set order,
/// which is the row order of every simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub base_year: i32,
    /// Substitution elasticity between exporters' goods (> 1).
    pub sigma: f64,
    /// Elasticity of aggregate demand w.r.t. the price index (> 0).
    pub eta: f64,
    /// Demand shifter A with Q = A * P^(-eta).
    pub demand_shifter: f64,
    /// Base CES price index P0.
    pub base_price_index: f64,
    /// Base total quantity Q0 (tonnage sum over exporters).
    pub base_quantity: f64,
    pub exporters: Vec<ExporterParams>,
}

impl ModelParameters {
    pub fn exporter(&self, name: &str) -> Option<&ExporterParams> {
        self.exporters.iter().find(|e| e.name == name)
    }

    pub fn exporter_names(&self) -> impl Iterator<Item = &str> {
        self.exporters.iter().map(|e| e.name.as_str())
    }
}

/// Fit the CES demand system to the `base_year` slice of `observations`.
///
/// Requires one observation per registered exporter in the base year, with
/// positive quantity and FOB price and a non-negative tariff. `sigma` must
/// not be 1 (the price-index exponent 1/(1-sigma) is undefined there).
/// `transport_costs` defaults to zero per exporter when omitted; its keys
/// are validated against the registered set.
pub fn calibrate(
    observations: &[ExporterObservation],
    exporters: &ExporterSet,
    base_year: i32,
    sigma: f64,
    eta: f64,
    transport_costs: Option<&BTreeMap<String, f64>>,
) -> Result<ModelParameters, ModelError> {
    if sigma == 1.0 {
        return Err(ModelError::DegenerateElasticity { sigma });
    }
    if let Some(costs) = transport_costs {
        exporters.check_keys(costs.keys().map(String::as_str), "transport costs")?;
    }

    if !observations.iter().any(|o| o.year == base_year) {
        return Err(ModelError::MissingBaseYearData {
            base_year,
            exporter: None,
        });
    }

    // Base-year slice in registered order.
    let mut base: Vec<(&ExporterObservation, f64)> = Vec::with_capacity(exporters.len());
    for name in exporters.iter() {
        let obs = observations
            .iter()
            .find(|o| o.year == base_year && o.exporter == name)
            .ok_or_else(|| ModelError::MissingBaseYearData {
                base_year,
                exporter: Some(name.to_string()),
            })?;
        if obs.quantity_tons <= 0.0 {
            return Err(ModelError::NonPositiveInput {
                exporter: name.to_string(),
                field: "quantity_tons",
                value: obs.quantity_tons,
            });
        }
        if obs.fob_price <= 0.0 {
            return Err(ModelError::NonPositiveInput {
                exporter: name.to_string(),
                field: "fob_price",
                value: obs.fob_price,
            });
        }
        if obs.tariff_rate < 0.0 {
            return Err(ModelError::NonPositiveInput {
                exporter: name.to_string(),
                field: "tariff_rate",
                value: obs.tariff_rate,
            });
        }
        let transport = transport_costs
            .and_then(|c| c.get(name).copied())
            .unwrap_or(0.0);
        // A negative transport cost below -fob would make the landed price
        // non-positive and poison the share and power computations below.
        let landed = cif_price(obs.fob_price, transport, obs.tariff_rate);
        if landed <= 0.0 {
            return Err(ModelError::NonPositiveInput {
                exporter: name.to_string(),
                field: "cif_price",
                value: landed,
            });
        }
        base.push((obs, transport));
    }

    // Expenditure shares on CIF-basis value.
    let cif: Vec<f64> = base
        .iter()
        .map(|(o, transport)| cif_price(o.fob_price, *transport, o.tariff_rate))
        .collect();
    let total_cif_value: f64 = base
        .iter()
        .zip(&cif)
        .map(|((o, _), c)| o.quantity_tons * c)
        .sum();
    let shares: Vec<f64> = base
        .iter()
        .zip(&cif)
        .map(|((o, _), c)| o.quantity_tons * c / total_cif_value)
        .collect();

    // alpha_i = share_i * cif_i^(sigma-1), normalized to sum to 1.
    let alpha_tilde: Vec<f64> = shares
        .iter()
        .zip(&cif)
        .map(|(s, c)| s * c.powf(sigma - 1.0))
        .collect();
    let alpha_sum: f64 = alpha_tilde.iter().sum();
    let alpha: Vec<f64> = alpha_tilde.iter().map(|a| a / alpha_sum).collect();

    // P0 = (sum alpha_i * cif_i^(1-sigma))^(1/(1-sigma))
    let index_inner: f64 = alpha
        .iter()
        .zip(&cif)
        .map(|(a, c)| a * c.powf(1.0 - sigma))
        .sum();
    let base_price_index = index_inner.powf(1.0 / (1.0 - sigma));

    // Q0 is the raw tonnage sum; A = Q0 * P0^eta so that Q = A * P^(-eta).
    let base_quantity: f64 = base.iter().map(|(o, _)| o.quantity_tons).sum();
    let demand_shifter = base_quantity * base_price_index.powf(eta);

    let exporters = base
        .iter()
        .zip(&alpha)
        .map(|((o, transport), a)| ExporterParams {
            name: o.exporter.clone(),
            preference_weight: *a,
            base_fob_price: o.fob_price,
            base_quantity: o.quantity_tons,
            base_tariff: o.tariff_rate,
            transport_cost: *transport,
        })
        .collect();

    Ok(ModelParameters {
        base_year,
        sigma,
        eta,
        demand_shifter,
        base_price_index,
        base_quantity,
        exporters,
    })
}
