// src/simulate.rs
//
// Scenario simulation: counterfactual equilibrium under tariff / price /
// demand shocks and optional supply caps.
//
// The allocation step is a pure function of the current CIF price vector,
// so the supply-cap pass can re-run it on inflated prices. The cap pass is
// deliberately one-shot (inflate prices once, re-allocate once), matching
// the source model: it is an approximation, not a converged constrained
// equilibrium, and a capped exporter's quantity may still exceed the
// literal cap.

use serde::{Deserialize, Serialize};

use crate::calibrate::{cif_price, ModelParameters};
use crate::error::ModelError;
use crate::scenario::ScenarioSpec;

/// One simulation result row. Field order is the documented column order
/// of the scenario result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExporterOutcome {
    pub exporter: String,
    /// Base-year quantity in tons.
    #[serde(rename = "q0")]
    pub quantity_base: f64,
    /// Counterfactual quantity in tons.
    #[serde(rename = "q_new")]
    pub quantity_new: f64,
    #[serde(rename = "delta_q")]
    pub delta_quantity: f64,
    #[serde(rename = "pct_change_q")]
    pub pct_change_quantity: f64,
    /// Counterfactual export value on FOB basis (allocation itself runs on
    /// CIF prices).
    #[serde(rename = "V_new")]
    pub export_value_new: f64,
    /// Value share of total expenditure; sums to 1 across rows.
    #[serde(rename = "share_new")]
    pub market_share_new: f64,
    pub tariff_new: f64,
    #[serde(rename = "p_fob_new")]
    pub fob_price_new: f64,
    pub cif_price_new: f64,
    /// Calibrated preference weight, echoed for the reporting layer.
    #[serde(rename = "alpha")]
    pub preference_weight: f64,
}

/// Result of one allocation pass.
struct Allocation {
    shares: Vec<f64>,
    quantities: Vec<f64>,
}

/// CES allocation at the given CIF price vector (in parameter order).
fn allocate(params: &ModelParameters, cif: &[f64], demand_shock: f64) -> Allocation {
    let sigma = params.sigma;

    let numerators: Vec<f64> = params
        .exporters
        .iter()
        .zip(cif)
        .map(|(e, c)| e.preference_weight * c.powf(1.0 - sigma))
        .collect();
    let denom: f64 = numerators.iter().sum();

    let price_index = denom.powf(1.0 / (1.0 - sigma));
    let total_quantity =
        params.demand_shifter * price_index.powf(-params.eta) * (1.0 + demand_shock);
    let total_expenditure = price_index * total_quantity;

    let shares: Vec<f64> = numerators.iter().map(|n| n / denom).collect();
    let quantities: Vec<f64> = shares
        .iter()
        .zip(cif)
        .map(|(s, c)| s * total_expenditure / c)
        .collect();

    Allocation { shares, quantities }
}

/// Run `scenario` against the calibrated `params`.
///
/// Returns one row per calibrated exporter, in parameter order. Pure:
/// identical inputs produce identical rows, and neither argument is
/// mutated.
pub fn simulate(
    params: &ModelParameters,
    scenario: &ScenarioSpec,
) -> Result<Vec<ExporterOutcome>, ModelError> {
    if params.sigma == 1.0 {
        return Err(ModelError::DegenerateElasticity {
            sigma: params.sigma,
        });
    }
    // Scenario keys must refer to calibrated exporters.
    for key in scenario.shocks.keys() {
        if params.exporter(key).is_none() {
            return Err(ModelError::UnknownExporter {
                exporter: key.clone(),
                context: "scenario shocks",
            });
        }
    }
    for key in scenario.supply_caps.keys() {
        if params.exporter(key).is_none() {
            return Err(ModelError::UnknownExporter {
                exporter: key.clone(),
                context: "scenario supply caps",
            });
        }
    }

    // Step 1: resolve per-exporter prices.
    let mut tariff_new = Vec::with_capacity(params.exporters.len());
    let mut fob_new = Vec::with_capacity(params.exporters.len());
    let mut cif_new = Vec::with_capacity(params.exporters.len());
    for e in &params.exporters {
        let shock = scenario.shocks.get(&e.name);
        let tariff = match shock.and_then(|s| s.new_tariff) {
            Some(t) => t,
            None => e.base_tariff + shock.map(|s| s.delta_tariff).unwrap_or(0.0),
        };
        let fob = shock
            .and_then(|s| s.new_fob_price)
            .unwrap_or(e.base_fob_price);
        let cif = cif_price(fob, e.transport_cost, tariff);
        // A tariff delta below -100% (or any other override combination
        // that drives the landed price to zero or below) would feed a
        // non-positive base into powf and poison the whole allocation.
        if cif <= 0.0 {
            return Err(ModelError::NonPositiveInput {
                exporter: e.name.clone(),
                field: "cif_price",
                value: cif,
            });
        }
        tariff_new.push(tariff);
        fob_new.push(fob);
        cif_new.push(cif);
    }

    // Step 2: allocate at the resolved prices.
    let mut allocation = allocate(params, &cif_new, scenario.demand_shock);

    // Step 3: one-shot supply-cap adjustment. Inflate the CIF price of any
    // capped, over-allocated exporter, then re-allocate exactly once.
    let mut price_adjusted = false;
    for (i, e) in params.exporters.iter().enumerate() {
        if let Some(cap) = scenario.supply_caps.get(&e.name) {
            let q = allocation.quantities[i];
            if q > cap.cap_quantity && cap.markup_rate > 0.0 {
                let overflow_ratio = (q - cap.cap_quantity) / cap.cap_quantity;
                cif_new[i] *= 1.0 + overflow_ratio * cap.markup_rate;
                price_adjusted = true;
            }
        }
    }
    if price_adjusted {
        allocation = allocate(params, &cif_new, scenario.demand_shock);
    }

    // Step 4: report against the base year.
    let rows = params
        .exporters
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let quantity_new = allocation.quantities[i];
            let delta_quantity = quantity_new - e.base_quantity;
            ExporterOutcome {
                exporter: e.name.clone(),
                quantity_base: e.base_quantity,
                quantity_new,
                delta_quantity,
                pct_change_quantity: delta_quantity / e.base_quantity,
                export_value_new: quantity_new * fob_new[i],
                market_share_new: allocation.shares[i],
                tariff_new: tariff_new[i],
                fob_price_new: fob_new[i],
                cif_price_new: cif_new[i],
                preference_weight: e.preference_weight,
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::calibrate;
    use crate::scenario::{ExporterShock, SupplyCap};
    use crate::types::{ExporterObservation, ExporterSet};

    fn obs(exporter: &str, quantity: f64, fob: f64, tariff: f64) -> ExporterObservation {
        ExporterObservation {
            exporter: exporter.to_string(),
            year: 2024,
            quantity_tons: quantity,
            fob_price: fob,
            tariff_rate: tariff,
            value_usd: quantity * fob,
        }
    }

    fn reference_params() -> ModelParameters {
        let observations = vec![
            obs("US", 30_000_000.0, 500.0, 0.13),
            obs("Brazil", 60_000_000.0, 480.0, 0.03),
            obs("Argentina", 10_000_000.0, 490.0, 0.03),
        ];
        let set = ExporterSet::new(["US", "Brazil", "Argentina"]);
        calibrate(&observations, &set, 2024, 4.0, 0.3, None).unwrap()
    }

    fn tariff_scenario(delta: f64) -> ScenarioSpec {
        let mut scenario = ScenarioSpec::baseline("us_tariff");
        scenario.shocks.insert(
            "US".to_string(),
            ExporterShock {
                delta_tariff: delta,
                ..Default::default()
            },
        );
        scenario
    }

    #[test]
    fn shares_sum_to_one() {
        let params = reference_params();
        let rows = simulate(&params, &tariff_scenario(0.25)).unwrap();
        let sum: f64 = rows.iter().map(|r| r.market_share_new).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_shock_reproduces_base_shares() {
        let params = reference_params();
        let rows = simulate(&params, &ScenarioSpec::baseline("noop")).unwrap();
        // Base expenditure shares from the calibration slice.
        let total_cif_value: f64 = params
            .exporters
            .iter()
            .map(|e| e.base_quantity * e.base_cif_price())
            .sum();
        for (row, e) in rows.iter().zip(&params.exporters) {
            let base_share = e.base_quantity * e.base_cif_price() / total_cif_value;
            assert!((row.market_share_new - base_share).abs() < 1e-9);
        }
    }

    #[test]
    fn new_tariff_wins_over_delta() {
        let params = reference_params();
        let mut scenario = ScenarioSpec::baseline("absolute");
        scenario.shocks.insert(
            "US".to_string(),
            ExporterShock {
                new_tariff: Some(0.50),
                delta_tariff: 0.25,
                ..Default::default()
            },
        );
        let rows = simulate(&params, &scenario).unwrap();
        let us = rows.iter().find(|r| r.exporter == "US").unwrap();
        assert!((us.tariff_new - 0.50).abs() < 1e-12);
    }

    #[test]
    fn tariff_delta_below_minus_one_is_rejected() {
        // base 0.13 + delta -1.5 resolves to a negative landed price.
        let params = reference_params();
        let err = simulate(&params, &tariff_scenario(-1.5)).unwrap_err();
        match err {
            ModelError::NonPositiveInput {
                exporter, field, value,
            } => {
                assert_eq!(exporter, "US");
                assert_eq!(field, "cif_price");
                assert!(value < 0.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fob_price_defaults_to_base() {
        let params = reference_params();
        let rows = simulate(&params, &tariff_scenario(0.25)).unwrap();
        let brazil = rows.iter().find(|r| r.exporter == "Brazil").unwrap();
        assert_eq!(brazil.fob_price_new, 480.0);
        assert_eq!(brazil.tariff_new, 0.03);
    }

    #[test]
    fn export_value_is_fob_basis() {
        let params = reference_params();
        let rows = simulate(&params, &tariff_scenario(0.25)).unwrap();
        for row in &rows {
            assert!((row.export_value_new - row.quantity_new * row.fob_price_new).abs() < 1e-6);
            assert!(row.cif_price_new > row.fob_price_new);
        }
    }

    #[test]
    fn unknown_scenario_exporter_is_rejected() {
        let params = reference_params();
        let mut scenario = ScenarioSpec::baseline("stray");
        scenario
            .shocks
            .insert("Chile".to_string(), ExporterShock::default());
        let err = simulate(&params, &scenario).unwrap_err();
        match err {
            ModelError::UnknownExporter { exporter, .. } => assert_eq!(exporter, "Chile"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn binding_cap_reduces_allocation_but_need_not_enforce() {
        let params = reference_params();
        let scenario = tariff_scenario(0.25);
        let uncapped = simulate(&params, &scenario).unwrap();
        let brazil_uncapped = uncapped
            .iter()
            .find(|r| r.exporter == "Brazil")
            .unwrap()
            .quantity_new;

        // Cap Brazil 10% below its uncapped allocation.
        let cap_quantity = brazil_uncapped * 0.9;
        let mut capped_scenario = scenario.clone();
        capped_scenario.supply_caps.insert(
            "Brazil".to_string(),
            SupplyCap {
                cap_quantity,
                markup_rate: 0.10,
            },
        );
        let capped = simulate(&params, &capped_scenario).unwrap();
        let brazil_capped = capped
            .iter()
            .find(|r| r.exporter == "Brazil")
            .unwrap()
            .quantity_new;

        // The single pass pulls the quantity down but does not clamp it to
        // the literal cap.
        assert!(brazil_capped < brazil_uncapped);
        assert!(brazil_capped > cap_quantity);

        // Shares still sum to 1 after the adjustment pass.
        let sum: f64 = capped.iter().map(|r| r.market_share_new).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_markup_disables_cap_pass() {
        let params = reference_params();
        let mut scenario = tariff_scenario(0.25);
        scenario.supply_caps.insert(
            "Brazil".to_string(),
            SupplyCap {
                cap_quantity: 1_000_000.0,
                markup_rate: 0.0,
            },
        );
        let with_inactive_cap = simulate(&params, &scenario).unwrap();
        let without = simulate(&params, &tariff_scenario(0.25)).unwrap();
        assert_eq!(with_inactive_cap, without);
    }

    #[test]
    fn demand_shock_scales_quantities() {
        let params = reference_params();
        let mut contraction = ScenarioSpec::baseline("contraction");
        contraction.demand_shock = -0.10;
        let shocked = simulate(&params, &contraction).unwrap();
        let base = simulate(&params, &ScenarioSpec::baseline("noop")).unwrap();
        for (s, b) in shocked.iter().zip(&base) {
            assert!((s.quantity_new / b.quantity_new - 0.90).abs() < 1e-9);
        }
    }
}
