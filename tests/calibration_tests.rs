// tests/calibration_tests.rs
//
// Calibration contract tests against the three-exporter reference data:
// US 30M tons @ 500 (13% tariff), Brazil 60M @ 480 (3%), Argentina
// 10M @ 490 (3%), zero transport, sigma = 4, eta = 0.3.

use std::collections::BTreeMap;

use armington::{calibrate, ExporterObservation, ExporterSet, ModelError};

fn obs(exporter: &str, year: i32, quantity: f64, fob: f64, tariff: f64) -> ExporterObservation {
    ExporterObservation {
        exporter: exporter.to_string(),
        year,
        quantity_tons: quantity,
        fob_price: fob,
        tariff_rate: tariff,
        value_usd: quantity * fob,
    }
}

fn reference_observations() -> Vec<ExporterObservation> {
    vec![
        obs("US", 2024, 30_000_000.0, 500.0, 0.13),
        obs("Brazil", 2024, 60_000_000.0, 480.0, 0.03),
        obs("Argentina", 2024, 10_000_000.0, 490.0, 0.03),
        // A non-base year that calibration must ignore.
        obs("US", 2023, 24_900_000.0, 515.0, 0.03),
    ]
}

fn reference_set() -> ExporterSet {
    ExporterSet::new(["US", "Brazil", "Argentina"])
}

#[test]
fn reference_calibration_values() {
    let params = calibrate(
        &reference_observations(),
        &reference_set(),
        2024,
        4.0,
        0.3,
        None,
    )
    .unwrap();

    assert_eq!(params.base_year, 2024);
    assert_eq!(params.base_quantity, 100_000_000.0);
    assert!((params.base_price_index - 520.639267).abs() < 1e-4);
    assert!((params.demand_shifter - 653_072_017.64).abs() / 653_072_017.64 < 1e-9);

    let alpha: Vec<f64> = params
        .exporters
        .iter()
        .map(|e| e.preference_weight)
        .collect();
    assert!((alpha[0] - 0.419316043).abs() < 1e-7); // US
    assert!((alpha[1] - 0.491690177).abs() < 1e-7); // Brazil
    assert!((alpha[2] - 0.088993780).abs() < 1e-7); // Argentina
}

#[test]
fn weights_sum_to_one_across_elasticities() {
    for sigma in [1.5, 2.0, 4.0, 8.0] {
        let params = calibrate(
            &reference_observations(),
            &reference_set(),
            2024,
            sigma,
            0.3,
            None,
        )
        .unwrap();
        let sum: f64 = params.exporters.iter().map(|e| e.preference_weight).sum();
        assert!(
            (sum - 1.0).abs() < 1e-9,
            "alpha sum {sum} at sigma {sigma}"
        );
    }
}

#[test]
fn rows_follow_registered_order() {
    let params = calibrate(
        &reference_observations(),
        &reference_set(),
        2024,
        4.0,
        0.3,
        None,
    )
    .unwrap();
    let names: Vec<&str> = params.exporter_names().collect();
    assert_eq!(names, ["US", "Brazil", "Argentina"]);
}

#[test]
fn calibration_is_all_or_nothing() {
    // A zero price in one row fails the whole call; no partial parameters.
    let mut observations = reference_observations();
    observations[1].fob_price = 0.0;
    let result = calibrate(&observations, &reference_set(), 2024, 4.0, 0.3, None);
    match result {
        Err(ModelError::NonPositiveInput {
            exporter, field, ..
        }) => {
            assert_eq!(exporter, "Brazil");
            assert_eq!(field, "fob_price");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn transport_costs_shift_weights_toward_cheap_logistics() {
    let observations = reference_observations();
    let set = reference_set();
    let without = calibrate(&observations, &set, 2024, 4.0, 0.3, None).unwrap();

    let costs: BTreeMap<String, f64> = [
        ("US".to_string(), 55.0),
        ("Brazil".to_string(), 103.0),
        ("Argentina".to_string(), 79.0),
    ]
    .into();
    let with = calibrate(&observations, &set, 2024, 4.0, 0.3, Some(&costs)).unwrap();

    // Weights still sum to 1 and the landed prices moved.
    let sum: f64 = with.exporters.iter().map(|e| e.preference_weight).sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(
        with.exporter("Brazil").unwrap().base_cif_price()
            > without.exporter("Brazil").unwrap().base_cif_price()
    );
}

#[test]
fn same_inputs_same_parameters() {
    let a = calibrate(
        &reference_observations(),
        &reference_set(),
        2024,
        4.0,
        0.3,
        None,
    )
    .unwrap();
    let b = calibrate(
        &reference_observations(),
        &reference_set(),
        2024,
        4.0,
        0.3,
        None,
    )
    .unwrap();
    assert_eq!(a, b);
}
