// src/error.rs
//
// Caller-input errors for the calibration / simulation core.
//
// All of these are immediate, non-transient failures: bad input is surfaced
// as soon as it is seen and never silently defaulted (e.g. sigma = 1 is an
// error, not a nudge to 1.0001). A failed call returns no partial result.

/// Errors raised by calibration, simulation, and sweeps.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No usable observation for the configured base year. When `exporter`
    /// is set, the year exists but that exporter's row is missing.
    MissingBaseYearData {
        base_year: i32,
        exporter: Option<String>,
    },
    /// sigma = 1 exactly: the CES price-index exponent 1/(1-sigma) is
    /// undefined and the demand system collapses.
    DegenerateElasticity { sigma: f64 },
    /// A keyed input (scenario shock, supply cap, transport cost, sweep
    /// focus) names an exporter outside the registered set.
    UnknownExporter {
        exporter: String,
        context: &'static str,
    },
    /// Zero or negative quantity, price, or tariff feeding a power or
    /// division.
    NonPositiveInput {
        exporter: String,
        field: &'static str,
        value: f64,
    },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::MissingBaseYearData {
                base_year,
                exporter: Some(exporter),
            } => {
                write!(
                    f,
                    "no observation for exporter '{}' in base year {}",
                    exporter, base_year
                )
            }
            ModelError::MissingBaseYearData {
                base_year,
                exporter: None,
            } => {
                write!(f, "no observations for base year {}", base_year)
            }
            ModelError::DegenerateElasticity { sigma } => {
                write!(
                    f,
                    "substitution elasticity sigma = {} is degenerate (sigma must be > 1)",
                    sigma
                )
            }
            ModelError::UnknownExporter { exporter, context } => {
                write!(
                    f,
                    "unknown exporter '{}' in {} (not in the registered exporter set)",
                    exporter, context
                )
            }
            ModelError::NonPositiveInput {
                exporter,
                field,
                value,
            } => {
                write!(
                    f,
                    "invalid {} = {} for exporter '{}' (must be positive)",
                    field, value, exporter
                )
            }
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_exporter_and_field() {
        let err = ModelError::NonPositiveInput {
            exporter: "Brazil".to_string(),
            field: "quantity_tons",
            value: 0.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Brazil"));
        assert!(msg.contains("quantity_tons"));
    }

    #[test]
    fn display_missing_base_year_variants() {
        let whole_year = ModelError::MissingBaseYearData {
            base_year: 2024,
            exporter: None,
        };
        assert!(whole_year.to_string().contains("2024"));

        let one_exporter = ModelError::MissingBaseYearData {
            base_year: 2024,
            exporter: Some("Argentina".to_string()),
        };
        assert!(one_exporter.to_string().contains("Argentina"));
    }
}
