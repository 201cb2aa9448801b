// src/main.rs
//
// CLI harness for the Armington import-demand model.
//
// Subcommands:
// - run:   calibrate to the base year, run one scenario, write results
// - sweep: sensitivity sweep over sigma or eta for a fixed scenario
//
// Usage:
//   armington run --data testdata/imports.csv \
//       --scenario scenarios/v1/us_tariff_hike.yaml \
//       --exporters US,Brazil,Argentina --base-year 2024
//   armington sweep --data testdata/imports.csv \
//       --scenario scenarios/v1/us_tariff_hike.yaml \
//       --exporters US,Brazil,Argentina --base-year 2024 \
//       --parameter sigma --values 2,3,4,5,6,8 --focus US

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use armington::output::{
    create_output_dir, print_results_table, print_sweep_table, write_results_csv, write_sweep_csv,
    write_vulnerability_report, RunSummary,
};
use armington::{
    calibrate, load_observations, run_sweep, simulate, ExporterSet, ScenarioSpec, SweepParameter,
    VulnerabilityReport,
};

#[derive(Debug, Parser)]
#[command(
    name = "armington",
    about = "CES import-demand calibration and tariff scenario simulator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calibrate and run a single scenario.
    Run(RunArgs),
    /// Sensitivity sweep over sigma or eta with a fixed scenario.
    Sweep(SweepArgs),
}

/// Inputs shared by both subcommands.
#[derive(Debug, Args)]
struct CommonArgs {
    /// Input table CSV (year,exporter,quantity_tons,value_usd,p_fob,tariff_china).
    #[arg(long)]
    data: PathBuf,

    /// Scenario YAML file.
    #[arg(long)]
    scenario: PathBuf,

    /// Registered exporter set, comma-separated, in output order.
    #[arg(long, value_delimiter = ',', required = true)]
    exporters: Vec<String>,

    /// Calibration base year.
    #[arg(long)]
    base_year: i32,

    /// Substitution elasticity sigma (> 1).
    #[arg(long, default_value_t = 3.0)]
    sigma: f64,

    /// Demand elasticity eta (> 0).
    #[arg(long, default_value_t = 0.5)]
    eta: f64,

    /// Per-exporter transport cost in currency/ton, as NAME=COST.
    /// Repeatable; unnamed exporters default to zero.
    #[arg(long = "transport", value_parser = parse_transport)]
    transport: Vec<(String, f64)>,

    /// Output directory root.
    #[arg(long, default_value = "runs")]
    output_dir: PathBuf,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ParameterArg {
    Sigma,
    Eta,
}

#[derive(Debug, Args)]
struct SweepArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Which elasticity to sweep.
    #[arg(long, value_enum)]
    parameter: ParameterArg,

    /// Sweep values, comma-separated, in run order.
    #[arg(long, value_delimiter = ',', required = true)]
    values: Vec<f64>,

    /// Exporter whose response each sweep row reports.
    #[arg(long)]
    focus: String,

    /// Optional second exporter whose counterfactual share each row
    /// carries alongside the focus metrics.
    #[arg(long)]
    competitor: Option<String>,
}

fn parse_transport(s: &str) -> Result<(String, f64), String> {
    let (name, cost) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COST, got '{s}'"))?;
    let cost: f64 = cost
        .parse()
        .map_err(|e| format!("bad transport cost in '{s}': {e}"))?;
    if cost < 0.0 {
        return Err(format!("transport cost must be >= 0, got {cost}"));
    }
    Ok((name.to_string(), cost))
}

fn transport_map(pairs: &[(String, f64)]) -> Option<BTreeMap<String, f64>> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.iter().cloned().collect())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Sweep(args) => cmd_sweep(args),
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let common = &args.common;
    let exporters = ExporterSet::new(common.exporters.iter().cloned());
    if exporters.is_empty() {
        bail!("exporter set is empty");
    }

    let scenario = ScenarioSpec::from_yaml_file(&common.scenario)
        .with_context(|| format!("loading scenario {}", common.scenario.display()))?;
    scenario.check_exporters(&exporters)?;

    let observations = load_observations(&common.data, &exporters)
        .with_context(|| format!("loading input table {}", common.data.display()))?;

    eprintln!(
        "scenario_id={} base_year={} sigma={} eta={} exporters={}",
        scenario.scenario_id,
        common.base_year,
        common.sigma,
        common.eta,
        exporters.len()
    );

    let transport = transport_map(&common.transport);
    let params = calibrate(
        &observations,
        &exporters,
        common.base_year,
        common.sigma,
        common.eta,
        transport.as_ref(),
    )
    .context("calibration failed")?;

    if common.verbose > 0 {
        eprintln!(
            "calibration P0={:.4} Q0={:.0} A={:.4}",
            params.base_price_index, params.base_quantity, params.demand_shifter
        );
        for e in &params.exporters {
            eprintln!(
                "  exporter={} alpha={:.6} cif0={:.2}",
                e.name,
                e.preference_weight,
                e.base_cif_price()
            );
        }
    }

    let outcomes = simulate(&params, &scenario).context("simulation failed")?;
    let vulnerability =
        VulnerabilityReport::from_outcomes(&scenario.scenario_id, &params, &outcomes);

    print_results_table(&outcomes, std::io::stdout().lock())?;
    println!();
    println!(
        "vul_q={:.4} vul_p={:.4}",
        vulnerability.quantity_loss_fraction, vulnerability.price_change_fraction
    );

    let out_dir = create_output_dir(&common.output_dir, &scenario.scenario_id)?;
    write_results_csv(out_dir.join("results.csv"), &outcomes)?;
    write_vulnerability_report(out_dir.join("vulnerability_report.txt"), &vulnerability)?;
    let summary = RunSummary::new(
        &scenario.scenario_id,
        scenario.scenario_version,
        &params,
        &outcomes,
        vulnerability,
    );
    summary.write_to_file(out_dir.join("run_summary.json"))?;

    eprintln!(
        "wrote results.csv, run_summary.json, vulnerability_report.txt to {}",
        out_dir.display()
    );
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> Result<()> {
    let common = &args.common;
    let exporters = ExporterSet::new(common.exporters.iter().cloned());
    if exporters.is_empty() {
        bail!("exporter set is empty");
    }

    let scenario = ScenarioSpec::from_yaml_file(&common.scenario)
        .with_context(|| format!("loading scenario {}", common.scenario.display()))?;
    let observations = load_observations(&common.data, &exporters)
        .with_context(|| format!("loading input table {}", common.data.display()))?;

    let parameter = match args.parameter {
        ParameterArg::Sigma => SweepParameter::Sigma,
        ParameterArg::Eta => SweepParameter::Eta,
    };

    eprintln!(
        "sweep parameter={} values={} scenario_id={} focus={}",
        parameter,
        args.values.len(),
        scenario.scenario_id,
        args.focus
    );

    let transport = transport_map(&common.transport);
    let rows = run_sweep(
        &observations,
        &exporters,
        common.base_year,
        parameter,
        &args.values,
        common.sigma,
        common.eta,
        transport.as_ref(),
        &scenario,
        &args.focus,
        args.competitor.as_deref(),
    )
    .context("sensitivity sweep failed")?;

    print_sweep_table(parameter, &rows, std::io::stdout().lock())?;

    let out_dir = create_output_dir(&common.output_dir, &scenario.scenario_id)?;
    let file_name = format!("sensitivity_{}.csv", parameter.as_str());
    write_sweep_csv(out_dir.join(&file_name), &rows)?;
    eprintln!("wrote {} to {}", file_name, out_dir.display());
    Ok(())
}
