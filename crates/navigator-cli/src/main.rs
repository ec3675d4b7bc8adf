use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use navigator_cli::output::OutputFormat;
use navigator_lib::{EngineConfig, IntensityFormula, ShipTypePolicy, VoyageFeatures};

mod commands;

use commands::evaluate::{handle_evaluate, EvaluateArgs};
use commands::pool::{handle_pool, PoolArgs};
use commands::report::{handle_report, ReportArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Strategic Navigator fleet compliance tools")]
struct Cli {
    /// Intensity formula; overrides NAVIGATOR_INTENSITY_FORMULA.
    #[arg(long, value_enum, global = true)]
    formula: Option<FormulaArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormulaArg {
    /// gCO2 per MJ of fuel energy.
    Energy,
    /// CO2 per unit of distance.
    Distance,
}

impl From<FormulaArg> for IntensityFormula {
    fn from(arg: FormulaArg) -> Self {
        match arg {
            FormulaArg::Energy => IntensityFormula::EnergyNormalized,
            FormulaArg::Distance => IntensityFormula::DistanceNormalized,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a voyage log, derive the fleet target, and classify every vessel.
    Report {
        /// CSV file of historical voyages.
        #[arg(long)]
        voyages: PathBuf,
        /// Directory to write target.json and compliance_data.csv into.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Reduction below the fleet average, e.g. 0.05 for 5%.
        #[arg(long)]
        margin: Option<f64>,
        /// Exclude vessels whose voyages disagree on ship type.
        #[arg(long)]
        strict_ship_type: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Predict CO2 for one voyage and classify it against the target.
    Evaluate {
        #[arg(long)]
        ship_type: String,
        #[arg(long)]
        distance: f64,
        /// Fuel mass in kg.
        #[arg(long)]
        fuel_consumption: f64,
        #[arg(long)]
        fuel_type: String,
        /// target.json written by a previous `report --out-dir`.
        #[arg(long)]
        target_file: Option<PathBuf>,
        /// Explicit target value.
        #[arg(long, conflicts_with = "target_file")]
        target: Option<f64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Combine the compliance balances of vessels in a saved fleet report.
    Pool {
        /// Directory written by `report --out-dir`.
        #[arg(long)]
        artifact_dir: PathBuf,
        /// Vessels to pool, e.g. one deficit and one surplus vessel.
        #[arg(required = true, num_args = 2..)]
        ship_ids: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env().context("invalid NAVIGATOR_* configuration")?;
    if let Some(formula) = cli.formula {
        config.formula = formula.into();
    }

    match cli.command {
        Command::Report {
            voyages,
            out_dir,
            margin,
            strict_ship_type,
            format,
        } => {
            if let Some(margin) = margin {
                config.margin = margin;
            }
            if strict_ship_type {
                config.ship_type_policy = ShipTypePolicy::Strict;
            }
            config.validate().context("invalid report options")?;
            handle_report(
                &ReportArgs {
                    voyages,
                    out_dir,
                    format,
                },
                &config,
            )
        }
        Command::Evaluate {
            ship_type,
            distance,
            fuel_consumption,
            fuel_type,
            target_file,
            target,
            format,
        } => handle_evaluate(
            &EvaluateArgs {
                features: VoyageFeatures::new(ship_type, distance, fuel_consumption, fuel_type),
                target_file,
                target,
                format,
            },
            &config,
        ),
        Command::Pool {
            artifact_dir,
            ship_ids,
            format,
        } => handle_pool(&PoolArgs {
            artifact_dir,
            ship_ids,
            format,
        }),
    }
}

/// Logs go to stderr so `--format json` output stays parseable.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
