//! ALM System CLI
//!
//! Command-line interface for running an asset/liability projection

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use alm_system::run::{run_model, InputFiles};
use alm_system::settings::load_settings;
use alm_system::{ProjectionConfig, Tracer};

/// Project an asset portfolio against its liability cash flows
#[derive(Parser, Debug)]
#[command(name = "alm_system")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the run inputs
    #[arg(short, long, default_value = "input")]
    input_dir: PathBuf,

    /// Settings file, relative to the input directory
    #[arg(long, default_value = "Parameters.csv")]
    parameters: PathBuf,

    #[arg(long, default_value = "Bond_Portfolio.csv")]
    bonds: PathBuf,

    #[arg(long, default_value = "Equity_Portfolio.csv")]
    equities: PathBuf,

    #[arg(long, default_value = "Cash_Portfolio.csv")]
    cash: PathBuf,

    /// Liability cash-flow files; may be repeated
    #[arg(long, default_value = "Liability_Cashflow.csv")]
    liabilities: Vec<PathBuf>,

    /// Skip the bond portfolio
    #[arg(long)]
    no_bonds: bool,

    /// Output CSV
    #[arg(short, long, default_value = "Results.csv")]
    output: PathBuf,

    /// Emit a debug record for every traced step
    #[arg(long)]
    trace: bool,

    /// Calibrate equity growth rates to market prices instead of using the input rates
    #[arg(long)]
    calibrate_growth: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings_path = args.input_dir.join(&args.parameters);
    info!("Importing run parameters from {}", settings_path.display());
    let settings = load_settings(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?;

    let files = InputFiles {
        bonds: (!args.no_bonds).then(|| args.input_dir.join(&args.bonds)),
        equities: Some(args.input_dir.join(&args.equities)),
        cash: args.input_dir.join(&args.cash),
        liabilities: args.liabilities.iter().map(|p| args.input_dir.join(p)).collect(),
    };
    let config = ProjectionConfig {
        calibrate_equity_growth: args.calibrate_growth,
        ..Default::default()
    };

    let result = run_model(&settings, &files, config, Tracer::new(args.trace)).context("projection run failed")?;

    result
        .write_csv_path(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let summary = result.summary();
    println!("ALM projection {} ({})", settings.country, settings.run_type);
    println!("  Periods:              {}", summary.periods);
    println!("  Dividends + coupons:  {:.2}", summary.total_dividend_cash_flow);
    println!("  Terminal flows:       {:.2}", summary.total_terminal_cash_flow);
    println!("  Liability flows:      {:.2}", summary.total_liability_cash_flow);
    println!("  Final cash:           {:.2}", summary.final_cash);
    println!("  Final market value:   {:.2}", summary.final_market_value);
    println!("Results written to {}", args.output.display());

    Ok(())
}
