//! Report the calibrated risk-free curves of a run as JSON
//!
//! Loads the settings and the EIOPA curve, projects and calibrates every
//! projection year, and prints alpha and extrapolated spot rates per year.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use alm_system::run::build_curves;
use alm_system::settings::load_settings;
use alm_system::{ProjectionConfig, Tracer};

#[derive(Parser, Debug)]
#[command(name = "curve_report")]
#[command(version, about = "Print projected Smith-Wilson curves as JSON", long_about = None)]
struct Args {
    /// Settings file
    #[arg(short, long, default_value = "input/Parameters.csv")]
    parameters: PathBuf,

    /// Longest maturity reported, in whole years
    #[arg(short, long, default_value = "60")]
    max_maturity: u32,

    /// Emit a debug record for every traced step
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Serialize)]
struct YearReport {
    year: usize,
    alpha: f64,
    observed_points: usize,
    last_observed_maturity: f64,
    maturities: Vec<f64>,
    rates: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct CurveReport {
    country: String,
    modelling_date: String,
    ufr: f64,
    years: Vec<YearReport>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = load_settings(&args.parameters)
        .with_context(|| format!("failed to load settings from {}", args.parameters.display()))?;
    let curves = build_curves(&settings, &ProjectionConfig::default(), Tracer::new(args.trace))
        .context("curve calibration failed")?;

    let maturities: Vec<f64> = (1..=args.max_maturity).map(f64::from).collect();
    let years = (0..curves.calibrated_years())
        .map(|year| -> alm_system::Result<YearReport> {
            let calibrated = curves.calibrated(year)?;
            Ok(YearReport {
                year,
                alpha: calibrated.alpha(),
                observed_points: calibrated.term_structure().len(),
                last_observed_maturity: calibrated.term_structure().last_maturity(),
                maturities: maturities.clone(),
                rates: calibrated.rates(&maturities, curves.ufr)?,
            })
        })
        .collect::<alm_system::Result<Vec<_>>>()?;

    let report = CurveReport {
        country: curves.country.clone(),
        modelling_date: curves.initial_date.to_string(),
        ufr: curves.ufr,
        years,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
