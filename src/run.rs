//! End-to-end model run: market curve, calibration, schedules and the projection loop

use std::path::{Path, PathBuf};

use log::info;

use crate::assets::loader::{load_bonds, load_cash, load_equities, load_liability};
use crate::assets::{CorpBondPortfolio, EquitySharePortfolio};
use crate::curves::Curves;
use crate::error::Result;
use crate::projection::{PortfolioInputs, ProjectionConfig, ProjectionEngine, ProjectionResult};
use crate::settings::{load_eiopa_curve, Settings};
use crate::trace::Tracer;

/// Instrument files of one run; absent asset files mean an empty portfolio
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    pub bonds: Option<PathBuf>,
    pub equities: Option<PathBuf>,
    pub cash: PathBuf,
    pub liabilities: Vec<PathBuf>,
}

impl InputFiles {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bonds: Some(dir.join("Bond_Portfolio.csv")),
            equities: Some(dir.join("Equity_Portfolio.csv")),
            cash: dir.join("Cash_Portfolio.csv"),
            liabilities: vec![dir.join("Liability_Cashflow.csv")],
        }
    }
}

/// Build the market curves of a run: import the EIOPA curve, project it
/// `n_proj_years + 1` years forward and calibrate every projected year
pub fn build_curves(settings: &Settings, config: &ProjectionConfig, tracer: Tracer) -> Result<Curves> {
    info!("Import risk free rate curve");
    let eiopa = load_eiopa_curve(&settings.eiopa_param_file, &settings.eiopa_curves_file, &settings.country)?;

    let mut curves = Curves::new(
        eiopa.ufr,
        settings.precision,
        settings.tau,
        settings.modelling_date,
        settings.country.clone(),
    )?;
    curves.set_observed_term_structure(eiopa.term_structure);

    tracer.step("calc_fwd_rates");
    info!("Calculate forward rates");
    curves.calc_fwd_rates()?;

    tracer.step("project_forward_rates");
    info!("Calculate projected spot rates");
    curves.project_forward_rates(settings.n_proj_years as usize + 1)?;

    info!("Calibrate projected curves");
    curves.calibrate_projected(config.alpha_bracket, config.alpha_max_iterations, tracer)?;
    Ok(curves)
}

/// Load the opening portfolio and liabilities
pub fn load_inputs(settings: &Settings, files: &InputFiles) -> Result<PortfolioInputs> {
    info!("Import asset and liability data");
    let bonds = match &files.bonds {
        Some(path) => load_bonds(path)?,
        None => CorpBondPortfolio::new(),
    };
    let equities = match &files.equities {
        Some(path) => load_equities(path)?,
        None => EquitySharePortfolio::new(),
    };
    let liabilities = files
        .liabilities
        .iter()
        .enumerate()
        .map(|(i, path)| load_liability(path, i as u32 + 1))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Loaded {} bonds, {} equities, {} liability series",
        bonds.len(),
        equities.len(),
        liabilities.len()
    );

    Ok(PortfolioInputs {
        modelling_date: settings.modelling_date,
        end_date: settings.end_date(),
        equities,
        bonds,
        cash: load_cash(&files.cash)?,
        liabilities,
    })
}

/// Run one projection on loaded inputs and calibrated curves
pub fn run_projection(
    inputs: &PortfolioInputs,
    curves: &Curves,
    config: ProjectionConfig,
    tracer: Tracer,
) -> Result<ProjectionResult> {
    let engine = ProjectionEngine::new(config, tracer)?;
    engine.project(inputs, curves)
}

/// Full model run from a settings file
pub fn run_model(
    settings: &Settings,
    files: &InputFiles,
    config: ProjectionConfig,
    tracer: Tracer,
) -> Result<ProjectionResult> {
    info!("Run type {} for {} from {}", settings.run_type, settings.country, settings.modelling_date);
    let curves = build_curves(settings, &config, tracer)?;
    let inputs = load_inputs(settings, files)?;
    run_projection(&inputs, &curves, config, tracer)
}
