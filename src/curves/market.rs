//! Risk-free curve lifecycle: observed curve, forward ratios, projected
//! spot curves and their Smith-Wilson calibrations
//!
//! Alpha and the calibration vector of a projection year are produced by a
//! single constructor ([`CalibratedCurve::calibrate`]) and stored together.
//! Replacing the observed curve discards every derived quantity.

use chrono::NaiveDate;
use log::info;
use nalgebra::DVector;
use rayon::prelude::*;

use crate::curves::{calc_fwd_rates, calibrate_alpha, project_forward_rates, sw_calibrate, sw_extrapolate, TermStructure};
use crate::error::{AlmError, Result};
use crate::solvers::SolverConfig;
use crate::trace::Tracer;

/// What [`Curves::retrieve_rates`] returns for each year fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    /// Annual spot rate plus spread
    Rate,
    /// Discount factor `(1 + r + spread)^-t`
    Discount,
}

/// Smith-Wilson calibration of one spot curve
#[derive(Debug, Clone)]
pub struct CalibratedCurve {
    term_structure: TermStructure,
    alpha: f64,
    b: DVector<f64>,
}

impl CalibratedCurve {
    /// Solve alpha for the curve and the matching calibration vector
    pub fn calibrate(
        term_structure: TermStructure,
        ufr: f64,
        tau: f64,
        bracket: (f64, f64),
        config: &SolverConfig,
    ) -> Result<Self> {
        let maturities = term_structure.maturities();
        let yields = term_structure.yields();
        let alpha = calibrate_alpha(maturities, yields, ufr, tau, bracket, config)?;
        let b = sw_calibrate(yields, maturities, ufr, alpha)?;
        Ok(Self { term_structure, alpha, b })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn calibration_vector(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn term_structure(&self) -> &TermStructure {
        &self.term_structure
    }

    /// Annual spot rates at the target maturities
    pub fn rates(&self, targets: &[f64], ufr: f64) -> Result<Vec<f64>> {
        sw_extrapolate(targets, self.term_structure.maturities(), &self.b, ufr, self.alpha)
    }
}

/// Risk-free term structure for one country and its projected future curves
#[derive(Debug, Clone)]
pub struct Curves {
    pub ufr: f64,
    pub precision: f64,
    pub tau: f64,
    pub initial_date: NaiveDate,
    pub country: String,
    observed: Option<TermStructure>,
    fwd_rates: Vec<f64>,
    projected: Vec<TermStructure>,
    calibrated: Vec<CalibratedCurve>,
}

impl Curves {
    pub fn new(ufr: f64, precision: f64, tau: f64, initial_date: NaiveDate, country: impl Into<String>) -> Result<Self> {
        if !(ufr > 0.0 && ufr.is_finite()) {
            return Err(AlmError::validation("ufr", format!("{} must be positive", ufr)));
        }
        if !(precision > 0.0) {
            return Err(AlmError::validation("precision", format!("{} must be positive", precision)));
        }
        if !(tau > 0.0) {
            return Err(AlmError::validation("tau", format!("{} must be positive", tau)));
        }
        Ok(Self {
            ufr,
            precision,
            tau,
            initial_date,
            country: country.into(),
            observed: None,
            fwd_rates: Vec::new(),
            projected: Vec::new(),
            calibrated: Vec::new(),
        })
    }

    /// Attach the observed market curve, clearing everything derived from a previous one
    pub fn set_observed_term_structure(&mut self, observed: TermStructure) {
        self.observed = Some(observed);
        self.fwd_rates.clear();
        self.projected.clear();
        self.calibrated.clear();
    }

    pub fn observed(&self) -> Option<&TermStructure> {
        self.observed.as_ref()
    }

    fn require_observed(&self) -> Result<&TermStructure> {
        self.observed
            .as_ref()
            .ok_or(AlmError::InsufficientData { required: 1, actual: 0 })
    }

    /// Derive one-year forward factors from the observed curve
    pub fn calc_fwd_rates(&mut self) -> Result<&[f64]> {
        let fwd = calc_fwd_rates(self.require_observed()?);
        self.fwd_rates = fwd;
        self.projected.clear();
        self.calibrated.clear();
        Ok(&self.fwd_rates)
    }

    pub fn fwd_rates(&self) -> &[f64] {
        &self.fwd_rates
    }

    /// Roll the observed curve forward for projection years `0..n_years`
    pub fn project_forward_rates(&mut self, n_years: usize) -> Result<&[TermStructure]> {
        if self.fwd_rates.is_empty() {
            self.calc_fwd_rates()?;
        }
        let projected = project_forward_rates(self.require_observed()?, &self.fwd_rates, n_years)?;
        self.projected = projected;
        self.calibrated.clear();
        Ok(&self.projected)
    }

    pub fn projected(&self) -> &[TermStructure] {
        &self.projected
    }

    /// Calibrate alpha and the calibration vector of every projected year independently
    pub fn calibrate_projected(&mut self, bracket: (f64, f64), max_iterations: u32, tracer: Tracer) -> Result<()> {
        if self.projected.is_empty() {
            return Err(AlmError::InsufficientData { required: 1, actual: 0 });
        }
        let config = SolverConfig::new(self.precision, max_iterations);
        let (ufr, tau) = (self.ufr, self.tau);

        info!("Calibrating {} projected curves for {}", self.projected.len(), self.country);
        let calibrated: Result<Vec<CalibratedCurve>> = self
            .projected
            .par_iter()
            .enumerate()
            .map(|(year, curve)| -> Result<CalibratedCurve> {
                let calibrated = CalibratedCurve::calibrate(curve.clone(), ufr, tau, bracket, &config)?;
                tracer.step_with("calibrate_projected", || {
                    format!("year {} alpha {:.10}", year, calibrated.alpha())
                });
                Ok(calibrated)
            })
            .collect();

        self.calibrated = calibrated?;
        Ok(())
    }

    /// Number of calibrated projection years
    pub fn calibrated_years(&self) -> usize {
        self.calibrated.len()
    }

    pub fn calibrated(&self, year: usize) -> Result<&CalibratedCurve> {
        self.calibrated.get(year).ok_or(AlmError::MissingCurve { year })
    }

    /// Spread-adjusted rates or discount factors for the given year fractions
    /// on the curve of projection year `year`
    pub fn retrieve_rates(&self, year: usize, fractions: &[f64], kind: RateKind, spread: f64) -> Result<Vec<f64>> {
        let rates = self.calibrated(year)?.rates(fractions, self.ufr)?;
        Ok(match kind {
            RateKind::Rate => rates.into_iter().map(|r| r + spread).collect(),
            RateKind::Discount => rates
                .into_iter()
                .zip(fractions)
                .map(|(r, &t)| (1.0 + r + spread).powf(-t))
                .collect(),
        })
    }
}
