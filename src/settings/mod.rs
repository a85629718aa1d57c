//! Run parameters of a projection

pub mod loader;

use std::path::PathBuf;

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::error::{AlmError, Result};

pub use loader::{load_eiopa_curve, load_settings, EiopaCurve};

/// Parameters of one model run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub eiopa_param_file: PathBuf,
    pub eiopa_curves_file: PathBuf,
    /// Country column of the EIOPA files, e.g. `SI`
    pub country: String,
    pub run_type: String,
    pub n_proj_years: u32,
    /// Bisection precision for curve calibration
    pub precision: f64,
    /// Convergence tolerance at the convergence point
    pub tau: f64,
    pub compounding: i32,
    pub modelling_date: NaiveDate,
    end_date: NaiveDate,
}

impl Settings {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eiopa_param_file: impl Into<PathBuf>,
        eiopa_curves_file: impl Into<PathBuf>,
        country: impl Into<String>,
        run_type: impl Into<String>,
        n_proj_years: u32,
        precision: f64,
        tau: f64,
        compounding: i32,
        modelling_date: NaiveDate,
    ) -> Result<Self> {
        if n_proj_years == 0 {
            return Err(AlmError::validation("n_proj_years", "must be greater than 0"));
        }
        if !(precision > 0.0) {
            return Err(AlmError::validation("precision", "must be positive"));
        }
        if !(tau > 0.0) {
            return Err(AlmError::validation("tau", "must be positive"));
        }
        let end_date = 12u32
            .checked_mul(n_proj_years)
            .and_then(|months| modelling_date.checked_add_months(Months::new(months)))
            .ok_or_else(|| AlmError::validation("n_proj_years", "projection window ends outside the calendar range"))?;

        Ok(Self {
            eiopa_param_file: eiopa_param_file.into(),
            eiopa_curves_file: eiopa_curves_file.into(),
            country: country.into(),
            run_type: run_type.into(),
            n_proj_years,
            precision,
            tau,
            compounding,
            modelling_date,
            end_date,
        })
    }

    /// Modelling date plus `n_proj_years` calendar years
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}
