//! One-year forward ratios and rolled-forward spot curves
//!
//! A single observed spot curve is turned into a family of curves, one per
//! future anniversary. Year `y` keeps the maturities beyond `y`, shifted down
//! by `y`, with yields obtained by compounding the forward ratios from `y`
//! onwards.

use crate::curves::TermStructure;
use crate::error::{AlmError, Result};

/// Forward accumulation factors between consecutive observed maturities.
///
/// `fwd[0] = 1 + r[0]` and `fwd[i] = (1+r[i])^M[i] / (1+r[i-1])^M[i-1]`.
pub fn calc_fwd_rates(curve: &TermStructure) -> Vec<f64> {
    let growth: Vec<f64> = curve.iter().map(|(m, r)| (1.0 + r).powf(m)).collect();

    let mut fwd = Vec::with_capacity(growth.len());
    if let Some(&first) = curve.yields().first() {
        fwd.push(1.0 + first);
    }
    fwd.extend(growth.windows(2).map(|w| w[1] / w[0]));
    fwd
}

/// Spot curve seen from projection year `year`.
///
/// Maturities at or before `year` have run off and are dropped. Year 0 is
/// the observed curve itself.
pub fn project_year(curve: &TermStructure, fwd: &[f64], year: usize) -> Result<TermStructure> {
    if fwd.len() != curve.len() {
        return Err(AlmError::validation(
            "fwd_rates",
            format!("{} forward factors for {} maturities", fwd.len(), curve.len()),
        ));
    }
    if year == 0 {
        return Ok(curve.clone());
    }

    let shift = year as f64;
    let start = curve.maturities().iter().take_while(|&&m| m <= shift).count();
    if start == curve.len() {
        return Err(AlmError::InsufficientData { required: year + 1, actual: curve.len() });
    }

    let mut maturities = Vec::with_capacity(curve.len() - start);
    let mut yields = Vec::with_capacity(curve.len() - start);
    let mut accumulated = 1.0;
    for (i, &m) in curve.maturities().iter().enumerate().skip(start) {
        accumulated *= fwd[i];
        let residual = m - shift;
        maturities.push(residual);
        yields.push(accumulated.powf(1.0 / residual) - 1.0);
    }

    TermStructure::new(maturities, yields)
}

/// Spot curves for projection years `0..n_years`
pub fn project_forward_rates(curve: &TermStructure, fwd: &[f64], n_years: usize) -> Result<Vec<TermStructure>> {
    (0..n_years).map(|year| project_year(curve, fwd, year)).collect()
}
