//! Smith-Wilson kernel, calibration and extrapolation
//!
//! Formulas follow the EIOPA technical documentation for the risk-free rate
//! term structure: the Heart of the Wilson function (paragraph 132), the
//! calibration vector (paragraphs 138-149), the pricing function for target
//! maturities (paragraph 147) and the convergence gap used to pick alpha
//! (paragraphs 155-158). Observations are zero-coupon bonds with unit
//! notional, so the cash-flow matrix is the identity throughout.

use nalgebra::{DMatrix, DVector};

use crate::error::{AlmError, Result};
use crate::solvers::{bisection, SolverConfig};

/// Years added to the last liquid maturity to obtain the convergence point
pub const CONVERGENCE_OFFSET: f64 = 40.0;

/// Earliest convergence point in years
pub const MIN_CONVERGENCE_POINT: f64 = 60.0;

/// Heart of the Wilson function for maturities `u` (rows) and `v` (columns).
///
/// `H[i,j] = 0.5 * (a(u_i+v_j) + e^{-a(u_i+v_j)} - a|u_i-v_j| - e^{-a|u_i-v_j|})`
///
/// `alpha` must be positive; callers are responsible for that.
pub fn wilson_heart(u: &[f64], v: &[f64], alpha: f64) -> DMatrix<f64> {
    DMatrix::from_fn(u.len(), v.len(), |i, j| {
        let sum = u[i] + v[j];
        let diff = (u[i] - v[j]).abs();
        0.5 * (alpha * sum + (-alpha * sum).exp() - alpha * diff - (-alpha * diff).exp())
    })
}

/// UFR discount factor `e^{-ln(1+ufr) t}`
#[inline]
fn ufr_discount(ufr: f64, t: f64) -> f64 {
    (-(1.0 + ufr).ln() * t).exp()
}

/// Calculate the Smith-Wilson calibration vector `b` for observed zero rates.
///
/// Rates are converted to zero-coupon prices `p = (1+r)^-M` and the system
/// `(Q'HQ) b = p - q` is solved with `Q = diag(d)`, `q = d`,
/// `d = e^{-ln(1+ufr) M}`.
///
/// Duplicate maturities make the system singular and are reported as
/// [`AlmError::SingularMatrix`], as is any non-finite solution.
pub fn sw_calibrate(rates: &[f64], maturities: &[f64], ufr: f64, alpha: f64) -> Result<DVector<f64>> {
    if rates.len() != maturities.len() {
        return Err(AlmError::validation(
            "rates",
            format!("{} rates for {} maturities", rates.len(), maturities.len()),
        ));
    }
    let n = maturities.len();
    if n == 0 {
        return Err(AlmError::InsufficientData { required: 1, actual: 0 });
    }
    for (i, m) in maturities.iter().enumerate() {
        if maturities[i + 1..].iter().any(|other| other == m) {
            return Err(AlmError::SingularMatrix);
        }
    }

    let d = DVector::from_iterator(n, maturities.iter().map(|&m| ufr_discount(ufr, m)));
    let p = DVector::from_iterator(
        n,
        rates.iter().zip(maturities).map(|(&r, &m)| (1.0 + r).powf(-m)),
    );

    let q_mat = DMatrix::from_diagonal(&d);
    let heart = wilson_heart(maturities, maturities, alpha);
    let system = q_mat.transpose() * heart * &q_mat;

    let b = system.lu().solve(&(p - &d)).ok_or(AlmError::SingularMatrix)?;
    if b.iter().any(|x| !x.is_finite()) {
        return Err(AlmError::SingularMatrix);
    }
    Ok(b)
}

/// Interpolate/extrapolate annual zero rates at `targets` from a calibration vector.
///
/// `p(t) = e^{-ln(1+ufr)t} + e^{-ln(1+ufr)t} * H(t, M_obs) Q b`, then
/// `r(t) = p(t)^{-1/t} - 1`. A target maturity of zero (or below) has no
/// annualised rate and is rejected.
pub fn sw_extrapolate(
    targets: &[f64],
    observed: &[f64],
    b: &DVector<f64>,
    ufr: f64,
    alpha: f64,
) -> Result<Vec<f64>> {
    if b.len() != observed.len() {
        return Err(AlmError::validation(
            "calibration_vector",
            format!("{} weights for {} observed maturities", b.len(), observed.len()),
        ));
    }
    if let Some(t) = targets.iter().find(|&&t| !(t > 0.0)) {
        return Err(AlmError::validation(
            "target_maturity",
            format!("{} is not positive", t),
        ));
    }

    let qb = DVector::from_iterator(
        observed.len(),
        observed.iter().zip(b.iter()).map(|(&m, &w)| ufr_discount(ufr, m) * w),
    );
    let hqb = wilson_heart(targets, observed, alpha) * qb;

    Ok(targets
        .iter()
        .zip(hqb.iter())
        .map(|(&t, &h)| {
            let dt = ufr_discount(ufr, t);
            let price = dt + dt * h;
            price.powf(-1.0 / t) - 1.0
        })
        .collect())
}

/// Convergence point `T = max(max(M) + 40, 60)`
pub fn convergence_point(maturities: &[f64]) -> f64 {
    let last_liquid = maturities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (last_liquid + CONVERGENCE_OFFSET).max(MIN_CONVERGENCE_POINT)
}

/// Gap between the tolerance `tau` and the distance of the extrapolated
/// forward intensity from the UFR at the convergence point.
///
/// Negative values mean the curve has converged tighter than `tau`.
pub fn galfa(maturities: &[f64], rates: &[f64], ufr: f64, alpha: f64, tau: f64) -> Result<f64> {
    let b = sw_calibrate(rates, maturities, ufr, alpha)?;
    let t = convergence_point(maturities);

    let qb: Vec<f64> = maturities
        .iter()
        .zip(b.iter())
        .map(|(&m, &w)| ufr_discount(ufr, m) * w)
        .collect();

    let numerator = 1.0 + alpha * maturities.iter().zip(&qb).map(|(m, q)| m * q).sum::<f64>();
    let denominator: f64 = maturities.iter().zip(&qb).map(|(m, q)| (alpha * m).sinh() * q).sum();
    let kappa = numerator / denominator;

    Ok(alpha / (1.0 - kappa * (alpha * t).exp()).abs() - tau)
}

/// Find the convergence-speed parameter alpha with `galfa(alpha) = 0` by bisection.
pub fn calibrate_alpha(
    maturities: &[f64],
    rates: &[f64],
    ufr: f64,
    tau: f64,
    bracket: (f64, f64),
    config: &SolverConfig,
) -> Result<f64> {
    let result = bisection(
        |alpha| galfa(maturities, rates, ufr, alpha, tau),
        bracket.0,
        bracket.1,
        config,
    )?;
    Ok(result.root)
}
