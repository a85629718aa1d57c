//! Bisection root-finding algorithm

use super::{SolverConfig, SolverResult};
use crate::error::{AlmError, Result};

/// Find a root of `f` inside `[x_start, x_end]` by repeated halving.
///
/// The end points are checked first: if either already satisfies
/// `|f(x)| < precision` it is returned as is. Otherwise the bracket must
/// contain a sign change; a bracket whose end points share a sign is
/// rejected with [`AlmError::InvalidBracket`] instead of bisecting blindly.
///
/// Each iteration evaluates the midpoint. If `f(mid)` is exactly zero, or the
/// half-width of the bracket is below `precision`, the midpoint is returned.
/// Otherwise the end point whose value has the same sign as `f(mid)` is
/// replaced. Running out of iterations yields [`AlmError::DidNotConverge`].
///
/// A NaN or infinite objective value at any evaluated point stops the solve
/// with [`AlmError::NonFiniteObjective`].
///
/// The objective is fallible so that calibration errors raised while
/// evaluating it (for instance a singular Smith-Wilson system) propagate
/// unchanged.
pub fn bisection<F>(mut f: F, x_start: f64, x_end: f64, config: &SolverConfig) -> Result<SolverResult>
where
    F: FnMut(f64) -> Result<f64>,
{
    if !(x_start < x_end) {
        return Err(AlmError::validation(
            "bracket",
            format!("lower bound {} must be below upper bound {}", x_start, x_end),
        ));
    }
    if !(config.precision > 0.0) {
        return Err(AlmError::validation("precision", "must be positive"));
    }

    let mut lower = x_start;
    let mut upper = x_end;
    let mut eval = |x: f64| -> Result<f64> {
        let value = f(x)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AlmError::NonFiniteObjective { x, value })
        }
    };

    let y_start = eval(lower)?;
    if y_start.abs() < config.precision {
        return Ok(SolverResult { root: lower, iterations: 0, residual: y_start });
    }
    let y_end = eval(upper)?;
    if y_end.abs() < config.precision {
        return Ok(SolverResult { root: upper, iterations: 0, residual: y_end });
    }

    if y_start.signum() == y_end.signum() {
        return Err(AlmError::InvalidBracket { a: lower, b: upper, fa: y_start, fb: y_end });
    }

    for iteration in 1..=config.max_iterations {
        let mid = (lower + upper) / 2.0;
        let y_mid = eval(mid)?;

        if y_mid == 0.0 || (upper - lower) / 2.0 < config.precision {
            return Ok(SolverResult { root: mid, iterations: iteration, residual: y_mid });
        }

        // Same sign as the lower end: root lies in the upper half
        if y_mid.signum() == y_start.signum() {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    Err(AlmError::DidNotConverge {
        iterations: config.max_iterations,
        lower,
        upper,
    })
}
