//! Root-finding used for curve and instrument calibration
//!
//! A single bracketing bisection drives every calibration in the model:
//! the Smith-Wilson convergence speed (alpha), bond z-spreads and equity
//! implied growth rates.

mod bisection;

pub use bisection::bisection;

/// Tolerance and iteration budget for a bisection run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Tolerance on end-point residuals and on the bracket half-width
    pub precision: f64,

    /// Maximum number of midpoint evaluations
    pub max_iterations: u32,
}

impl SolverConfig {
    pub fn new(precision: f64, max_iterations: u32) -> Self {
        Self { precision, max_iterations }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            precision: 1e-10,
            max_iterations: 1000,
        }
    }
}

/// Outcome of a converged solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root found
    pub root: f64,

    /// Number of midpoint evaluations used (0 when an end point was already a root)
    pub iterations: u32,

    /// Objective value at the root
    pub residual: f64,
}
