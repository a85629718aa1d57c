//! Error types for curve calibration, solvers and the projection run

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AlmError>;

/// Errors raised by the ALM engine
#[derive(Error, Debug)]
pub enum AlmError {
    /// Malformed instrument, curve or settings parameter
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human readable description
        reason: String,
    },

    /// The Smith-Wilson system (Q'HQ) could not be inverted
    #[error("Singular matrix: Smith-Wilson calibration system cannot be solved")]
    SingularMatrix,

    /// Not enough points to perform the operation
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        required: usize,
        actual: usize,
    },

    /// Bisection bracket whose end points do not straddle a root
    #[error("Invalid bracket: f({a}) = {fa:.3e} and f({b}) = {fb:.3e} have the same sign")]
    InvalidBracket {
        a: f64,
        b: f64,
        fa: f64,
        fb: f64,
    },

    /// Objective evaluated to NaN or infinity during a solve
    #[error("Objective is not finite at x = {x}: {value}")]
    NonFiniteObjective {
        x: f64,
        value: f64,
    },

    /// Bisection exhausted its iteration budget
    #[error("Did not converge after {iterations} iterations (last bracket [{lower}, {upper}])")]
    DidNotConverge {
        iterations: u32,
        lower: f64,
        upper: f64,
    },

    /// Pricing requested for a projection year that has no calibrated curve
    #[error("No calibrated curve for projection year {year}")]
    MissingCurve {
        year: usize,
    },

    /// Spread or growth calibration failed for a specific asset
    #[error("Calibration failed for asset {asset_id}: {source}")]
    Calibration {
        asset_id: u32,
        #[source]
        source: Box<AlmError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Input file content that could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AlmError {
    /// Creates a validation error
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Wraps a solver failure with the asset that caused it
    pub fn calibration(asset_id: u32, source: AlmError) -> Self {
        Self::Calibration {
            asset_id,
            source: Box::new(source),
        }
    }

    /// True when the error (or the error it wraps) is a bisection non-convergence
    pub fn is_non_convergence(&self) -> bool {
        match self {
            AlmError::DidNotConverge { .. } => true,
            AlmError::Calibration { source, .. } => source.is_non_convergence(),
            _ => false,
        }
    }
}
