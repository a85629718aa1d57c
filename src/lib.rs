//! ALM System - asset/liability projection on Smith-Wilson risk-free curves
//!
//! This library provides:
//! - Smith-Wilson calibration and extrapolation of risk-free curves
//! - Forward-rate projection of the observed curve over the run horizon
//! - Bond and equity cash-flow schedules, pricing and spread calibration
//! - A period-stepped projection loop with proportional rebalancing

pub mod assets;
pub mod curves;
pub mod error;
pub mod projection;
pub mod run;
pub mod settings;
pub mod solvers;
pub mod trace;

// Re-export commonly used types
pub use assets::{Cash, CorpBond, CorpBondPortfolio, EquityShare, EquitySharePortfolio, Frequency, Liability};
pub use curves::{Curves, TermStructure};
pub use error::{AlmError, Result};
pub use projection::{PeriodSummary, ProjectionConfig, ProjectionEngine, ProjectionResult};
pub use settings::Settings;
pub use trace::Tracer;
