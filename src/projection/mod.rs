//! Period-by-period projection of the asset portfolio

mod cashflows;
mod engine;
mod matrix;
mod state;

pub use cashflows::{PeriodSummary, ProjectionResult, ProjectionSummary};
pub use engine::{
    trade, ExpiredCash, PortfolioInputs, PricingContext, ProjectionConfig, ProjectionEngine, ProjectionFlows, Trade,
    TradeOutcome,
};
pub use matrix::CashFlowMatrix;
pub use state::{AssetClass, HoldingSeries, PortfolioState};
