//! Period-stepped projection of an asset portfolio against liability outflows
//!
//! Each period moves the portfolio from one date of interest to the next:
//! cash flows falling due are swept into the bank account, equities grow at
//! their growth rate, bonds are repriced on the curve of the period, and the
//! bank balance is then invested or raised by trading every holding in the
//! same proportion.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use log::{debug, info};

use super::cashflows::{PeriodSummary, ProjectionResult};
use super::matrix::CashFlowMatrix;
use super::state::{AssetClass, PortfolioState};
use crate::assets::schedule::{year_fraction, GROWTH_DAY_COUNT};
use crate::assets::{Cash, CorpBondPortfolio, DatedAmounts, EquitySharePortfolio, Liability};
use crate::curves::Curves;
use crate::error::{AlmError, Result};
use crate::solvers::SolverConfig;
use crate::trace::Tracer;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Calendar days between two dates of interest
    pub stride_days: i64,

    /// Bracket and iteration cap for the curve convergence parameter
    pub alpha_bracket: (f64, f64),
    pub alpha_max_iterations: u32,

    /// Bracket, precision and iteration cap for z-spread and implied growth
    pub spread_bracket: (f64, f64),
    pub spread_precision: f64,
    pub spread_max_iterations: u32,

    /// Replace input growth rates with rates implied by market prices
    pub calibrate_equity_growth: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            stride_days: 365,
            alpha_bracket: (0.05, 0.5),
            alpha_max_iterations: 1000,
            spread_bracket: (-0.2, 0.2),
            spread_precision: 1e-8,
            spread_max_iterations: 100_000,
            calibrate_equity_growth: false,
        }
    }
}

impl ProjectionConfig {
    pub fn spread_solver(&self) -> SolverConfig {
        SolverConfig::new(self.spread_precision, self.spread_max_iterations)
    }

    fn validate(&self) -> Result<()> {
        if self.stride_days <= 0 {
            return Err(AlmError::validation("stride_days", "must be positive"));
        }
        Ok(())
    }
}

/// Opening portfolio of a run
#[derive(Debug, Clone)]
pub struct PortfolioInputs {
    pub modelling_date: NaiveDate,
    pub end_date: NaiveDate,
    pub equities: EquitySharePortfolio,
    pub bonds: CorpBondPortfolio,
    pub cash: Cash,
    pub liabilities: Vec<Liability>,
}

/// Outstanding per-unit asset flows and liability outflows
#[derive(Debug, Clone, Default)]
pub struct ProjectionFlows {
    pub equity_dividends: CashFlowMatrix,
    pub equity_terminals: CashFlowMatrix,
    pub bond_coupons: CashFlowMatrix,
    pub bond_notionals: CashFlowMatrix,
    pub liabilities: CashFlowMatrix,
}

impl ProjectionFlows {
    pub fn build(
        equities: &EquitySharePortfolio,
        bonds: &CorpBondPortfolio,
        liabilities: &[Liability],
        modelling_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let liability_flows = liabilities
            .iter()
            .map(|l| (l.liability_id, l.cash_flows().clone()))
            .fold(BTreeMap::<u32, DatedAmounts>::new(), |mut acc, (id, flows)| {
                let entry = acc.entry(id).or_default();
                for (date, amount) in flows {
                    *entry.entry(date).or_insert(0.0) += amount;
                }
                acc
            });

        Self {
            equity_dividends: CashFlowMatrix::new(equities.create_dividend_flows(modelling_date, end_date)),
            equity_terminals: CashFlowMatrix::new(equities.create_terminal_flows(modelling_date, end_date)),
            bond_coupons: CashFlowMatrix::new(bonds.create_coupon_flows(modelling_date, end_date)),
            bond_notionals: CashFlowMatrix::new(bonds.create_maturity_flows(end_date)),
            liabilities: CashFlowMatrix::new(liability_flows),
        }
    }
}

/// Cash swept into the bank account in one period
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpiredCash {
    /// Dividends and coupons
    pub dividend: f64,
    /// Equity terminal values and bond notionals
    pub terminal: f64,
    /// Liability payments, as a positive amount
    pub liability: f64,
}

/// Direction and size of a rebalancing trade
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trade {
    None,
    /// Fraction of every holding sold
    Sell(f64),
    /// Fraction of every holding bought
    Buy(f64),
}

/// Result of [`trade`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeOutcome {
    pub trade: Trade,
    /// Change of the bank balance, equal to the change of market value with opposite sign
    pub cash_delta: f64,
}

/// Trade every holding in the same proportion to bring the bank balance to zero.
///
/// Nothing is traded when the portfolio has no positive value or the balance
/// is exactly zero. Sales are capped at the whole portfolio.
pub fn trade(state: &mut PortfolioState) -> TradeOutcome {
    let total_market_value = state.total_market_value();
    let bank = state.bank_account;

    let trade = if total_market_value <= 0.0 {
        Trade::None
    } else if bank < 0.0 {
        let fraction = (-bank / total_market_value).min(1.0);
        state.scale_units(1.0 - fraction);
        Trade::Sell(fraction)
    } else if bank > 0.0 {
        let fraction = bank / total_market_value;
        state.scale_units(1.0 + fraction);
        Trade::Buy(fraction)
    } else {
        Trade::None
    };

    let cash_delta = match trade {
        Trade::None => 0.0,
        _ => total_market_value - state.total_market_value(),
    };
    state.bank_account += cash_delta;
    TradeOutcome { trade, cash_delta }
}

/// Market data fixed for the whole run
#[derive(Debug, Clone)]
pub struct PricingContext<'a> {
    pub curves: &'a Curves,
    pub bonds: &'a CorpBondPortfolio,
    /// Annual growth rate per equity
    pub growth_rates: BTreeMap<u32, f64>,
    /// Z-spread per bond
    pub zspreads: BTreeMap<u32, f64>,
}

/// Main projection engine
pub struct ProjectionEngine {
    config: ProjectionConfig,
    tracer: Tracer,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig, tracer: Tracer) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tracer })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Dates `modelling_date + k * stride` for `k >= 1` up to and including `end_date`
    pub fn dates_of_interest(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDate> {
        let stride = Duration::days(self.config.stride_days);
        std::iter::successors(modelling_date.checked_add_signed(stride), |d| d.checked_add_signed(stride))
            .take_while(|d| *d <= end_date)
            .collect()
    }

    /// Opening state: bank balance and every holding at its market price
    pub fn initial_state(
        &self,
        modelling_date: NaiveDate,
        cash: &Cash,
        equities: &EquitySharePortfolio,
        bonds: &CorpBondPortfolio,
    ) -> PortfolioState {
        let state = equities.iter().fold(PortfolioState::new(modelling_date, cash.bank_account), |s, e| {
            s.with_holding(AssetClass::Equity, e.asset_id, e.units, e.market_price)
        });
        bonds.iter().fold(state, |s, b| {
            s.with_holding(AssetClass::Bond, b.asset_id, b.units, b.market_price)
        })
    }

    /// Sweep every flow due on or before `date` into the bank account,
    /// weighting asset flows by the units currently held
    pub fn expire_cash_flows(&self, state: &mut PortfolioState, flows: &mut ProjectionFlows, date: NaiveDate) -> ExpiredCash {
        let equity_units = state.units(AssetClass::Equity);
        let bond_units = state.units(AssetClass::Bond);

        let expired = ExpiredCash {
            dividend: flows.equity_dividends.expire_weighted(date, &equity_units)
                + flows.bond_coupons.expire_weighted(date, &bond_units),
            terminal: flows.equity_terminals.expire_weighted(date, &equity_units)
                + flows.bond_notionals.expire_weighted(date, &bond_units),
            liability: flows.liabilities.expire(date),
        };
        state.bank_account += expired.dividend + expired.terminal - expired.liability;

        self.tracer.step_with("expire_cash_flows", || format!("{} {:?}", date, expired));
        expired
    }

    /// Grow equity prices over the period and reprice bonds on the curve of `period`
    pub fn revalue(
        &self,
        state: &mut PortfolioState,
        flows: &ProjectionFlows,
        previous_date: NaiveDate,
        period: usize,
        context: &PricingContext<'_>,
    ) -> Result<()> {
        let date = state.current_date();
        let time_frac = year_fraction(previous_date, date, GROWTH_DAY_COUNT);

        let grown: Vec<(u32, f64)> = state
            .holdings(AssetClass::Equity)
            .iter()
            .map(|(&id, holding)| {
                let growth = context.growth_rates.get(&id).copied().unwrap_or(0.0);
                (id, holding.price() * (1.0 + growth).powf(time_frac))
            })
            .collect();
        for (id, price) in grown {
            state.set_price(AssetClass::Equity, id, price);
        }

        if !context.bonds.is_empty() {
            let prices = context.bonds.price_bond_portfolio(
                flows.bond_coupons.flows(),
                flows.bond_notionals.flows(),
                date,
                period,
                context.curves,
                &context.zspreads,
            )?;
            for (id, price) in prices {
                state.set_price(AssetClass::Bond, id, price);
            }
        }

        self.tracer.step_with("revalue", || format!("{} period {}", date, period));
        Ok(())
    }

    /// Advance the portfolio by one period ending on `date`
    pub fn step(
        &self,
        state: &mut PortfolioState,
        flows: &mut ProjectionFlows,
        date: NaiveDate,
        period: usize,
        context: &PricingContext<'_>,
    ) -> Result<PeriodSummary> {
        let previous_date = state.current_date();
        let start_cash = state.bank_account;
        let start_market_value = state.total_market_value();

        state.advance(date);
        let expired = self.expire_cash_flows(state, flows, date);
        self.revalue(state, flows, previous_date, period, context)?;

        let after_growth = state.total_market_value();
        let portfolio_return = (start_market_value != 0.0).then(|| after_growth / start_market_value - 1.0);

        let outcome = trade(state);
        debug!("{}: {:?}, bank {:.2}", date, outcome.trade, state.bank_account);

        Ok(PeriodSummary {
            date,
            start_cash: Some(start_cash),
            end_cash: state.bank_account,
            start_market_value: Some(start_market_value),
            after_growth_market_value: Some(after_growth),
            end_market_value: state.total_market_value(),
            portfolio_return,
            dividend_cash_flow: Some(expired.dividend),
            terminal_cash_flow: Some(expired.terminal),
            liability_cash_flow: Some(-expired.liability),
        })
    }

    /// Calibrate growth rates and spreads at the modelling date, then step
    /// through every date of interest
    pub fn project(&self, inputs: &PortfolioInputs, curves: &Curves) -> Result<ProjectionResult> {
        let (modelling_date, end_date) = (inputs.modelling_date, inputs.end_date);
        let bracket = self.config.spread_bracket;
        let solver = self.config.spread_solver();

        let mut equities = inputs.equities.clone();
        if self.config.calibrate_equity_growth && !equities.is_empty() {
            info!("Calibrate equity growth rates");
            let rates = equities.calibrate_growth_rates(modelling_date, end_date, 0, curves, bracket, &solver, self.tracer)?;
            equities.apply_growth_rates(&rates);
        }

        let zspreads = if inputs.bonds.is_empty() {
            BTreeMap::new()
        } else {
            info!("Calibrate bond z-spreads");
            inputs
                .bonds
                .calibrate_zspreads(modelling_date, end_date, 0, curves, bracket, &solver, self.tracer)?
        };

        info!("Create cash flow profiles");
        let mut flows = ProjectionFlows::build(&equities, &inputs.bonds, &inputs.liabilities, modelling_date, end_date);
        let context = PricingContext {
            curves,
            bonds: &inputs.bonds,
            growth_rates: equities.iter().map(|e| (e.asset_id, e.growth_rate)).collect(),
            zspreads,
        };

        let mut state = self.initial_state(modelling_date, &inputs.cash, &equities, &inputs.bonds);
        let mut result = ProjectionResult::new();
        result.add_row(PeriodSummary::opening(modelling_date, state.bank_account, state.total_market_value()));

        let dates = self.dates_of_interest(modelling_date, end_date);
        info!("Start main loop over {} periods", dates.len());
        for (k, date) in dates.into_iter().enumerate() {
            self.tracer.step_with("step", || date.to_string());
            let row = self.step(&mut state, &mut flows, date, k + 1, &context)?;
            result.add_row(row);
        }
        info!("Main loop finished");

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::{date, sample_bond, sample_equity};
    use crate::curves::test_support::sample_curves;
    use approx::assert_abs_diff_eq;

    fn engine() -> ProjectionEngine {
        ProjectionEngine::new(ProjectionConfig::default(), Tracer::disabled()).unwrap()
    }

    fn inputs(liabilities: Vec<Liability>) -> PortfolioInputs {
        let mut equities = EquitySharePortfolio::new();
        equities.add(sample_equity()).unwrap();
        let mut bonds = CorpBondPortfolio::new();
        bonds.add(sample_bond()).unwrap();
        PortfolioInputs {
            modelling_date: date(2023, 7, 24),
            end_date: date(2026, 7, 24),
            equities,
            bonds,
            cash: Cash::new(1, 100.0).unwrap(),
            liabilities,
        }
    }

    #[test]
    fn test_dates_of_interest_use_fixed_stride() {
        let dates = engine().dates_of_interest(date(2023, 7, 24), date(2026, 7, 24));
        assert_eq!(dates, vec![date(2024, 7, 23), date(2025, 7, 23), date(2026, 7, 23)]);

        let none = engine().dates_of_interest(date(2023, 7, 24), date(2024, 1, 1));
        assert!(none.is_empty());
    }

    #[test]
    fn test_cash_conservation_on_expiry() {
        let d = date(2024, 3, 1);
        let mut state = PortfolioState::new(date(2023, 7, 24), 100.0).with_holding(AssetClass::Equity, 1, 1.0, 50.0);
        let mut flows = ProjectionFlows {
            equity_dividends: CashFlowMatrix::new(BTreeMap::from([(1, DatedAmounts::from([(d, 10.0)]))])),
            ..Default::default()
        };

        state.advance(date(2024, 7, 23));
        let expired = engine().expire_cash_flows(&mut state, &mut flows, date(2024, 7, 23));

        assert_eq!(expired.dividend, 10.0);
        assert_eq!(state.bank_account, 110.0);
        assert!(!flows.equity_dividends.contains_date(d));
    }

    #[test]
    fn test_expiry_weighted_by_current_units() {
        let d = date(2024, 3, 1);
        let mut state = PortfolioState::new(date(2023, 7, 24), 0.0).with_holding(AssetClass::Equity, 1, 4.0, 50.0);
        let mut flows = ProjectionFlows {
            equity_dividends: CashFlowMatrix::new(BTreeMap::from([(1, DatedAmounts::from([(d, 2.5)]))])),
            liabilities: CashFlowMatrix::single(1, DatedAmounts::from([(d, 3.0)])),
            ..Default::default()
        };
        state.advance(date(2024, 7, 23));
        state.scale_units(2.0);

        let expired = engine().expire_cash_flows(&mut state, &mut flows, date(2024, 7, 23));
        assert_eq!(expired.dividend, 20.0);
        assert_eq!(expired.liability, 3.0);
        assert_eq!(state.bank_account, 17.0);
    }

    #[test]
    fn test_sell_trade_is_cash_neutral() {
        let mut state = PortfolioState::new(date(2023, 7, 24), -50.0)
            .with_holding(AssetClass::Equity, 1, 10.0, 10.0)
            .with_holding(AssetClass::Bond, 2, 1.0, 100.0);
        let bank_before = state.bank_account;
        let value_before = state.total_market_value();

        let outcome = trade(&mut state);
        assert_eq!(outcome.trade, Trade::Sell(0.25));
        assert_abs_diff_eq!(state.bank_account, bank_before + (value_before - state.total_market_value()), epsilon = 1e-12);
        assert_abs_diff_eq!(state.bank_account, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.total_market_value(), 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_buy_trade_is_cash_neutral() {
        let mut state = PortfolioState::new(date(2023, 7, 24), 50.0)
            .with_holding(AssetClass::Equity, 1, 10.0, 10.0)
            .with_holding(AssetClass::Bond, 2, 1.0, 100.0);
        let value_before = state.total_market_value();

        let outcome = trade(&mut state);
        assert_eq!(outcome.trade, Trade::Buy(0.25));
        assert_abs_diff_eq!(outcome.cash_delta, value_before - state.total_market_value(), epsilon = 1e-12);
        assert_abs_diff_eq!(state.bank_account, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.units(AssetClass::Equity)[&1], 12.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sale_capped_at_whole_portfolio() {
        let mut state = PortfolioState::new(date(2023, 7, 24), -500.0).with_holding(AssetClass::Equity, 1, 10.0, 20.0);
        let outcome = trade(&mut state);
        assert_eq!(outcome.trade, Trade::Sell(1.0));
        assert_eq!(state.total_market_value(), 0.0);
        assert_abs_diff_eq!(state.bank_account, -300.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_trade_without_positive_value_or_imbalance() {
        let mut empty = PortfolioState::new(date(2023, 7, 24), -10.0);
        assert_eq!(trade(&mut empty).trade, Trade::None);
        assert_eq!(empty.bank_account, -10.0);

        let mut balanced = PortfolioState::new(date(2023, 7, 24), 0.0).with_holding(AssetClass::Equity, 1, 1.0, 1.0);
        assert_eq!(trade(&mut balanced), TradeOutcome { trade: Trade::None, cash_delta: 0.0 });
    }

    #[test]
    fn test_projection_end_to_end() {
        let curves = sample_curves(4);
        let liability = Liability::new(1, &[date(2024, 12, 31)], &[200.0]).unwrap();
        let result = engine().project(&inputs(vec![liability]), &curves).unwrap();

        assert_eq!(result.rows.len(), 4);
        let opening = &result.rows[0];
        assert_eq!(opening.end_cash, 100.0);
        assert_abs_diff_eq!(opening.end_market_value, 50.0 * 20.0 + 10.0 * 95.0, epsilon = 1e-9);

        for pair in result.rows.windows(2) {
            let (prev, row) = (&pair[0], &pair[1]);
            assert_eq!(row.start_cash, Some(prev.end_cash));
            assert_abs_diff_eq!(row.start_market_value.unwrap(), prev.end_market_value, epsilon = 1e-9);

            // Cash moves only through expired flows and trades
            let inflow = row.dividend_cash_flow.unwrap() + row.terminal_cash_flow.unwrap() + row.liability_cash_flow.unwrap();
            let traded = row.after_growth_market_value.unwrap() - row.end_market_value;
            assert_abs_diff_eq!(row.end_cash, row.start_cash.unwrap() + inflow + traded, epsilon = 1e-8);
            assert_abs_diff_eq!(row.end_cash, 0.0, epsilon = 1e-8);
        }

        assert_eq!(result.rows[1].liability_cash_flow, Some(0.0));
        assert_abs_diff_eq!(result.rows[2].liability_cash_flow.unwrap(), -200.0, epsilon = 1e-12);
        // Dividends and coupons arrive every year
        assert!(result.rows[1..].iter().all(|r| r.dividend_cash_flow.unwrap() > 0.0));
        // Terminal flows fall on the window end, after the last date of interest
        assert!(result.rows[1..].iter().all(|r| r.terminal_cash_flow == Some(0.0)));
    }

    #[test]
    fn test_missing_curve_aborts_run() {
        let curves = sample_curves(1);
        let result = engine().project(&inputs(Vec::new()), &curves);
        assert!(matches!(result, Err(AlmError::MissingCurve { year: 1 })));
    }

    #[test]
    fn test_spread_non_convergence_aborts_run() {
        let curves = sample_curves(4);
        let config = ProjectionConfig { spread_max_iterations: 1, ..Default::default() };
        let engine = ProjectionEngine::new(config, Tracer::disabled()).unwrap();

        let err = engine.project(&inputs(Vec::new()), &curves).unwrap_err();
        assert!(err.is_non_convergence());
        assert!(matches!(err, AlmError::Calibration { asset_id: 1, .. }));
    }

    #[test]
    fn test_growth_non_convergence_aborts_run() {
        let curves = sample_curves(4);
        let config = ProjectionConfig {
            spread_max_iterations: 1,
            calibrate_equity_growth: true,
            ..Default::default()
        };
        let engine = ProjectionEngine::new(config, Tracer::disabled()).unwrap();

        let err = engine.project(&inputs(Vec::new()), &curves).unwrap_err();
        assert!(matches!(err, AlmError::Calibration { asset_id: 11, .. }));
        assert!(err.is_non_convergence());
    }

    #[test]
    fn test_calibrated_growth_is_used() {
        let curves = sample_curves(4);
        let config = ProjectionConfig { calibrate_equity_growth: true, ..Default::default() };
        let engine = ProjectionEngine::new(config, Tracer::disabled()).unwrap();
        let result = engine.project(&inputs(Vec::new()), &curves).unwrap();
        assert_eq!(result.rows.len(), 4);
    }

    #[test]
    fn test_invalid_stride() {
        let config = ProjectionConfig { stride_days: 0, ..Default::default() };
        assert!(ProjectionEngine::new(config, Tracer::disabled()).is_err());
    }
}
