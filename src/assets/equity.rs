//! Listed equity share with a constant growth assumption

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assets::schedule::{discount_cash_flows, year_fraction, DatedAmounts, PaymentSchedule, GROWTH_DAY_COUNT};
use crate::assets::Frequency;
use crate::curves::Curves;
use crate::error::{AlmError, Result};
use crate::solvers::{bisection, SolverConfig};

/// Equity share position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityShare {
    pub asset_id: u32,
    pub nace: String,
    pub issuer: Option<String>,
    pub issue_date: NaiveDate,
    /// Dividend per payment as a fraction of the share price
    pub dividend_yield: f64,
    pub frequency: Frequency,
    pub units: f64,
    pub market_price: f64,
    /// Annual price growth rate
    pub growth_rate: f64,
}

impl EquityShare {
    pub fn validated(self) -> Result<Self> {
        if self.asset_id == 0 {
            return Err(AlmError::validation("asset_id", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.dividend_yield) {
            return Err(AlmError::validation(
                "dividend_yield",
                format!("{} is outside [0, 1]", self.dividend_yield),
            ));
        }
        if !(self.market_price >= 0.0) {
            return Err(AlmError::validation("market_price", "cannot be negative"));
        }
        if !(self.units >= 0.0) {
            return Err(AlmError::validation("units", "cannot be negative"));
        }
        if !(self.growth_rate > -1.0) {
            return Err(AlmError::validation("growth_rate", "must be greater than -1"));
        }
        Ok(self)
    }

    pub fn dividend_amount(&self, market_price: f64) -> f64 {
        market_price * self.dividend_yield
    }

    /// Proceeds of selling the share at the end of the window
    pub fn terminal_amount(&self, market_price: f64) -> f64 {
        market_price
    }

    /// Share price at `evaluated_date` grown from `market_price` at `from_date`
    pub fn generate_market_value(
        &self,
        from_date: NaiveDate,
        evaluated_date: NaiveDate,
        market_price: f64,
        growth_rate: f64,
    ) -> f64 {
        let t = year_fraction(from_date, evaluated_date, GROWTH_DAY_COUNT);
        market_price * (1.0 + growth_rate).powf(t)
    }

    pub fn dividend_schedule(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> PaymentSchedule {
        PaymentSchedule::new(self.issue_date, self.frequency, modelling_date, end_date)
    }

    /// Dividends paid on the grown share price at each dividend date
    pub fn create_single_cash_flows(&self, modelling_date: NaiveDate, end_date: NaiveDate, growth_rate: f64) -> DatedAmounts {
        self.dividend_schedule(modelling_date, end_date)
            .dates()
            .map(|dividend_date| {
                let price = self.generate_market_value(modelling_date, dividend_date, self.market_price, growth_rate);
                (dividend_date, self.dividend_amount(price))
            })
            .collect()
    }

    pub fn create_single_terminal(&self, modelling_date: NaiveDate, end_date: NaiveDate, growth_rate: f64) -> DatedAmounts {
        let price = self.generate_market_value(modelling_date, end_date, self.market_price, growth_rate);
        DatedAmounts::from([(end_date, self.terminal_amount(price))])
    }

    /// Discounted value of dividend and terminal flows on the risk-free curve
    pub fn price_share(
        &self,
        dividends: &DatedAmounts,
        terminal: &DatedAmounts,
        valuation_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
    ) -> Result<f64> {
        discount_cash_flows(dividends.iter().chain(terminal), valuation_date, proj_period, curves, 0.0)
    }

    /// Growth rate at which discounted dividends and terminal value equal the market price
    pub fn calibrate_growth(
        &self,
        modelling_date: NaiveDate,
        end_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        bracket: (f64, f64),
        config: &SolverConfig,
    ) -> Result<f64> {
        bisection(
            |growth| {
                let dividends = self.create_single_cash_flows(modelling_date, end_date, growth);
                let terminal = self.create_single_terminal(modelling_date, end_date, growth);
                let price = self.price_share(&dividends, &terminal, modelling_date, proj_period, curves)?;
                Ok(price - self.market_price)
            },
            bracket.0,
            bracket.1,
            config,
        )
        .map(|result| result.root)
        .map_err(|e| AlmError::calibration(self.asset_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::{date, sample_equity};
    use crate::curves::test_support::sample_curves;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_market_value_growth_uses_365_5_basis() {
        let equity = sample_equity();
        let grown = equity.generate_market_value(date(2023, 7, 24), date(2024, 7, 23), 100.0, 0.05);
        assert_relative_eq!(grown, 100.0 * 1.05f64.powf(365.0 / 365.5), epsilon = 1e-12);
    }

    #[test]
    fn test_dividends_follow_grown_price() {
        let equity = sample_equity();
        let modelling = date(2023, 7, 24);
        let dividends = equity.create_single_cash_flows(modelling, date(2025, 7, 24), 0.02);

        assert_eq!(dividends.len(), 2);
        for (&dividend_date, &amount) in &dividends {
            let price = equity.generate_market_value(modelling, dividend_date, equity.market_price, 0.02);
            assert_relative_eq!(amount, price * equity.dividend_yield, epsilon = 1e-12);
        }

        let terminal = equity.create_single_terminal(modelling, date(2025, 7, 24), 0.0);
        assert_eq!(terminal.get(&date(2025, 7, 24)), Some(&equity.market_price));
    }

    #[test]
    fn test_validation() {
        let mut equity = sample_equity();
        equity.dividend_yield = 1.2;
        assert!(matches!(equity.validated(), Err(AlmError::Validation { field: "dividend_yield", .. })));

        let mut equity = sample_equity();
        equity.market_price = -1.0;
        assert!(matches!(equity.validated(), Err(AlmError::Validation { field: "market_price", .. })));
    }

    #[test]
    fn test_implied_growth_reprices_market_price() {
        let curves = sample_curves(1);
        let equity = sample_equity();
        let modelling = date(2023, 7, 24);
        let end = date(2028, 7, 24);

        let growth = equity
            .calibrate_growth(modelling, end, 0, &curves, (-0.2, 0.2), &SolverConfig::new(1e-8, 100_000))
            .unwrap();
        let dividends = equity.create_single_cash_flows(modelling, end, growth);
        let terminal = equity.create_single_terminal(modelling, end, growth);
        let price = equity.price_share(&dividends, &terminal, modelling, 0, &curves).unwrap();
        assert_abs_diff_eq!(price, equity.market_price, epsilon = 1e-4);
    }
}
