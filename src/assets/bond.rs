//! Fixed coupon corporate bond

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assets::schedule::{discount_cash_flows, DatedAmounts, PaymentSchedule};
use crate::assets::Frequency;
use crate::curves::Curves;
use crate::error::{AlmError, Result};
use crate::solvers::{bisection, SolverConfig};

/// Corporate bond position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpBond {
    pub asset_id: u32,
    pub nace: String,
    pub issuer: Option<String>,
    pub issue_date: NaiveDate,
    pub maturity_date: NaiveDate,
    /// Annual coupon as a fraction of notional
    pub coupon_rate: f64,
    pub notional_amount: f64,
    pub spread_country: f64,
    pub spread_sector: f64,
    pub zspread: f64,
    pub spread_stress: f64,
    pub frequency: Frequency,
    pub recovery_rate: f64,
    pub default_probability: f64,
    pub units: f64,
    /// Market price of one unit
    pub market_price: f64,
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<()> {
    if value < 0.0 {
        return Err(AlmError::validation(field, "cannot be negative"));
    }
    if value > 1.0 {
        return Err(AlmError::validation(field, "cannot be greater than 1"));
    }
    Ok(())
}

impl CorpBond {
    /// Check the bond terms, returning the bond unchanged when they are consistent
    pub fn validated(self) -> Result<Self> {
        if self.asset_id == 0 {
            return Err(AlmError::validation("asset_id", "must be greater than 0"));
        }
        check_unit_interval("coupon_rate", self.coupon_rate)?;
        check_unit_interval("recovery_rate", self.recovery_rate)?;
        check_unit_interval("default_probability", self.default_probability)?;
        if !(self.market_price >= 0.0) {
            return Err(AlmError::validation("market_price", "cannot be negative"));
        }
        if !(self.notional_amount > 0.0) {
            return Err(AlmError::validation("notional_amount", "must be greater than 0"));
        }
        if !(self.units >= 0.0) {
            return Err(AlmError::validation("units", "cannot be negative"));
        }
        if self.maturity_date <= self.issue_date {
            return Err(AlmError::validation(
                "maturity_date",
                format!("{} is not after issue date {}", self.maturity_date, self.issue_date),
            ));
        }
        Ok(self)
    }

    /// Monetary amount of one coupon payment
    pub fn coupon_amount(&self) -> f64 {
        self.coupon_rate * self.notional_amount
    }

    /// Last date a cash flow of the bond is recognised inside the window
    pub fn terminal_date(&self, end_date: NaiveDate) -> NaiveDate {
        end_date.min(self.maturity_date)
    }

    /// Coupon dates from `modelling_date` up to maturity or the end of the window
    pub fn coupon_schedule(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> PaymentSchedule {
        PaymentSchedule::new(self.issue_date, self.frequency, modelling_date, self.terminal_date(end_date))
    }

    pub fn create_single_cash_flows(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> DatedAmounts {
        let coupon = self.coupon_amount();
        self.coupon_schedule(modelling_date, end_date)
            .dates()
            .map(|date| (date, coupon))
            .collect()
    }

    /// Notional repayment, brought forward to the end of the window when the
    /// bond matures after it
    pub fn create_single_maturity(&self, end_date: NaiveDate) -> DatedAmounts {
        DatedAmounts::from([(self.terminal_date(end_date), self.notional_amount)])
    }

    /// Days from `date` to redemption
    pub fn term_to_maturity(&self, date: NaiveDate) -> i64 {
        (self.maturity_date - date).num_days()
    }

    /// Discounted value of the given coupon and notional flows
    pub fn price_bond(
        &self,
        coupons: &DatedAmounts,
        notional: &DatedAmounts,
        valuation_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        spread: f64,
    ) -> Result<f64> {
        discount_cash_flows(coupons.iter().chain(notional), valuation_date, proj_period, curves, spread)
    }

    /// Spread over the risk-free curve at which the bond reprices to its market price
    pub fn calibrate_zspread(
        &self,
        modelling_date: NaiveDate,
        end_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        bracket: (f64, f64),
        config: &SolverConfig,
    ) -> Result<f64> {
        let coupons = self.create_single_cash_flows(modelling_date, end_date);
        let notional = self.create_single_maturity(end_date);

        bisection(
            |spread| {
                let price = self.price_bond(&coupons, &notional, modelling_date, proj_period, curves, spread)?;
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
