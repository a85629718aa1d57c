//! Portfolio state carried from one projection date to the next

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Asset class of a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Equity,
    Bond,
}

/// Units and unit price of one asset, one entry per projection date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingSeries {
    units: Vec<f64>,
    prices: Vec<f64>,
}

impl HoldingSeries {
    fn new(units: f64, price: f64) -> Self {
        Self { units: vec![units], prices: vec![price] }
    }

    pub fn units(&self) -> f64 {
        self.units.last().copied().unwrap_or(0.0)
    }

    pub fn price(&self) -> f64 {
        self.prices.last().copied().unwrap_or(0.0)
    }

    pub fn market_value(&self) -> f64 {
        self.units() * self.price()
    }

    pub fn units_history(&self) -> &[f64] {
        &self.units
    }

    pub fn price_history(&self) -> &[f64] {
        &self.prices
    }

    fn carry_forward(&mut self) {
        let (units, price) = (self.units(), self.price());
        self.units.push(units);
        self.prices.push(price);
    }

    fn set_price(&mut self, price: f64) {
        if let Some(last) = self.prices.last_mut() {
            *last = price;
        }
    }

    fn scale_units(&mut self, factor: f64) {
        if let Some(last) = self.units.last_mut() {
            *last *= factor;
        }
    }
}

/// Holdings, bank balance and date of the portfolio during a projection.
///
/// Every holding series has one entry per date in [`PortfolioState::dates`];
/// only the entry of the current date is ever modified.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub bank_account: f64,
    dates: Vec<NaiveDate>,
    equities: BTreeMap<u32, HoldingSeries>,
    bonds: BTreeMap<u32, HoldingSeries>,
}

impl PortfolioState {
    pub fn new(date: NaiveDate, bank_account: f64) -> Self {
        Self {
            bank_account,
            dates: vec![date],
            equities: BTreeMap::new(),
            bonds: BTreeMap::new(),
        }
    }

    /// Add an opening position; only valid before the first [`advance`](Self::advance)
    pub fn with_holding(mut self, class: AssetClass, asset_id: u32, units: f64, price: f64) -> Self {
        self.holdings_mut(class).insert(asset_id, HoldingSeries::new(units, price));
        self
    }

    pub fn current_date(&self) -> NaiveDate {
        self.dates.last().copied().unwrap_or_default()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn holdings(&self, class: AssetClass) -> &BTreeMap<u32, HoldingSeries> {
        match class {
            AssetClass::Equity => &self.equities,
            AssetClass::Bond => &self.bonds,
        }
    }

    fn holdings_mut(&mut self, class: AssetClass) -> &mut BTreeMap<u32, HoldingSeries> {
        match class {
            AssetClass::Equity => &mut self.equities,
            AssetClass::Bond => &mut self.bonds,
        }
    }

    /// Current units held per asset of a class
    pub fn units(&self, class: AssetClass) -> BTreeMap<u32, f64> {
        self.holdings(class).iter().map(|(&id, h)| (id, h.units())).collect()
    }

    /// Move to `date`, carrying units and prices of the previous date forward
    pub fn advance(&mut self, date: NaiveDate) {
        self.dates.push(date);
        for holding in self.equities.values_mut().chain(self.bonds.values_mut()) {
            holding.carry_forward();
        }
    }

    /// Set the current price of an asset; unknown assets are ignored
    pub fn set_price(&mut self, class: AssetClass, asset_id: u32, price: f64) {
        if let Some(holding) = self.holdings_mut(class).get_mut(&asset_id) {
            holding.set_price(price);
        }
    }

    /// Multiply the current units of every holding by `factor`
    pub fn scale_units(&mut self, factor: f64) {
        for holding in self.equities.values_mut().chain(self.bonds.values_mut()) {
            holding.scale_units(factor);
        }
    }

    pub fn market_value(&self, class: AssetClass) -> f64 {
        self.holdings(class).values().map(HoldingSeries::market_value).sum()
    }

    /// Sum of units times price over all holdings
    pub fn total_market_value(&self) -> f64 {
        self.market_value(AssetClass::Equity) + self.market_value(AssetClass::Bond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::date;

    fn state() -> PortfolioState {
        PortfolioState::new(date(2023, 7, 24), 100.0)
            .with_holding(AssetClass::Equity, 1, 10.0, 5.0)
            .with_holding(AssetClass::Bond, 1, 2.0, 100.0)
    }

    #[test]
    fn test_total_market_value() {
        let s = state();
        assert_eq!(s.market_value(AssetClass::Equity), 50.0);
        assert_eq!(s.market_value(AssetClass::Bond), 200.0);
        assert_eq!(s.total_market_value(), 250.0);
    }

    #[test]
    fn test_advance_extends_series_without_editing_history() {
        let mut s = state();
        s.advance(date(2024, 7, 23));
        s.set_price(AssetClass::Equity, 1, 6.0);
        s.scale_units(0.5);

        assert_eq!(s.current_date(), date(2024, 7, 23));
        assert_eq!(s.dates().len(), 2);
        let equity = &s.holdings(AssetClass::Equity)[&1];
        assert_eq!(equity.price_history(), &[5.0, 6.0]);
        assert_eq!(equity.units_history(), &[10.0, 5.0]);
        assert_eq!(s.units(AssetClass::Bond)[&1], 1.0);
    }
}
