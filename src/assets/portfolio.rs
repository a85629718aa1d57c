//! Bond and equity portfolios keyed by asset id

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;

use crate::assets::schedule::DatedAmounts;
use crate::assets::{CorpBond, EquityShare};
use crate::curves::Curves;
use crate::error::{AlmError, Result};
use crate::solvers::SolverConfig;
use crate::trace::Tracer;

/// Per-asset dated cash flows
pub type AssetFlows = BTreeMap<u32, DatedAmounts>;

/// Sorted dates on which at least one asset has a cash flow
pub fn unique_dates_profile(flows: &AssetFlows) -> Vec<NaiveDate> {
    flows
        .values()
        .flat_map(|amounts| amounts.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn duplicate(asset_id: u32) -> AlmError {
    AlmError::validation("asset_id", format!("{} already in portfolio", asset_id))
}

/// Corporate bond holdings
#[derive(Debug, Clone, Default)]
pub struct CorpBondPortfolio {
    bonds: BTreeMap<u32, CorpBond>,
}

impl CorpBondPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bond: CorpBond) -> Result<()> {
        if self.bonds.contains_key(&bond.asset_id) {
            return Err(duplicate(bond.asset_id));
        }
        self.bonds.insert(bond.asset_id, bond);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn get(&self, asset_id: u32) -> Option<&CorpBond> {
        self.bonds.get(&asset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpBond> {
        self.bonds.values()
    }

    pub fn create_coupon_flows(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> AssetFlows {
        self.bonds
            .iter()
            .map(|(&id, bond)| (id, bond.create_single_cash_flows(modelling_date, end_date)))
            .collect()
    }

    pub fn create_maturity_flows(&self, end_date: NaiveDate) -> AssetFlows {
        self.bonds
            .iter()
            .map(|(&id, bond)| (id, bond.create_single_maturity(end_date)))
            .collect()
    }

    /// Coupon amounts of all bonds summed by payment date
    pub fn create_aggregate_coupon_dates(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> DatedAmounts {
        let mut total = DatedAmounts::new();
        for bond in self.bonds.values() {
            for (date, amount) in bond.create_single_cash_flows(modelling_date, end_date) {
                *total.entry(date).or_insert(0.0) += amount;
            }
        }
        total
    }

    /// Z-spread of every bond against the curve of `proj_period`
    pub fn calibrate_zspreads(
        &self,
        modelling_date: NaiveDate,
        end_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        bracket: (f64, f64),
        config: &SolverConfig,
        tracer: Tracer,
    ) -> Result<BTreeMap<u32, f64>> {
        info!("Calibrating z-spreads for {} bonds", self.bonds.len());
        self.bonds
            .par_iter()
            .map(|(&id, bond)| -> Result<(u32, f64)> {
                let spread = bond.calibrate_zspread(modelling_date, end_date, proj_period, curves, bracket, config)?;
                tracer.step_with("calibrate_zspread", || format!("asset {} spread {:.8}", id, spread));
                Ok((id, spread))
            })
            .collect()
    }

    /// Unit prices of all bonds from their remaining flows
    pub fn price_bond_portfolio(
        &self,
        coupons: &AssetFlows,
        notional: &AssetFlows,
        valuation_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        spreads: &BTreeMap<u32, f64>,
    ) -> Result<BTreeMap<u32, f64>> {
        let empty = DatedAmounts::new();
        self.bonds
            .par_iter()
            .map(|(&id, bond)| -> Result<(u32, f64)> {
                let spread = spreads.get(&id).copied().unwrap_or(bond.zspread);
                let price = bond.price_bond(
                    coupons.get(&id).unwrap_or(&empty),
                    notional.get(&id).unwrap_or(&empty),
                    valuation_date,
                    proj_period,
                    curves,
                    spread,
                )?;
                Ok((id, price))
            })
            .collect()
    }
}

/// Equity share holdings
#[derive(Debug, Clone, Default)]
pub struct EquitySharePortfolio {
    shares: BTreeMap<u32, EquityShare>,
}

impl EquitySharePortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, share: EquityShare) -> Result<()> {
        if self.shares.contains_key(&share.asset_id) {
            return Err(duplicate(share.asset_id));
        }
        self.shares.insert(share.asset_id, share);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn get(&self, asset_id: u32) -> Option<&EquityShare> {
        self.shares.get(&asset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquityShare> {
        self.shares.values()
    }

    /// Dividends of each share at its own growth rate
    pub fn create_dividend_flows(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> AssetFlows {
        self.shares
            .iter()
            .map(|(&id, share)| (id, share.create_single_cash_flows(modelling_date, end_date, share.growth_rate)))
            .collect()
    }

    pub fn create_terminal_flows(&self, modelling_date: NaiveDate, end_date: NaiveDate) -> AssetFlows {
        self.shares
            .iter()
            .map(|(&id, share)| (id, share.create_single_terminal(modelling_date, end_date, share.growth_rate)))
            .collect()
    }

    /// Implied growth rate of every share against the curve of `proj_period`
    pub fn calibrate_growth_rates(
        &self,
        modelling_date: NaiveDate,
        end_date: NaiveDate,
        proj_period: usize,
        curves: &Curves,
        bracket: (f64, f64),
        config: &SolverConfig,
        tracer: Tracer,
    ) -> Result<BTreeMap<u32, f64>> {
        info!("Calibrating growth rates for {} equities", self.shares.len());
        self.shares
            .par_iter()
            .map(|(&id, share)| -> Result<(u32, f64)> {
                let growth = share.calibrate_growth(modelling_date, end_date, proj_period, curves, bracket, config)?;
                tracer.step_with("calibrate_growth", || format!("asset {} growth {:.8}", id, growth));
                Ok((id, growth))
            })
            .collect()
    }

    /// Replace the growth assumption of the listed shares
    pub fn apply_growth_rates(&mut self, growth_rates: &BTreeMap<u32, f64>) {
        for (id, &growth) in growth_rates {
            if let Some(share) = self.shares.get_mut(id) {
                share.growth_rate = growth;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::{date, sample_bond, sample_equity};
    use crate::curves::test_support::sample_curves;
    use approx::assert_abs_diff_eq;

    fn two_bonds() -> CorpBondPortfolio {
        let mut portfolio = CorpBondPortfolio::new();
        portfolio.add(sample_bond()).unwrap();
        let mut second = sample_bond();
        second.asset_id = 2;
        second.coupon_rate = 0.02;
        second.frequency = crate::assets::Frequency::Annual;
        portfolio.add(second).unwrap();
        portfolio
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let mut portfolio = CorpBondPortfolio::new();
        assert!(portfolio.is_empty());
        portfolio.add(sample_bond()).unwrap();
        assert!(matches!(portfolio.add(sample_bond()), Err(AlmError::Validation { field: "asset_id", .. })));
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn test_aggregate_coupons_sum_across_bonds() {
        let portfolio = two_bonds();
        let modelling = date(2023, 7, 24);
        let end = date(2025, 7, 24);
        let aggregate = portfolio.create_aggregate_coupon_dates(modelling, end);

        // Both bonds pay on 1 December
        let shared = date(2023, 12, 1);
        assert_abs_diff_eq!(aggregate[&shared], 0.75 + 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(aggregate[&date(2023, 9, 1)], 0.75, epsilon = 1e-12);

        let flows = portfolio.create_coupon_flows(modelling, end);
        let unique = unique_dates_profile(&flows);
        assert_eq!(unique.len(), aggregate.len());
        assert!(unique.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_portfolio_spreads_and_prices() {
        let curves = sample_curves(1);
        let portfolio = two_bonds();
        let modelling = date(2023, 7, 24);
        let end = date(2028, 7, 24);

        let spreads = portfolio
            .calibrate_zspreads(modelling, end, 0, &curves, (-0.2, 0.2), &SolverConfig::new(1e-8, 100_000), Tracer::disabled())
            .unwrap();
        assert_eq!(spreads.len(), 2);

        let coupons = portfolio.create_coupon_flows(modelling, end);
        let notional = portfolio.create_maturity_flows(end);
        let prices = portfolio
            .price_bond_portfolio(&coupons, &notional, modelling, 0, &curves, &spreads)
            .unwrap();
        for bond in portfolio.iter() {
            assert_abs_diff_eq!(prices[&bond.asset_id], bond.market_price, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_apply_growth_rates() {
        let mut portfolio = EquitySharePortfolio::new();
        portfolio.add(sample_equity()).unwrap();
        let rates = BTreeMap::from([(sample_equity().asset_id, 0.07), (99, 0.5)]);
        portfolio.apply_growth_rates(&rates);
        assert_eq!(portfolio.get(sample_equity().asset_id).unwrap().growth_rate, 0.07);
        assert!(portfolio.get(99).is_none());
    }
}
