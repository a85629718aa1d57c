//! Per-asset dated cash flows with a portfolio-wide date index

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::assets::{AssetFlows, DatedAmounts};

/// Cash flows per asset id, ordered by date, plus the set of dates on which
/// any asset still has a flow outstanding.
///
/// Amounts are per unit held. Expiry removes dates permanently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashFlowMatrix {
    flows: AssetFlows,
    unique_dates: BTreeSet<NaiveDate>,
}

impl CashFlowMatrix {
    pub fn new(flows: AssetFlows) -> Self {
        let unique_dates = flows.values().flat_map(|amounts| amounts.keys().copied()).collect();
        Self { flows, unique_dates }
    }

    /// Matrix with a single row, used for unit-free series such as liabilities
    pub fn single(id: u32, amounts: DatedAmounts) -> Self {
        Self::new(BTreeMap::from([(id, amounts)]))
    }

    pub fn flows(&self) -> &AssetFlows {
        &self.flows
    }

    pub fn unique_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.unique_dates.iter().copied()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.unique_dates.contains(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.unique_dates.is_empty()
    }

    /// Remove every date on or before `deadline` and return the removed
    /// amounts, each multiplied by `weight(asset_id)`
    fn expire_with<F: Fn(u32) -> f64>(&mut self, deadline: NaiveDate, weight: F) -> f64 {
        let remaining = match deadline.succ_opt() {
            Some(next) => self.unique_dates.split_off(&next),
            None => BTreeSet::new(),
        };
        let expired = std::mem::replace(&mut self.unique_dates, remaining);
        if expired.is_empty() {
            return 0.0;
        }

        let mut cash = 0.0;
        for (&asset_id, amounts) in self.flows.iter_mut() {
            let w = weight(asset_id);
            amounts.retain(|&date, amount| {
                if date <= deadline {
                    cash += w * *amount;
                    false
                } else {
                    true
                }
            });
        }
        cash
    }

    /// Expire flows on or before `deadline`, weighting each asset by its units held
    pub fn expire_weighted(&mut self, deadline: NaiveDate, units: &BTreeMap<u32, f64>) -> f64 {
        self.expire_with(deadline, |asset_id| units.get(&asset_id).copied().unwrap_or(0.0))
    }

    /// Expire flows on or before `deadline` at face value
    pub fn expire(&mut self, deadline: NaiveDate) -> f64 {
        self.expire_with(deadline, |_| 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_support::date;

    fn amount(m: &CashFlowMatrix, asset_id: u32, date: NaiveDate) -> f64 {
        m.flows().get(&asset_id).and_then(|a| a.get(&date)).copied().unwrap_or(0.0)
    }

    fn matrix() -> CashFlowMatrix {
        CashFlowMatrix::new(BTreeMap::from([
            (1, DatedAmounts::from([(date(2024, 3, 1), 2.0), (date(2025, 3, 1), 2.0)])),
            (2, DatedAmounts::from([(date(2024, 6, 1), 5.0), (date(2026, 6, 1), 5.0)])),
        ]))
    }

    #[test]
    fn test_unique_dates_are_zero_filled_union() {
        let m = matrix();
        assert_eq!(m.unique_dates().count(), 4);
        assert_eq!(amount(&m, 1, date(2024, 6, 1)), 0.0);
        assert_eq!(amount(&m, 2, date(2024, 6, 1)), 5.0);
        assert_eq!(amount(&m, 3, date(2024, 6, 1)), 0.0);
    }

    #[test]
    fn test_weighted_expiry() {
        let mut m = matrix();
        let units = BTreeMap::from([(1, 10.0), (2, 3.0)]);
        let cash = m.expire_weighted(date(2024, 12, 31), &units);

        assert_eq!(cash, 2.0 * 10.0 + 5.0 * 3.0);
        assert!(!m.contains_date(date(2024, 3, 1)));
        assert!(!m.contains_date(date(2024, 6, 1)));
        assert!(m.contains_date(date(2025, 3, 1)));
        assert_eq!(amount(&m, 1, date(2024, 3, 1)), 0.0);
    }

    #[test]
    fn test_expiry_is_idempotent() {
        let mut m = matrix();
        let first = m.expire(date(2025, 3, 1));
        assert_eq!(first, 2.0 + 5.0 + 2.0);
        let again = m.expire(date(2025, 3, 1));
        assert_eq!(again, 0.0);
        assert_eq!(m.unique_dates().collect::<Vec<_>>(), vec![date(2026, 6, 1)]);
    }

    #[test]
    fn test_expiry_on_exact_date_and_empty_period() {
        let mut m = matrix();
        assert_eq!(m.expire(date(2024, 1, 1)), 0.0);
        assert_eq!(m.unique_dates().count(), 4);

        assert_eq!(m.expire(date(2026, 6, 1)), 14.0);
        assert!(m.is_empty());
    }

    #[test]
    fn test_missing_units_weight_zero() {
        let mut m = matrix();
        let units = BTreeMap::from([(1, 1.0)]);
        assert_eq!(m.expire_weighted(date(2024, 12, 31), &units), 2.0);
        assert!(!m.contains_date(date(2024, 6, 1)));
    }
}
