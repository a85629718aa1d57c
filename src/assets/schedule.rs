//! Payment date sequences, day-count fractions and discounting of dated flows

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};

use crate::assets::Frequency;
use crate::curves::{Curves, RateKind};
use crate::error::Result;

/// Dated monetary amounts of a single instrument
pub type DatedAmounts = BTreeMap<NaiveDate, f64>;

/// Day basis for discounting year fractions
pub const PRICING_DAY_COUNT: f64 = 365.25;

/// Day basis for equity price growth
pub const GROWTH_DAY_COUNT: f64 = 365.5;

/// Elapsed days between two dates over a day basis
pub fn year_fraction(from: NaiveDate, to: NaiveDate, basis: f64) -> f64 {
    (to - from).num_days() as f64 / basis
}

/// Regular payment dates of an instrument within a modelling window.
///
/// Dates are generated by stepping from one period before `anchor` in
/// `12 / frequency` month increments. Dates before `from` are skipped and
/// generation stops after `limit`. Each call to [`PaymentSchedule::dates`]
/// starts a fresh lazy sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSchedule {
    anchor: NaiveDate,
    frequency: Frequency,
    from: NaiveDate,
    limit: NaiveDate,
}

impl PaymentSchedule {
    pub fn new(anchor: NaiveDate, frequency: Frequency, from: NaiveDate, limit: NaiveDate) -> Self {
        Self { anchor, frequency, from, limit }
    }

    pub fn dates(&self) -> PaymentDates {
        let step = Months::new(self.frequency.months_between_payments());
        PaymentDates {
            current: self.anchor.checked_sub_months(step),
            step,
            from: self.from,
            limit: self.limit,
        }
    }
}

impl IntoIterator for &PaymentSchedule {
    type Item = NaiveDate;
    type IntoIter = PaymentDates;

    fn into_iter(self) -> PaymentDates {
        self.dates()
    }
}

/// Lazy iterator over the dates of a [`PaymentSchedule`]
#[derive(Debug, Clone)]
pub struct PaymentDates {
    current: Option<NaiveDate>,
    step: Months,
    from: NaiveDate,
    limit: NaiveDate,
}

impl Iterator for PaymentDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let next = self.current?.checked_add_months(self.step);
            self.current = next;
            match next {
                Some(date) if date > self.limit => {
                    self.current = None;
                    return None;
                }
                Some(date) if date < self.from => continue,
                other => return other,
            }
        }
    }
}

/// Year fractions and amounts of the flows that can be discounted at `valuation_date`.
///
/// Flows falling on or before the valuation date have already been paid
/// and are left out, so every returned fraction is strictly positive.
pub fn pricing_fractions<'a, I>(valuation_date: NaiveDate, flows: I) -> (Vec<f64>, Vec<f64>)
where
    I: IntoIterator<Item = (&'a NaiveDate, &'a f64)>,
{
    flows
        .into_iter()
        .map(|(&date, &amount)| (year_fraction(valuation_date, date, PRICING_DAY_COUNT), amount))
        .filter(|(fraction, _)| *fraction > 0.0)
        .unzip()
}

/// Present value of dated flows on the curve of projection year `proj_period`
/// with an additional spread over the risk-free rate
pub fn discount_cash_flows<'a, I>(
    flows: I,
    valuation_date: NaiveDate,
    proj_period: usize,
    curves: &Curves,
    spread: f64,
) -> Result<f64>
where
    I: IntoIterator<Item = (&'a NaiveDate, &'a f64)>,
{
    let (fractions, amounts) = pricing_fractions(valuation_date, flows);
    if fractions.is_empty() {
        return Ok(0.0);
    }
    let discount = curves.retrieve_rates(proj_period, &fractions, RateKind::Discount, spread)?;
    Ok(amounts.iter().zip(&discount).map(|(a, d)| a * d).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::test_support::sample_curves;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quarterly_dates_skip_the_past() {
        let schedule = PaymentSchedule::new(date(2015, 12, 1), Frequency::Quarterly, date(2023, 7, 24), date(2030, 12, 1));
        let dates: Vec<NaiveDate> = schedule.dates().collect();

        assert_eq!(dates[0], date(2023, 9, 1));
        assert_eq!(dates[1], date(2023, 12, 1));
        assert_eq!(*dates.last().unwrap(), date(2030, 12, 1));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_schedule_is_restartable() {
        let schedule = PaymentSchedule::new(date(2020, 3, 15), Frequency::Biannual, date(2021, 1, 1), date(2023, 1, 1));
        let first: Vec<NaiveDate> = schedule.dates().collect();
        let second: Vec<NaiveDate> = (&schedule).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![date(2021, 3, 15), date(2021, 9, 15), date(2022, 3, 15), date(2022, 9, 15)]);
    }

    #[test]
    fn test_anchor_date_is_first_payment() {
        let schedule = PaymentSchedule::new(date(2024, 1, 10), Frequency::Annual, date(2023, 1, 1), date(2026, 1, 10));
        let dates: Vec<NaiveDate> = schedule.dates().collect();
        assert_eq!(dates, vec![date(2024, 1, 10), date(2025, 1, 10), date(2026, 1, 10)]);
    }

    #[test]
    fn test_month_end_steps_clamp() {
        let schedule = PaymentSchedule::new(date(2023, 1, 31), Frequency::Monthly, date(2023, 1, 1), date(2023, 4, 30));
        let dates: Vec<NaiveDate> = schedule.dates().collect();
        assert_eq!(dates, vec![date(2023, 1, 31), date(2023, 2, 28), date(2023, 3, 28), date(2023, 4, 28)]);
    }

    #[test]
    fn test_empty_window() {
        let schedule = PaymentSchedule::new(date(2020, 1, 1), Frequency::Annual, date(2030, 1, 1), date(2025, 1, 1));
        assert_eq!(schedule.dates().count(), 0);
    }

    #[test]
    fn test_year_fraction_bases() {
        assert_relative_eq!(year_fraction(date(2023, 1, 1), date(2024, 1, 1), PRICING_DAY_COUNT), 365.0 / 365.25);
        assert_relative_eq!(year_fraction(date(2023, 1, 1), date(2024, 1, 1), GROWTH_DAY_COUNT), 365.0 / 365.5);
    }

    #[test]
    fn test_paid_flows_excluded_from_pricing() {
        let valuation = date(2024, 6, 1);
        let flows: DatedAmounts = [
            (date(2024, 1, 1), 5.0),
            (date(2024, 6, 1), 5.0),
            (date(2025, 6, 1), 5.0),
            (date(2026, 6, 1), 105.0),
        ]
        .into_iter()
        .collect();

        let (fractions, amounts) = pricing_fractions(valuation, &flows);
        assert_eq!(amounts, vec![5.0, 105.0]);
        assert!(fractions.iter().all(|&t| t > 0.0));
        assert_relative_eq!(fractions[0], 365.0 / 365.25);
    }

    #[test]
    fn test_discount_cash_flows() {
        let curves = sample_curves(1);
        let valuation = date(2023, 7, 24);
        let flows: DatedAmounts = [(date(2023, 7, 24), 50.0), (date(2024, 7, 23), 100.0)].into_iter().collect();

        let pv = discount_cash_flows(&flows, valuation, 0, &curves, 0.0).unwrap();
        let t = 365.0 / 365.25;
        let rate = curves.retrieve_rates(0, &[t], RateKind::Discount, 0.0).unwrap()[0];
        assert_relative_eq!(pv, 100.0 * rate, epsilon = 1e-12);

        let empty = DatedAmounts::new();
        assert_eq!(discount_cash_flows(&empty, valuation, 0, &curves, 0.0).unwrap(), 0.0);
    }
}
