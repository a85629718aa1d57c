//! Liability outflow series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assets::schedule::DatedAmounts;
use crate::error::{AlmError, Result};

/// Dated liability payments, stored as positive outflow amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    pub liability_id: u32,
    cash_flows: DatedAmounts,
}

impl Liability {
    /// Build a liability from parallel date and amount sequences.
    ///
    /// Amounts falling on the same date are summed.
    pub fn new(liability_id: u32, dates: &[NaiveDate], amounts: &[f64]) -> Result<Self> {
        if dates.len() != amounts.len() {
            return Err(AlmError::validation(
                "cash_flow_series",
                format!("{} amounts for {} dates", amounts.len(), dates.len()),
            ));
        }
        if let Some(amount) = amounts.iter().find(|a| !a.is_finite()) {
            return Err(AlmError::validation("cash_flow_series", format!("{} is not a finite amount", amount)));
        }

        let mut cash_flows = DatedAmounts::new();
        for (&date, &amount) in dates.iter().zip(amounts) {
            *cash_flows.entry(date).or_insert(0.0) += amount;
        }
        Ok(Self { liability_id, cash_flows })
    }

    pub fn cash_flows(&self) -> &DatedAmounts {
        &self.cash_flows
    }

    /// Sorted dates with at least one payment
    pub fn unique_dates_profile(&self) -> Vec<NaiveDate> {
        self.cash_flows.keys().copied().collect()
    }

    pub fn total(&self) -> f64 {
        self.cash_flows.values().sum()
    }
}
