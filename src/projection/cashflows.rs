//! Per-date projection output

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the projection summary
///
/// The opening row at the modelling date only carries the end-of-period
/// values; the other columns are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Start cash")]
    pub start_cash: Option<f64>,
    #[serde(rename = "End cash")]
    pub end_cash: f64,
    #[serde(rename = "Start market value")]
    pub start_market_value: Option<f64>,
    #[serde(rename = "After growth market value")]
    pub after_growth_market_value: Option<f64>,
    #[serde(rename = "End market value")]
    pub end_market_value: f64,
    /// After-growth value over the previous end value, minus one
    #[serde(rename = "Portfolio return")]
    pub portfolio_return: Option<f64>,
    /// Dividends and coupons received
    #[serde(rename = "Dividend cash flow")]
    pub dividend_cash_flow: Option<f64>,
    /// Equity terminal values and bond notionals received
    #[serde(rename = "Terminal cash flow")]
    pub terminal_cash_flow: Option<f64>,
    /// Liability payments, negative when cash leaves the portfolio
    #[serde(rename = "Liability cash flow")]
    pub liability_cash_flow: Option<f64>,
}

impl PeriodSummary {
    /// Opening row at the modelling date
    pub fn opening(date: NaiveDate, bank_account: f64, market_value: f64) -> Self {
        Self {
            date,
            start_cash: None,
            end_cash: bank_account,
            start_market_value: None,
            after_growth_market_value: None,
            end_market_value: market_value,
            portfolio_return: None,
            dividend_cash_flow: None,
            terminal_cash_flow: None,
            liability_cash_flow: None,
        }
    }
}

/// Complete projection output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub rows: Vec<PeriodSummary>,
}

impl ProjectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: PeriodSummary) {
        self.rows.push(row);
    }

    pub fn final_row(&self) -> Option<&PeriodSummary> {
        self.rows.last()
    }

    /// Write one CSV row per projection date
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(std::fs::File::create(path)?)
    }

    /// Totals over the projection
    pub fn summary(&self) -> ProjectionSummary {
        let total = |f: fn(&PeriodSummary) -> Option<f64>| self.rows.iter().filter_map(f).sum::<f64>();
        ProjectionSummary {
            periods: self.rows.len().saturating_sub(1),
            total_dividend_cash_flow: total(|r| r.dividend_cash_flow),
            total_terminal_cash_flow: total(|r| r.terminal_cash_flow),
            total_liability_cash_flow: total(|r| r.liability_cash_flow),
            final_cash: self.final_row().map(|r| r.end_cash).unwrap_or(0.0),
            final_market_value: self.final_row().map(|r| r.end_market_value).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub periods: usize,
    pub total_dividend_cash_flow: f64,
    pub total_terminal_cash_flow: f64,
    pub total_liability_cash_flow: f64,
    pub final_cash: f64,
    pub final_market_value: f64,
}
