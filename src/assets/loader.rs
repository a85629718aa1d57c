//! Load instrument positions from CSV files
//!
//! Column names follow the portfolio input templates (`Asset_ID`,
//! `Issue_Date`, ...). Dates are written as `dd/mm/YYYY`. Every row goes
//! through the instrument's validation before it is added to a portfolio.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{Reader, ReaderBuilder, Trim};
use serde::Deserialize;

use super::{Cash, CorpBond, CorpBondPortfolio, EquityShare, EquitySharePortfolio, Frequency, Liability};
use crate::error::{AlmError, Result};

/// Date format used by all input files
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a `dd/mm/YYYY` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)?)
}

fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(reader)
}

/// Raw row of the corporate bond input file
#[derive(Debug, Deserialize)]
struct BondRow {
    #[serde(rename = "Asset_ID")]
    asset_id: u32,
    #[serde(rename = "NACE")]
    nace: String,
    #[serde(rename = "Issue_Date")]
    issue_date: String,
    #[serde(rename = "Maturity_Date")]
    maturity_date: String,
    #[serde(rename = "Coupon_Rate")]
    coupon_rate: f64,
    #[serde(rename = "Notional_Amount")]
    notional_amount: f64,
    #[serde(rename = "Spread_Country")]
    spread_country: f64,
    #[serde(rename = "Spread_Sector")]
    spread_sector: f64,
    #[serde(rename = "Z_Spread")]
    zspread: f64,
    #[serde(rename = "Spread_Stress")]
    spread_stress: f64,
    #[serde(rename = "Frequency")]
    frequency: u32,
    #[serde(rename = "Recovery_Rate")]
    recovery_rate: f64,
    #[serde(rename = "Default_Probability")]
    default_probability: f64,
    #[serde(rename = "Units")]
    units: f64,
    #[serde(rename = "Market_Price")]
    market_price: f64,
}

impl BondRow {
    fn into_bond(self) -> Result<CorpBond> {
        CorpBond {
            asset_id: self.asset_id,
            nace: self.nace,
            issuer: None,
            issue_date: parse_date(&self.issue_date)?,
            maturity_date: parse_date(&self.maturity_date)?,
            coupon_rate: self.coupon_rate,
            notional_amount: self.notional_amount,
            spread_country: self.spread_country,
            spread_sector: self.spread_sector,
            zspread: self.zspread,
            spread_stress: self.spread_stress,
            frequency: Frequency::try_from(self.frequency)?,
            recovery_rate: self.recovery_rate,
            default_probability: self.default_probability,
            units: self.units,
            market_price: self.market_price,
        }
        .validated()
    }
}

/// Raw row of the equity input file
#[derive(Debug, Deserialize)]
struct EquityRow {
    #[serde(rename = "Asset_ID")]
    asset_id: u32,
    #[serde(rename = "NACE")]
    nace: String,
    #[serde(rename = "Issue_Date")]
    issue_date: String,
    #[serde(rename = "Dividend_Yield")]
    dividend_yield: f64,
    #[serde(rename = "Frequency")]
    frequency: u32,
    #[serde(rename = "Units")]
    units: f64,
    #[serde(rename = "Market_Price")]
    market_price: f64,
    #[serde(rename = "Growth_Rate")]
    growth_rate: f64,
}

impl EquityRow {
    fn into_equity(self) -> Result<EquityShare> {
        EquityShare {
            asset_id: self.asset_id,
            nace: self.nace,
            issuer: None,
            issue_date: parse_date(&self.issue_date)?,
            dividend_yield: self.dividend_yield,
            frequency: Frequency::try_from(self.frequency)?,
            units: self.units,
            market_price: self.market_price,
            growth_rate: self.growth_rate,
        }
        .validated()
    }
}

#[derive(Debug, Deserialize)]
struct CashRow {
    #[serde(rename = "Asset_ID")]
    asset_id: u32,
    #[serde(rename = "Bank_Account")]
    bank_account: f64,
}

#[derive(Debug, Deserialize)]
struct LiabilityRow {
    #[serde(rename = "Liability_Date")]
    liability_date: String,
    #[serde(rename = "Liability_Size")]
    liability_size: f64,
}

/// Load corporate bonds from any reader
pub fn load_bonds_from_reader<R: Read>(reader: R) -> Result<CorpBondPortfolio> {
    let mut portfolio = CorpBondPortfolio::new();
    for result in csv_reader(reader).deserialize() {
        let row: BondRow = result?;
        portfolio.add(row.into_bond()?)?;
    }
    Ok(portfolio)
}

pub fn load_bonds<P: AsRef<Path>>(path: P) -> Result<CorpBondPortfolio> {
    load_bonds_from_reader(std::fs::File::open(path)?)
}

/// Load equity shares from any reader
pub fn load_equities_from_reader<R: Read>(reader: R) -> Result<EquitySharePortfolio> {
    let mut portfolio = EquitySharePortfolio::new();
    for result in csv_reader(reader).deserialize() {
        let row: EquityRow = result?;
        portfolio.add(row.into_equity()?)?;
    }
    Ok(portfolio)
}

pub fn load_equities<P: AsRef<Path>>(path: P) -> Result<EquitySharePortfolio> {
    load_equities_from_reader(std::fs::File::open(path)?)
}

/// Load the opening cash position; the last row of the file is used
pub fn load_cash_from_reader<R: Read>(reader: R) -> Result<Cash> {
    let mut cash = None;
    for result in csv_reader(reader).deserialize() {
        let row: CashRow = result?;
        cash = Some(Cash::new(row.asset_id, row.bank_account)?);
    }
    cash.ok_or_else(|| AlmError::Parse("cash file has no rows".to_string()))
}

pub fn load_cash<P: AsRef<Path>>(path: P) -> Result<Cash> {
    load_cash_from_reader(std::fs::File::open(path)?)
}

/// Load the liability cash-flow series
pub fn load_liability_from_reader<R: Read>(reader: R, liability_id: u32) -> Result<Liability> {
    let mut dates = Vec::new();
    let mut amounts = Vec::new();
    for result in csv_reader(reader).deserialize() {
        let row: LiabilityRow = result?;
        dates.push(parse_date(&row.liability_date)?);
        amounts.push(row.liability_size);
    }
    Liability::new(liability_id, &dates, &amounts)
}

pub fn load_liability<P: AsRef<Path>>(path: P, liability_id: u32) -> Result<Liability> {
    load_liability_from_reader(std::fs::File::open(path)?, liability_id)
}
