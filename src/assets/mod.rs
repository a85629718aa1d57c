//! Instruments held by the portfolio and the cash flows they generate

mod bond;
mod cash;
mod equity;
mod frequency;
mod liability;
pub mod loader;
mod portfolio;
pub mod schedule;

pub use bond::CorpBond;
pub use cash::Cash;
pub use equity::EquityShare;
pub use frequency::Frequency;
pub use liability::Liability;
pub use portfolio::{unique_dates_profile, AssetFlows, CorpBondPortfolio, EquitySharePortfolio};
pub use schedule::{DatedAmounts, PaymentSchedule};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::{CorpBond, EquityShare, Frequency};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Quarterly 0.75% bond issued 2015-12-01, maturing 2030-12-01
    pub(crate) fn sample_bond() -> CorpBond {
        CorpBond {
            asset_id: 1,
            nace: "K64".to_string(),
            issuer: None,
            issue_date: date(2015, 12, 1),
            maturity_date: date(2030, 12, 1),
            coupon_rate: 0.0075,
            notional_amount: 100.0,
            spread_country: 0.0,
            spread_sector: 0.0,
            zspread: 0.0,
            spread_stress: 0.0,
            frequency: Frequency::Quarterly,
            recovery_rate: 0.4,
            default_probability: 0.01,
            units: 10.0,
            market_price: 95.0,
        }
        .validated()
        .unwrap()
    }

    /// Annual 3% dividend payer with dividends every 15 March
    pub(crate) fn sample_equity() -> EquityShare {
        EquityShare {
            asset_id: 11,
            nace: "C20".to_string(),
            issuer: None,
            issue_date: date(2020, 3, 15),
            dividend_yield: 0.03,
            frequency: Frequency::Annual,
            units: 50.0,
            market_price: 20.0,
            growth_rate: 0.02,
        }
        .validated()
        .unwrap()
    }
}
