//! Payment frequency of coupons and dividends

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AlmError, Result};

/// Number of payments per year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Frequency {
    Annual,
    Biannual,
    Triannual,
    Quarterly,
    Monthly,
}

impl Frequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::Biannual => 2,
            Frequency::Triannual => 3,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Calendar months between two consecutive payments
    pub fn months_between_payments(self) -> u32 {
        12 / self.payments_per_year()
    }
}

impl TryFrom<u32> for Frequency {
    type Error = AlmError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Frequency::Annual),
            2 => Ok(Frequency::Biannual),
            3 => Ok(Frequency::Triannual),
            4 => Ok(Frequency::Quarterly),
            12 => Ok(Frequency::Monthly),
            other => Err(AlmError::validation(
                "frequency",
                format!("{} payments per year is not one of 1, 2, 3, 4 or 12", other),
            )),
        }
    }
}

impl From<Frequency> for u32 {
    fn from(frequency: Frequency) -> u32 {
        frequency.payments_per_year()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Annual => "Annual",
            Frequency::Biannual => "Biannual",
            Frequency::Triannual => "Triannual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_between_payments() {
        assert_eq!(Frequency::Annual.months_between_payments(), 12);
        assert_eq!(Frequency::Triannual.months_between_payments(), 4);
        assert_eq!(Frequency::Monthly.months_between_payments(), 1);
    }

    #[test]
    fn test_try_from() {
        assert_eq!(Frequency::try_from(4).unwrap(), Frequency::Quarterly);
        assert!(matches!(
            Frequency::try_from(6),
            Err(AlmError::Validation { field: "frequency", .. })
        ));
    }
}
