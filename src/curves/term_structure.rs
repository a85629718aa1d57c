//! Observed (maturity, yield) curve used as calibration input

use serde::{Deserialize, Serialize};

use crate::error::{AlmError, Result};

/// Ordered zero-coupon curve with strictly increasing positive maturities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTermStructure")]
pub struct TermStructure {
    maturities: Vec<f64>,
    yields: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTermStructure {
    maturities: Vec<f64>,
    yields: Vec<f64>,
}

impl TryFrom<RawTermStructure> for TermStructure {
    type Error = AlmError;

    fn try_from(raw: RawTermStructure) -> Result<Self> {
        Self::new(raw.maturities, raw.yields)
    }
}

impl TermStructure {
    /// Build a curve from parallel maturity and yield sequences.
    ///
    /// Maturities must be positive, finite and strictly increasing, which
    /// also guarantees uniqueness. Yields must be finite and above -100%.
    pub fn new(maturities: Vec<f64>, yields: Vec<f64>) -> Result<Self> {
        if maturities.len() != yields.len() {
            return Err(AlmError::validation(
                "yields",
                format!("{} yields for {} maturities", yields.len(), maturities.len()),
            ));
        }
        if maturities.is_empty() {
            return Err(AlmError::InsufficientData { required: 1, actual: 0 });
        }
        if let Some(m) = maturities.iter().find(|&&m| !(m > 0.0 && m.is_finite())) {
            return Err(AlmError::validation("maturities", format!("{} is not a positive maturity", m)));
        }
        if maturities.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AlmError::validation("maturities", "must be strictly increasing"));
        }
        if let Some(y) = yields.iter().find(|&&y| !(y > -1.0 && y.is_finite())) {
            return Err(AlmError::validation("yields", format!("{} is not a valid annual yield", y)));
        }
        Ok(Self { maturities, yields })
    }

    /// Build a curve from (maturity, yield) pairs
    pub fn from_pairs<I: IntoIterator<Item = (f64, f64)>>(pairs: I) -> Result<Self> {
        let (maturities, yields) = pairs.into_iter().unzip();
        Self::new(maturities, yields)
    }

    pub fn maturities(&self) -> &[f64] {
        &self.maturities
    }

    pub fn yields(&self) -> &[f64] {
        &self.yields
    }

    pub fn len(&self) -> usize {
        self.maturities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maturities.is_empty()
    }

    /// Longest observed maturity
    pub fn last_maturity(&self) -> f64 {
        self.maturities.last().copied().unwrap_or(0.0)
    }

    /// Iterate (maturity, yield) pairs in maturity order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.maturities.iter().copied().zip(self.yields.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_curve() {
        let curve = TermStructure::from_pairs([(1.0, 0.01), (2.0, 0.015), (5.0, 0.02)]).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.maturities(), &[1.0, 2.0, 5.0]);
        assert_eq!(curve.last_maturity(), 5.0);
        assert_eq!(curve.iter().nth(1), Some((2.0, 0.015)));
    }

    #[test]
    fn test_rejects_duplicate_maturities() {
        let result = TermStructure::new(vec![1.0, 2.0, 2.0], vec![0.01, 0.02, 0.03]);
        assert!(matches!(result, Err(AlmError::Validation { field: "maturities", .. })));
    }

    #[test]
    fn test_rejects_non_positive_maturity() {
        let result = TermStructure::new(vec![0.0, 1.0], vec![0.01, 0.02]);
        assert!(matches!(result, Err(AlmError::Validation { field: "maturities", .. })));
    }

    #[test]
    fn test_rejects_length_mismatch_and_empty() {
        assert!(matches!(
            TermStructure::new(vec![1.0, 2.0], vec![0.01]),
            Err(AlmError::Validation { field: "yields", .. })
        ));
        assert!(matches!(
            TermStructure::new(vec![], vec![]),
            Err(AlmError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_negative_yields_allowed() {
        let curve = TermStructure::new(vec![1.0, 2.0], vec![-0.005, 0.001]).unwrap();
        assert_eq!(curve.yields()[0], -0.005);
    }

    #[test]
    fn test_deserialize_validates() {
        let curve: TermStructure = serde_json::from_str(r#"{"maturities":[1.0,3.0],"yields":[0.01,0.02]}"#).unwrap();
        assert_eq!(curve.len(), 2);

        let unordered = serde_json::from_str::<TermStructure>(r#"{"maturities":[3.0,1.0],"yields":[0.01,0.02]}"#);
        assert!(unordered.is_err());
    }
}
