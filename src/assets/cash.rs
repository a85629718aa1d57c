//! Opening cash position

use serde::{Deserialize, Serialize};

use crate::error::{AlmError, Result};

/// Bank account balance at the modelling date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cash {
    pub asset_id: u32,
    pub bank_account: f64,
}

impl Cash {
    pub fn new(asset_id: u32, bank_account: f64) -> Result<Self> {
        if !bank_account.is_finite() {
            return Err(AlmError::validation("bank_account", format!("{} is not a finite balance", bank_account)));
        }
        Ok(Self { asset_id, bank_account })
    }
}
