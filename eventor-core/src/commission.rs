use chrono::{DateTime, Utc};
use eventor_shared::round_money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{require_text, CoreError, CoreResult};

pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(0.05);
pub const MAX_COMMISSION_RATE: Decimal = dec!(0.5);
pub const DEFAULT_PAYOUT_METHOD: &str = "mobile_money";
pub const RATE_SCALE: u32 = 4;

/// One version of the platform's commission configuration.
///
/// Settings are append-only; the store keeps an explicit pointer to the active
/// version. Payments copy the rate at charge time, so later versions never
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSetting {
    pub id: i64,
    pub rate: Decimal,
    pub payment_method: String,
    pub account_details: String,
    /// `None` for the built-in default, which was never saved.
    pub created_at: Option<DateTime<Utc>>,
}

impl CommissionSetting {
    /// Used while no setting has ever been stored. Never persisted, id 0.
    pub fn fallback() -> Self {
        Self {
            id: 0,
            rate: DEFAULT_COMMISSION_RATE,
            payment_method: DEFAULT_PAYOUT_METHOD.to_string(),
            account_details: String::new(),
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommissionSetting {
    pub rate: Decimal,
    pub payment_method: String,
    #[serde(default)]
    pub account_details: String,
}

impl NewCommissionSetting {
    pub fn validated(self) -> CoreResult<Self> {
        validate_rate(self.rate)?;
        let payment_method = require_text("paymentMethod", &self.payment_method)?;
        Ok(Self {
            rate: self.rate.normalize(),
            payment_method,
            account_details: self.account_details.trim().to_string(),
        })
    }
}

pub fn validate_rate(rate: Decimal) -> CoreResult<()> {
    if rate < Decimal::ZERO || rate > MAX_COMMISSION_RATE {
        return Err(CoreError::validation(format!(
            "Commission rate must be between 0 and {}",
            MAX_COMMISSION_RATE
        )));
    }
    if rate.normalize().scale() > RATE_SCALE {
        return Err(CoreError::validation(format!(
            "Commission rate supports at most {} decimal places",
            RATE_SCALE
        )));
    }
    Ok(())
}

/// How a charged amount divides between the platform and the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub rate: Decimal,
    pub commission_amount: Decimal,
    pub provider_amount: Decimal,
}

impl CommissionSplit {
    /// Commission is rounded to the pesewa and the provider gets the exact
    /// remainder, so the two parts always sum to `amount`.
    pub fn compute(amount: Decimal, rate: Decimal) -> Self {
        let commission_amount = round_money(amount * rate);
        Self {
            rate,
            commission_amount,
            provider_amount: amount - commission_amount,
        }
    }
}
