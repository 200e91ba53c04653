pub mod booking;
pub mod commission;
pub mod directory;
pub mod messages;
pub mod payment;
pub mod repository;
pub mod stats;
pub mod users;

use eventor_shared::is_whole_pesewas;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Failures raised by a backing store. Details stay server-side; the API layer
/// only exposes a fixed message for these.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store conflict: {0}")]
    Conflict(String),
    #[error("store failure: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Forbidden: {0}")]
    ForbiddenError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Payment declined: {0}")]
    PaymentDeclinedError(String),
    #[error("Upstream unavailable: {0}")]
    UnavailableError(String),
    #[error(transparent)]
    StoreError(#[from] StoreError),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Rejects a missing or whitespace-only text field.
pub fn require_text(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Same as [`require_text`] for optional inputs, turning blanks into `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Largest amount a `NUMERIC(12, 2)` money column holds.
pub const MAX_AMOUNT: Decimal = dec!(9999999999.99);

/// Checks a chargeable amount: positive, whole pesewas, at most [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::validation(format!("{} must be greater than zero", field)));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::validation(format!("{} cannot exceed {}", field, MAX_AMOUNT)));
    }
    if !is_whole_pesewas(amount) {
        return Err(CoreError::validation(format!("{} must be in whole pesewas", field)));
    }
    Ok(amount.normalize())
}

/// Same bounds for prices and rates, where zero is allowed.
pub fn validate_price(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(CoreError::validation(format!("{} cannot be negative", field)));
    }
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    validate_amount(field, amount)
}
