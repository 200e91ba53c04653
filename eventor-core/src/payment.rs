use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventor_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(CoreError::validation(format!("unknown payment status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile_money" | "mobile-money" | "momo" => Ok(PaymentMethod::MobileMoney),
            "card" | "credit_card" | "debit_card" => Ok(PaymentMethod::Card),
            "bank_transfer" | "bank" => Ok(PaymentMethod::BankTransfer),
            other => Err(CoreError::validation(format!("Unsupported payment method '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub provider_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A payment attempt ready to be written. Terminal once stored.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub provider_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub number: Option<Masked<String>>,
    pub cvv: Option<Masked<String>>,
    pub expiry: Option<String>,
    pub holder_name: Option<String>,
}

/// What is sent to the gateway for a single charge attempt.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub booking_id: i64,
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub phone_number: Option<Masked<String>>,
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Approved,
    Declined { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for CoreError {
    fn from(err: GatewayError) -> Self {
        CoreError::UnavailableError(err.to_string())
    }
}

/// Boundary to whatever actually moves money. Booking logic only sees this
/// trait, so the simulated gateway can be swapped for a real provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayOutcome, GatewayError>;
}
