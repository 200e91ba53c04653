use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Booking lifecycle. Only `Pending -> Confirmed` is driven by this system
/// (a completed payment); the remaining states are set by provider workflows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::validation(format!("unknown booking status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub seeker_id: i64,
    pub provider_id: i64,
    pub service_id: Option<i64>,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub location: String,
    pub guest_count: i32,
    pub special_requirements: Option<String>,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Seekers own their bookings; the booked provider may read them too.
    pub fn is_visible_to(&self, user_id: i64, provider_profile_id: Option<i64>) -> bool {
        self.seeker_id == user_id || provider_profile_id == Some(self.provider_id)
    }
}

/// Raw booking input as submitted by a seeker, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub provider_id: Option<i64>,
    pub service_id: Option<i64>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub guest_count: Option<i32>,
    pub special_requirements: Option<String>,
    pub total_amount: Option<Decimal>,
}

/// A booking that passed validation and is ready to be stored as pending.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub seeker_id: i64,
    pub provider_id: i64,
    pub service_id: Option<i64>,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub location: String,
    pub guest_count: i32,
    pub special_requirements: Option<String>,
    pub total_amount: Decimal,
}

/// Exactly one side of the marketplace to list bookings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    Seeker(i64),
    Provider(i64),
}

impl BookingFilter {
    pub fn from_params(seeker_id: Option<i64>, provider_id: Option<i64>) -> Result<Self, CoreError> {
        match (seeker_id, provider_id) {
            (Some(id), None) => Ok(BookingFilter::Seeker(id)),
            (None, Some(id)) => Ok(BookingFilter::Provider(id)),
            (None, None) => Err(CoreError::validation(
                "Either providerId or seekerId is required",
            )),
            (Some(_), Some(_)) => Err(CoreError::validation(
                "Only one of providerId or seekerId may be supplied",
            )),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            BookingFilter::Seeker(id) => booking.seeker_id == *id,
            BookingFilter::Provider(id) => booking.provider_id == *id,
        }
    }
}
