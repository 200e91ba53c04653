use chrono::NaiveDate;
use eventor_core::booking::{Booking, BookingFilter, BookingRequest, NewBooking, EVENT_DATE_FORMAT};
use eventor_core::payment::Payment;
use eventor_core::{optional_text, require_text, validate_amount, CoreError, CoreResult};
use eventor_store::Store;
use tracing::{info, warn};

/// Creates and reads bookings on behalf of an authenticated caller.
///
/// Callers are identified by user id. Provider visibility is resolved through
/// the caller's provider profile, since bookings reference profiles rather
/// than users.
#[derive(Clone)]
pub struct BookingLedger {
    store: Store,
}

impl BookingLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, seeker_id: i64, request: BookingRequest) -> CoreResult<Booking> {
        let booking = validate_request(seeker_id, request)?;

        if self.store.providers.get_profile(booking.provider_id).await?.is_none() {
            return Err(CoreError::validation(format!(
                "Provider {} does not exist",
                booking.provider_id
            )));
        }
        if let Some(service_id) = booking.service_id {
            let services = self.store.providers.list_services(booking.provider_id).await?;
            if !services.iter().any(|s| s.id == service_id) {
                return Err(CoreError::validation(format!(
                    "Service {} is not offered by provider {}",
                    service_id, booking.provider_id
                )));
            }
        }

        let stored = self.store.bookings.create_booking(booking).await?;
        info!(
            booking_id = stored.id,
            seeker_id,
            provider_id = stored.provider_id,
            total = %stored.total_amount,
            "Booking created"
        );
        Ok(stored)
    }

    pub async fn get(&self, caller_id: i64, booking_id: i64) -> CoreResult<Booking> {
        let booking = self
            .store
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFoundError(format!("Booking {} not found", booking_id)))?;

        let profile_id = self.provider_profile_id(caller_id).await?;
        if !booking.is_visible_to(caller_id, profile_id) {
            warn!(booking_id, caller_id, "Booking read denied");
            return Err(CoreError::ForbiddenError(
                "You do not have access to this booking".to_string(),
            ));
        }
        Ok(booking)
    }

    /// Most recent first. A caller may list their own seeker bookings or the
    /// bookings made against their own provider profile.
    pub async fn list(&self, caller_id: i64, filter: BookingFilter) -> CoreResult<Vec<Booking>> {
        let allowed = match filter {
            BookingFilter::Seeker(id) => id == caller_id,
            BookingFilter::Provider(id) => self.provider_profile_id(caller_id).await? == Some(id),
        };
        if !allowed {
            return Err(CoreError::ForbiddenError(
                "You may only list your own bookings".to_string(),
            ));
        }
        Ok(self.store.bookings.list_bookings(filter).await?)
    }

    pub async fn payments(&self, caller_id: i64, booking_id: i64) -> CoreResult<Vec<Payment>> {
        let booking = self.get(caller_id, booking_id).await?;
        Ok(self.store.payments.payments_for_booking(booking.id).await?)
    }

    async fn provider_profile_id(&self, user_id: i64) -> CoreResult<Option<i64>> {
        Ok(self
            .store
            .providers
            .profile_for_user(user_id)
            .await?
            .map(|p| p.id))
    }
}

fn validate_request(seeker_id: i64, request: BookingRequest) -> CoreResult<NewBooking> {
    let provider_id = request
        .provider_id
        .ok_or_else(|| CoreError::validation("providerId is required"))?;

    let raw_date = require_text("eventDate", request.event_date.as_deref().unwrap_or(""))?;
    let event_date = NaiveDate::parse_from_str(&raw_date, EVENT_DATE_FORMAT)
        .map_err(|_| CoreError::validation("eventDate must be a date in YYYY-MM-DD format"))?;

    let event_time = require_text("eventTime", request.event_time.as_deref().unwrap_or(""))?;
    let location = require_text("location", request.location.as_deref().unwrap_or(""))?;

    let guest_count = request
        .guest_count
        .ok_or_else(|| CoreError::validation("guestCount is required"))?;
    if guest_count < 1 {
        return Err(CoreError::validation("guestCount must be at least 1"));
    }

    let total_amount = request
        .total_amount
        .ok_or_else(|| CoreError::validation("totalAmount is required"))?;
    let total_amount = validate_amount("totalAmount", total_amount)?;

    Ok(NewBooking {
        seeker_id,
        provider_id,
        service_id: request.service_id,
        event_date,
        event_time,
        location,
        guest_count,
        special_requirements: optional_text(request.special_requirements),
        total_amount,
    })
}
