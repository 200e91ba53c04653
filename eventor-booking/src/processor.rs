use chrono::Utc;
use eventor_core::booking::BookingStatus;
use eventor_core::commission::CommissionSplit;
use eventor_core::payment::{
    CardDetails, ChargeRequest, GatewayOutcome, NewPayment, Payment, PaymentGateway, PaymentMethod,
    PaymentStatus,
};
use eventor_core::{validate_amount, CoreError, CoreResult, StoreError};
use eventor_shared::{Masked, CURRENCY};
use eventor_store::Store;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::commission::CommissionService;

/// A seeker's request to pay for one of their bookings.
#[derive(Debug, Clone)]
pub struct ChargeInput {
    pub booking_id: i64,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub phone_number: Option<Masked<String>>,
    pub card: Option<CardDetails>,
}

impl ChargeInput {
    fn validate(&self) -> CoreResult<()> {
        validate_amount("amount", self.amount)?;

        let present = |value: &Option<Masked<String>>| {
            value.as_ref().is_some_and(|v| !v.expose().trim().is_empty())
        };
        match self.method {
            PaymentMethod::MobileMoney if !present(&self.phone_number) => Err(CoreError::validation(
                "phoneNumber is required for mobile money payments",
            )),
            PaymentMethod::Card => {
                let card = self
                    .card
                    .as_ref()
                    .ok_or_else(|| CoreError::validation("cardDetails are required for card payments"))?;
                if !present(&card.number) || !present(&card.cvv) {
                    return Err(CoreError::validation(
                        "cardDetails.number and cardDetails.cvv are required for card payments",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// `TXN-<unix millis>-<8 hex>`.
pub fn new_transaction_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TXN-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Charges bookings through a [`PaymentGateway`] and records the outcome.
///
/// An approved charge stores the completed payment and confirms the booking
/// in a single store transaction. A declined charge is recorded as failed and
/// the booking stays pending so the seeker can try again.
#[derive(Clone)]
pub struct PaymentProcessor {
    store: Store,
    gateway: Arc<dyn PaymentGateway>,
    commission: CommissionService,
}

impl PaymentProcessor {
    pub fn new(store: Store, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            commission: CommissionService::new(store.clone()),
            store,
            gateway,
        }
    }

    pub async fn charge(&self, caller_id: i64, input: ChargeInput) -> CoreResult<Payment> {
        input.validate()?;

        let booking = self
            .store
            .bookings
            .get_booking(input.booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFoundError(format!("Booking {} not found", input.booking_id)))?;
        if booking.seeker_id != caller_id {
            return Err(CoreError::ForbiddenError(
                "Only the seeker who made this booking can pay for it".to_string(),
            ));
        }
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::validation("booking is not awaiting payment"));
        }
        if input.amount != booking.total_amount {
            return Err(CoreError::validation(format!(
                "amount must equal the booking total of {} {}",
                booking.total_amount, CURRENCY
            )));
        }

        let setting = self.commission.current().await?;
        let request = ChargeRequest {
            booking_id: booking.id,
            transaction_id: new_transaction_id(),
            amount: input.amount.normalize(),
            currency: CURRENCY.to_string(),
            method: input.method,
            phone_number: input.phone_number,
            card: input.card,
        };
        info!(
            booking_id = booking.id,
            transaction_id = %request.transaction_id,
            method = %request.method,
            amount = %request.amount,
            phone = ?request.phone_number,
            "Submitting charge"
        );

        let outcome = self.gateway.charge(&request).await?;
        let split = CommissionSplit::compute(request.amount, setting.rate);
        let mut payment = NewPayment {
            booking_id: booking.id,
            amount: request.amount,
            currency: request.currency,
            payment_method: request.method,
            status: PaymentStatus::Completed,
            transaction_id: request.transaction_id,
            commission_rate: split.rate,
            commission_amount: split.commission_amount,
            provider_amount: split.provider_amount,
        };

        match outcome {
            GatewayOutcome::Approved => {
                let transaction_id = payment.transaction_id.clone();
                let stored = self
                    .store
                    .payments
                    .record_completed(payment)
                    .await
                    .map_err(|e| {
                        error!(
                            booking_id = booking.id,
                            transaction_id = %transaction_id,
                            error = %e,
                            "Approved charge not recorded"
                        );
                        match e {
                            StoreError::Conflict(msg) => CoreError::ConflictError(msg),
                            other => other.into(),
                        }
                    })?;
                info!(
                    booking_id = stored.booking_id,
                    payment_id = stored.id,
                    transaction_id = %stored.transaction_id,
                    commission = %stored.commission_amount,
                    provider_amount = %stored.provider_amount,
                    "Payment completed, booking confirmed"
                );
                Ok(stored)
            }
            GatewayOutcome::Declined { reason } => {
                payment.status = PaymentStatus::Failed;
                let failed = self.store.payments.record_failed(payment).await?;
                warn!(
                    booking_id = failed.booking_id,
                    transaction_id = %failed.transaction_id,
                    %reason,
                    "Payment declined"
                );
                Err(CoreError::PaymentDeclinedError(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booking_request, fixture, Fixture};
    use crate::{BookingLedger, SimulatedGateway};
    use eventor_core::booking::Booking;
    use eventor_core::commission::NewCommissionSetting;
    use rust_decimal_macros::dec;

    async fn pending_booking(fx: &Fixture, total: Decimal) -> Booking {
        BookingLedger::new(fx.store.clone())
            .create(fx.seeker.id, booking_request(fx.provider.id, total))
            .await
            .unwrap()
    }

    async fn set_rate(fx: &Fixture, rate: Decimal) {
        CommissionService::new(fx.store.clone())
            .update(NewCommissionSetting {
                rate,
                payment_method: "mobile_money".to_string(),
                account_details: String::new(),
            })
            .await
            .unwrap();
    }

    fn momo(booking_id: i64, amount: Decimal) -> ChargeInput {
        ChargeInput {
            booking_id,
            method: PaymentMethod::MobileMoney,
            amount,
            phone_number: Some(Masked("0244123456".to_string())),
            card: None,
        }
    }

    fn processor(fx: &Fixture, gateway: SimulatedGateway) -> PaymentProcessor {
        PaymentProcessor::new(fx.store.clone(), Arc::new(gateway))
    }

    #[test]
    fn test_transaction_id_format() {
        let id = new_transaction_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_approved_charge_splits_and_confirms() {
        let fx = fixture().await;
        set_rate(&fx, dec!(0.10)).await;
        let booking = pending_booking(&fx, dec!(1000)).await;

        let payment = processor(&fx, SimulatedGateway::instant(1.0))
            .charge(fx.seeker.id, momo(booking.id, dec!(1000)))
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.commission_rate, dec!(0.1));
        assert_eq!(payment.commission_amount, dec!(100));
        assert_eq!(payment.provider_amount, dec!(900));
        assert_eq!(payment.currency, "GHS");
        assert!(payment.transaction_id.starts_with("TXN-"));

        let confirmed = fx.store.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_default_rate_applies_without_settings() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(333.33)).await;

        let payment = processor(&fx, SimulatedGateway::instant(1.0))
            .charge(fx.seeker.id, momo(booking.id, dec!(333.33)))
            .await
            .unwrap();

        assert_eq!(payment.commission_amount, dec!(16.67));
        assert_eq!(payment.provider_amount, dec!(316.66));
        assert_eq!(payment.commission_amount + payment.provider_amount, payment.amount);
    }

    #[tokio::test]
    async fn test_declined_charge_is_recorded_and_booking_stays_pending() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(500)).await;

        let result = processor(&fx, SimulatedGateway::instant(0.0))
            .charge(fx.seeker.id, momo(booking.id, dec!(500)))
            .await;
        assert!(matches!(result, Err(CoreError::PaymentDeclinedError(_))));

        let attempts = fx.store.payments.payments_for_booking(booking.id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, PaymentStatus::Failed);
        let still = fx.store.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(still.status, BookingStatus::Pending);

        // A retry after a decline can still succeed.
        processor(&fx, SimulatedGateway::instant(1.0))
            .charge(fx.seeker.id, momo(booking.id, dec!(500)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_confirmed_booking_cannot_be_charged_again() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(200)).await;
        let approve = processor(&fx, SimulatedGateway::instant(1.0));

        approve.charge(fx.seeker.id, momo(booking.id, dec!(200))).await.unwrap();
        let again = approve.charge(fx.seeker.id, momo(booking.id, dec!(200))).await;
        assert!(matches!(again, Err(CoreError::ValidationError(_))));
        assert_eq!(fx.store.payments.payments_for_booking(booking.id).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_charges_confirm_once() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(800)).await;
        let slow = processor(&fx, SimulatedGateway::new(1.0, 10, 10));

        let (a, b) = tokio::join!(
            slow.charge(fx.seeker.id, momo(booking.id, dec!(800))),
            slow.charge(fx.seeker.id, momo(booking.id, dec!(800))),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(CoreError::ConflictError(_)))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_input_before_charging() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(100)).await;
        let approve = processor(&fx, SimulatedGateway::instant(1.0));

        let mut no_phone = momo(booking.id, dec!(100));
        no_phone.phone_number = Some(Masked("  ".to_string()));
        let card_without_cvv = ChargeInput {
            booking_id: booking.id,
            method: PaymentMethod::Card,
            amount: dec!(100),
            phone_number: None,
            card: Some(CardDetails {
                number: Some(Masked("4111111111111111".to_string())),
                cvv: None,
                expiry: Some("12/28".to_string()),
                holder_name: None,
            }),
        };
        let zero = momo(booking.id, Decimal::ZERO);
        let over_limit = momo(booking.id, eventor_core::MAX_AMOUNT + dec!(0.01));

        for input in [no_phone, card_without_cvv, zero, over_limit] {
            let result = approve.charge(fx.seeker.id, input).await;
            assert!(matches!(result, Err(CoreError::ValidationError(_))), "{:?}", result);
        }
        assert!(fx.store.payments.payments_for_booking(booking.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_amount_must_match_booking_total() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(1000)).await;
        let approve = processor(&fx, SimulatedGateway::instant(1.0));

        for amount in [dec!(0.01), dec!(999.99), dec!(1000.01)] {
            let result = approve.charge(fx.seeker.id, momo(booking.id, amount)).await;
            assert!(matches!(result, Err(CoreError::ValidationError(_))), "{:?}", result);
        }
        assert!(fx.store.payments.payments_for_booking(booking.id).await.unwrap().is_empty());
        let still = fx.store.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(still.status, BookingStatus::Pending);

        let paid = approve
            .charge(fx.seeker.id, momo(booking.id, dec!(1000.00)))
            .await
            .unwrap();
        assert_eq!(paid.amount, dec!(1000));
    }

    #[tokio::test]
    async fn test_only_the_seeker_can_pay() {
        let fx = fixture().await;
        let booking = pending_booking(&fx, dec!(100)).await;
        let approve = processor(&fx, SimulatedGateway::instant(1.0));

        assert!(matches!(
            approve.charge(fx.provider_user.id, momo(booking.id, dec!(100))).await,
            Err(CoreError::ForbiddenError(_))
        ));
        assert!(matches!(
            approve.charge(fx.seeker.id, momo(booking.id + 1, dec!(100))).await,
            Err(CoreError::NotFoundError(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_change_does_not_touch_past_payments() {
        let fx = fixture().await;
        set_rate(&fx, dec!(0.10)).await;
        let booking = pending_booking(&fx, dec!(1000)).await;
        let paid = processor(&fx, SimulatedGateway::instant(1.0))
            .charge(fx.seeker.id, momo(booking.id, dec!(1000)))
            .await
            .unwrap();

        set_rate(&fx, dec!(0.20)).await;

        let stored = fx.store.payments.payments_for_booking(booking.id).await.unwrap();
        assert_eq!(stored, vec![paid]);
        assert_eq!(stored[0].commission_amount, dec!(100));
    }
}
