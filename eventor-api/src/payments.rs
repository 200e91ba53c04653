use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::post,
    Extension, Json, Router,
};
use eventor_booking::ChargeInput;
use eventor_core::payment::{CardDetails, Payment, PaymentMethod};
use eventor_shared::Masked;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{session_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargeBody {
    booking_id: Option<i64>,
    payment_method: Option<String>,
    amount: Option<Decimal>,
    phone_number: Option<Masked<String>>,
    card_details: Option<CardDetails>,
}

impl ChargeBody {
    fn into_input(self) -> Result<ChargeInput, AppError> {
        let booking_id = self
            .booking_id
            .ok_or_else(|| AppError::ValidationError("bookingId is required".to_string()))?;
        let method: PaymentMethod = self
            .payment_method
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("paymentMethod is required".to_string()))?
            .parse()?;
        let amount = self
            .amount
            .ok_or_else(|| AppError::ValidationError("amount is required".to_string()))?;

        Ok(ChargeInput {
            booking_id,
            method,
            amount,
            phone_number: self.phone_number,
            card: self.card_details,
        })
    }
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    payment: Payment,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments", post(charge))
        .route_layer(from_fn_with_state(state, session_middleware))
}

/// POST /payments
///
/// Blocks for the gateway round trip. A decline answers 400 and leaves the
/// booking pending; a booking confirmed concurrently answers 409.
async fn charge(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(body): ApiJson<ChargeBody>,
) -> Result<Json<PaymentResponse>, AppError> {
    let input = body.into_input()?;
    let payment = state.services()?.processor.charge(claims.user_id, input).await?;
    Ok(Json(PaymentResponse { payment }))
}
