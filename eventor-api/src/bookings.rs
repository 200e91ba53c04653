use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use eventor_core::booking::{Booking, BookingFilter, BookingRequest};
use eventor_core::payment::Payment;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{session_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBookingsQuery {
    provider_id: Option<i64>,
    seeker_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking: Booking,
}

#[derive(Debug, Serialize)]
struct BookingsResponse {
    bookings: Vec<Booking>,
}

#[derive(Debug, Serialize)]
struct PaymentsResponse {
    payments: Vec<Payment>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/payments", get(booking_payments))
        .route_layer(from_fn_with_state(state, session_middleware))
}

/// POST /bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.services()?.ledger.create(claims.user_id, req).await?;
    Ok(Json(BookingResponse { booking }))
}

/// GET /bookings?providerId=|seekerId=
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiQuery(query): ApiQuery<ListBookingsQuery>,
) -> Result<Json<BookingsResponse>, AppError> {
    let filter = BookingFilter::from_params(query.seeker_id, query.provider_id)?;
    let bookings = state.services()?.ledger.list(claims.user_id, filter).await?;
    Ok(Json(BookingsResponse { bookings }))
}

/// GET /bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.services()?.ledger.get(claims.user_id, id).await?;
    Ok(Json(BookingResponse { booking }))
}

/// GET /bookings/{id}/payments
async fn booking_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PaymentsResponse>, AppError> {
    let payments = state.services()?.ledger.payments(claims.user_id, id).await?;
    Ok(Json(PaymentsResponse { payments }))
}
