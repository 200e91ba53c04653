use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use eventor_core::messages::{Message, NewMessage};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{session_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    recipient_id: i64,
    content: String,
    booking_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationQuery {
    with_user_id: i64,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: Message,
}

#[derive(Debug, Serialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/messages", get(conversation).post(send_message))
        .route_layer(from_fn_with_state(state, session_middleware))
}

/// POST /messages
async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let message = NewMessage::new(claims.user_id, req.recipient_id, req.booking_id, &req.content)?;
    let services = state.services()?;
    if services.store.users.find_by_id(req.recipient_id).await?.is_none() {
        return Err(AppError::ValidationError(format!(
            "Recipient {} does not exist",
            req.recipient_id
        )));
    }
    if let Some(booking_id) = req.booking_id {
        // Only parties to the booking may attach it.
        services.ledger.get(claims.user_id, booking_id).await?;
    }

    let message = services.store.messages.send_message(message).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// GET /messages?withUserId=
async fn conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiQuery(query): ApiQuery<ConversationQuery>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .services()?
        .store
        .messages
        .conversation(claims.user_id, query.with_user_id)
        .await?;
    Ok(Json(MessagesResponse { messages }))
}
