use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod payments;
pub mod providers;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes(state.clone()))
        .merge(bookings::routes(state.clone()))
        .merge(payments::routes(state.clone()))
        .merge(admin::routes(state.clone()))
        .merge(providers::routes(state.clone()))
        .merge(messages::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness only; does not touch the database.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let store = if state.services.is_some() { "up" } else { "unconfigured" };
    Json(json!({ "status": "ok", "store": store }))
}
