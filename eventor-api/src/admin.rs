use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use eventor_core::commission::{CommissionSetting, NewCommissionSetting};
use eventor_core::stats::AdminStats;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::{admin_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SettingsResponse {
    settings: CommissionSetting,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/commission-settings",
            get(get_commission_settings).post(update_commission_settings),
        )
        .route("/admin/stats", get(get_stats))
        .route_layer(from_fn_with_state(state, admin_middleware))
}

/// GET /admin/commission-settings
async fn get_commission_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state.services()?.commission.current().await?;
    Ok(Json(SettingsResponse { settings }))
}

/// POST /admin/commission-settings
async fn update_commission_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(req): ApiJson<NewCommissionSetting>,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state.services()?.commission.update(req).await?;
    info!(admin = %claims.email, setting_id = settings.id, "Commission settings changed");
    Ok(Json(SettingsResponse { settings }))
}

/// GET /admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    let stats = state.services()?.admin.stats().await?;
    Ok(Json(stats))
}
