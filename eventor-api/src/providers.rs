use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Json, Router,
};
use eventor_core::directory::{NewService, ProviderProfile, ProviderProfileUpdate, ProviderSearch, Service};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{session_middleware, SessionClaims};
use crate::state::{AppState, Services};

#[derive(Debug, Serialize)]
struct ProvidersResponse {
    providers: Vec<ProviderProfile>,
}

#[derive(Debug, Serialize)]
struct ProviderDetailResponse {
    provider: ProviderProfile,
    services: Vec<Service>,
}

#[derive(Debug, Serialize)]
struct ProviderResponse {
    provider: ProviderProfile,
}

#[derive(Debug, Serialize)]
struct ServiceResponse {
    service: Service,
}

#[derive(Debug, Deserialize)]
struct AddServiceRequest {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    category: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let own_profile = Router::new()
        .route("/providers/me", put(update_my_profile))
        .route("/providers/me/services", post(add_service))
        .route_layer(from_fn_with_state(state, session_middleware));

    Router::new()
        .route("/providers", get(search_providers))
        .route("/providers/{id}", get(get_provider))
        .merge(own_profile)
}

async fn my_profile(services: &Services, claims: &SessionClaims) -> Result<ProviderProfile, AppError> {
    services
        .store
        .providers
        .profile_for_user(claims.user_id)
        .await?
        .ok_or_else(|| AppError::AuthorizationError("Only providers can manage a provider profile".to_string()))
}

/// GET /providers?category=&city=&q=
async fn search_providers(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<ProviderSearch>,
) -> Result<Json<ProvidersResponse>, AppError> {
    let providers = state
        .services()?
        .store
        .providers
        .search_profiles(&search.normalized())
        .await?;
    Ok(Json(ProvidersResponse { providers }))
}

/// GET /providers/{id}
async fn get_provider(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProviderDetailResponse>, AppError> {
    let services = state.services()?;
    let provider = services
        .store
        .providers
        .get_profile(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Provider {} not found", id)))?;
    let offered = services.store.providers.list_services(provider.id).await?;

    Ok(Json(ProviderDetailResponse {
        provider,
        services: offered,
    }))
}

/// PUT /providers/me
async fn update_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(update): ApiJson<ProviderProfileUpdate>,
) -> Result<Json<ProviderResponse>, AppError> {
    update.validate()?;
    let services = state.services()?;
    let profile = my_profile(services, &claims).await?;

    let provider = services
        .store
        .providers
        .update_profile(profile.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Provider {} not found", profile.id)))?;
    info!(provider_id = provider.id, "Provider profile updated");
    Ok(Json(ProviderResponse { provider }))
}

/// POST /providers/me/services
async fn add_service(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(req): ApiJson<AddServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), AppError> {
    let services = state.services()?;
    let profile = my_profile(services, &claims).await?;
    let new_service = NewService::new(
        profile.id,
        req.name,
        req.description,
        req.price,
        req.category,
        &profile.category,
    )?;

    let service = services.store.providers.add_service(new_service).await?;
    info!(provider_id = profile.id, service_id = service.id, "Service added");
    Ok((StatusCode::CREATED, Json(ServiceResponse { service })))
}
