use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use eventor_core::directory::{NewProviderProfile, ProviderProfile};
use eventor_core::users::{check_password_strength, normalize_email, NewUser, User, UserType};
use eventor_core::{optional_text, require_text, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::{expired_session_cookie, issue_token, session_cookie, SessionClaims};
use crate::middleware::session_middleware;
use crate::state::AppState;

const DUPLICATE_EMAIL: &str = "An account with this email already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    user_type: Option<String>,
    business_name: Option<String>,
    category: Option<String>,
    location_city: Option<String>,
    location_region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_profile: Option<ProviderProfile>,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_profile: Option<ProviderProfile>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route_layer(from_fn_with_state(state, session_middleware));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .merge(protected)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AppError::InternalServerError(format!("Salt encoding failed: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(req.email.as_deref().unwrap_or(""))?;
    let password = req.password.unwrap_or_default();
    check_password_strength(&password)?;
    let first_name = require_text("firstName", req.first_name.as_deref().unwrap_or(""))?;
    let last_name = require_text("lastName", req.last_name.as_deref().unwrap_or(""))?;
    let user_type: UserType = req.user_type.as_deref().unwrap_or("").parse()?;
    let profile = match user_type {
        UserType::Provider => Some(NewProviderProfile::new(
            req.business_name,
            req.category,
            req.location_city,
            req.location_region,
        )?),
        UserType::Seeker => None,
    };

    let services = state.services()?;
    if services.store.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::ValidationError(DUPLICATE_EMAIL.to_string()));
    }

    let new_user = NewUser {
        email,
        password_hash: hash_password(&password)?,
        first_name,
        last_name,
        phone: optional_text(req.phone),
        user_type,
    };
    // The unique index still catches a concurrent registration with the same email.
    let (user, provider_profile) = services
        .store
        .users
        .create_user(new_user, profile)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::ValidationError(DUPLICATE_EMAIL.to_string()),
            other => other.into(),
        })?;

    let token = issue_token(
        &SessionClaims::for_user(&user, state.auth.session_days),
        &state.auth.secret,
    )?;
    info!(user_id = user.id, user_type = %user.user_type, "User registered");

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(token.clone(), &state.auth)),
        Json(AuthResponse {
            user,
            provider_profile,
            token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let services = state.services()?;
    let email = normalize_email(&req.email)
        .map_err(|_| AppError::AuthenticationError(BAD_CREDENTIALS.to_string()))?;

    let user = match services.store.users.find_by_email(&email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!("Failed login attempt");
            return Err(AppError::AuthenticationError(BAD_CREDENTIALS.to_string()));
        }
    };
    let provider_profile = match user.user_type {
        UserType::Provider => services.store.providers.profile_for_user(user.id).await?,
        UserType::Seeker => None,
    };

    let token = issue_token(
        &SessionClaims::for_user(&user, state.auth.session_days),
        &state.auth.secret,
    )?;
    info!(user_id = user.id, "User logged in");

    Ok((
        jar.add(session_cookie(token.clone(), &state.auth)),
        Json(AuthResponse {
            user,
            provider_profile,
            token,
        }),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.remove(expired_session_cookie()), Json(json!({ "success": true })))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<MeResponse>, AppError> {
    let services = state.services()?;
    let user = services
        .store
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Session user no longer exists".to_string()))?;
    let provider_profile = services.store.providers.profile_for_user(user.id).await?;

    Ok(Json(MeResponse {
        user,
        provider_profile,
    }))
}
