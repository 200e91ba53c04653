use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use eventor_core::users::{User, UserType};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

pub const SESSION_COOKIE: &str = "eventor_session";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn for_user(user: &User, session_days: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            email: user.email.clone(),
            user_type: user.user_type,
            iat: now.timestamp(),
            exp: (now + Duration::days(session_days)).timestamp(),
        }
    }
}

pub fn issue_token(claims: &SessionClaims, secret: &str) -> Result<String, AppError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, AppError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("Invalid or expired session".to_string()))
}

// ============================================================================
// Session Cookie
// ============================================================================

pub fn session_cookie(token: String, auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .max_age(time::Duration::days(auth.session_days))
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// A bearer header wins over the cookie when both are present.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

pub fn authenticate(headers: &HeaderMap, auth: &AuthConfig) -> Result<SessionClaims, AppError> {
    let token = session_token(headers)
        .ok_or_else(|| AppError::AuthenticationError("Not authenticated".to_string()))?;
    verify_token(&token, &auth.secret)
}

// ============================================================================
// Session Middleware
// ============================================================================

pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(req.headers(), &state.auth)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin Middleware
// ============================================================================

pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(req.headers(), &state.auth)?;
    if !state.is_admin(&claims.email) {
        tracing::warn!(user_id = claims.user_id, "Admin route denied");
        return Err(AppError::AuthorizationError("Admin access required".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
