pub mod auth;

pub use auth::{admin_middleware, session_middleware, SessionClaims};
