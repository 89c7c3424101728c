use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Public Router Module
///
/// Defines the endpoints reachable without credentials: the two entry points of
/// the registration/login flow. These bypass both middlewares deliberately: a
/// client cannot hold a token before logging in.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /auth/register
        // Creates an account at the lowest privilege role. Returns 201 on
        // success, 409 when the identifier is taken. No token is issued.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Verifies credentials and returns a fresh signed bearer token.
        // Unknown identifier and wrong password are indistinguishable (401).
        .route("/auth/login", post(handlers::login))
}
