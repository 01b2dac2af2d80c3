use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Public Router Module
///
/// The identity gateway: the only endpoints reachable without a bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /users/register
        // Self-service sign-up. The new account is always a `blogger`.
        .route("/users/register", post(handlers::register_user))
        // POST /users/login
        // Exchanges email and password for a token valid for the configured lifetime.
        .route("/users/login", post(handlers::login_user))
}
