use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Routes reserved for `admin` users. A non-admin with a valid token is turned
/// away with 403 `UNAUTHORIZED` before the handler runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /users
        // Creates a user of either type. Shares the path with the authenticated
        // GET /users; the method routers are merged in `create_router`.
        .route("/users", post(handlers::create_user_as_admin))
}
