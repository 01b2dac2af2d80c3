use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any user holding a valid token. Ownership and visibility rules
/// (author-only edits, hidden posts) are enforced per handler against the
/// `AuthContext` attached by `require_auth`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users
        // Admins get every user with ids; others get name and email of bloggers only.
        .route("/users", get(handlers::list_users))
        // GET /posts?id=  POST /posts  PUT /posts  DELETE /posts
        // Post lifecycle. The post id travels in the query (GET) or the JSON body.
        .route(
            "/posts",
            get(handlers::get_post)
                .post(handlers::create_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
}
