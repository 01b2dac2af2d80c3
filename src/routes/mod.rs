/// Router Module Index
///
/// Splits the `/api/v1` surface by access tier. Each tier's access check is applied
/// as a route layer in `create_router`, never inside the handlers.

/// Routes open to anonymous clients: registration and login.
pub mod public;

/// Routes behind `require_auth`. Handlers receive the resolved `AuthContext`.
pub mod authenticated;

/// Routes behind `require_auth` and `require_admin`.
pub mod admin;
