//! Request handlers, grouped by resource.
//!
//! Every handler returns `ApiResult`, so failures reach the client through the
//! single `ApiError` responder.

pub mod posts;
pub mod users;

pub use posts::{create_post, delete_post, get_post, update_post};
pub use users::{create_user_as_admin, list_users, login_user, register_user};
