use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// UserType
///
/// The RBAC field of a user, stored as the Postgres enum `user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[ts(export)]
pub enum UserType {
    Blogger,
    Admin,
}

/// User
///
/// The canonical identity record from the `users` table.
/// The password hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    // 'type' is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    pub user_type: UserType,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

/// Post
///
/// A content record from the `posts` table, owned by `author_id`.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewUser
///
/// Insert payload handed to the repository once validation and hashing are done.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
}

/// NewPost
///
/// Insert payload for a post; the author is always the requester.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i32,
    pub title: String,
    pub content: String,
    pub is_hidden: bool,
}

/// PostChanges
///
/// Partial update of a post. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_hidden: Option<bool>,
}

// --- Request Payloads (Input Schemas) ---

/// Accepts any JSON value and keeps it only if it is a string, so a mistyped
/// credential field fails validation with its own code instead of failing the body.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /api/v1/users/register).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

/// CreateUserRequest
///
/// Admin-only payload (POST /api/v1/users); unlike registration the role is chosen by the caller.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /api/v1/users/login.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

/// CreatePostRequest
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// UpdatePostRequest
///
/// Omitted fields are left unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub id: i32,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_hidden: Option<bool>,
}

/// DeletePostRequest
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeletePostRequest {
    pub id: i32,
}

/// PostQuery
///
/// Query string of GET /api/v1/posts.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostQuery {
    /// Post ID
    pub id: i32,
}

// --- Response Schemas (Output) ---

/// TokenResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

/// CreatedPostResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreatedPostResponse {
    pub id: i32,
}

/// PostView
///
/// The public projection of a post returned by GET /api/v1/posts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostView {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub content: String,
    pub is_hidden: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            author_id: post.author_id,
            content: post.content,
            is_hidden: post.is_hidden,
            created_at: post.created_at,
        }
    }
}

/// UserSummary
///
/// One entry of the user listing. The id is only disclosed to admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<i32>,
    pub name: String,
    pub email: String,
}
