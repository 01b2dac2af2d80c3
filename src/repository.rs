use crate::models::{NewPost, NewUser, Post, PostChanges, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// Abstract contract for all persistence operations over `users` and `posts`.
/// Handlers only see this trait, so tests can swap in an in-memory implementation.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn Repository>` across
/// Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, id: i32) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // Returns a user sharing the name or the email, preferring a name match.
    async fn find_user_by_name_or_email(&self, name: &str, email: &str)
    -> RepoResult<Option<User>>;
    // All users ordered by id; admins are skipped unless `include_admins`.
    async fn list_users(&self, include_admins: bool) -> RepoResult<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Posts ---
    async fn find_post(&self, id: i32) -> RepoResult<Option<Post>>;
    async fn create_post(&self, post: NewPost) -> RepoResult<Post>;
    // Returns false when no row matched.
    async fn update_post(&self, id: i32, changes: PostChanges) -> RepoResult<bool>;
    async fn delete_post(&self, id: i32) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Unique constraint names from the initial migration.
pub const USERS_NAME_KEY: &str = "users_name_key";
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Name of the unique constraint an insert tripped over, if that is what failed.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            db.constraint().map(str::to_owned)
        }
        _ => None,
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, type";
const POST_COLUMNS: &str = "id, author_id, title, content, is_hidden, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, id: i32) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// find_user_by_name_or_email
    ///
    /// Two different rows can match (one by name, one by email); ordering on the
    /// name comparison makes the name conflict win deterministically.
    async fn find_user_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE name = $1 OR email = $2
            ORDER BY (name = $1) DESC, id ASC
            LIMIT 1
            "#
        ))
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_users(&self, include_admins: bool) -> RepoResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE $1 OR type <> 'admin' ORDER BY id ASC"
        ))
        .bind(include_admins)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, type)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.user_type)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_post(&self, id: i32) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (author_id, title, content, is_hidden, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.author_id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.is_hidden)
        .fetch_one(&self.pool)
        .await
    }

    /// update_post
    ///
    /// Uses COALESCE so only the fields present in `changes` are written.
    async fn update_post(&self, id: i32, changes: PostChanges) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                is_hidden = COALESCE($4, is_hidden),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.is_hidden)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
