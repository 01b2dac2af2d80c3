#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, header},
};
use blog_backend::{
    AppConfig, AppState,
    models::{NewPost, NewUser, Post, PostChanges, User, UserType},
    repository::{RepoResult, Repository, RepositoryState, USERS_EMAIL_KEY, USERS_NAME_KEY},
    security::TokenData,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::error::{DatabaseError, ErrorKind};
use std::{
    error::Error as StdError,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

// --- Unique Violation ---

/// What Postgres reports when an insert breaks a named UNIQUE constraint.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"{constraint}\"")]
pub struct UniqueViolation {
    constraint: &'static str,
}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

fn unique_violation(constraint: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
}

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    next_user_id: i32,
    next_post_id: i32,
}

/// Vec-backed `Repository`. Inserting a user whose name or email is taken fails
/// with the same named constraint violation as the Postgres schema, name first.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    stale_lookups: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn post(&self, id: i32) -> Option<Post> {
        let tables = self.tables.lock().unwrap();
        tables.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn user_type_of(&self, email: &str) -> Option<UserType> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.user_type)
    }

    /// Makes `find_user_by_name_or_email` miss, as when a concurrent registration
    /// commits between the lookup and the insert.
    pub fn set_stale_lookups(&self, stale: bool) {
        self.stale_lookups.store(stale, Ordering::SeqCst);
    }

    /// Removes a user directly, as if deleted behind the API's back.
    pub fn remove_user(&self, id: i32) {
        self.tables.lock().unwrap().users.retain(|u| u.id != id);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user(&self, id: i32) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_name_or_email(
        &self,
        name: &str,
        email: &str,
    ) -> RepoResult<Option<User>> {
        if self.stale_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let tables = self.tables.lock().unwrap();
        let by_name = tables.users.iter().find(|u| u.name == name);
        Ok(by_name
            .or_else(|| tables.users.iter().find(|u| u.email == email))
            .cloned())
    }

    async fn list_users(&self, include_admins: bool) -> RepoResult<Vec<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|u| include_admins || u.user_type != UserType::Admin)
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.name == user.name) {
            return Err(unique_violation(USERS_NAME_KEY));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(unique_violation(USERS_EMAIL_KEY));
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            user_type: user.user_type,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_post(&self, id: i32) -> RepoResult<Option<Post>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: tables.next_post_id,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            is_hidden: post.is_hidden,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(is_hidden) = changes.is_hidden {
            post.is_hidden = is_hidden;
        }
        post.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_post(&self, id: i32) -> RepoResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() != before)
    }
}

// --- State & Fixtures ---

pub fn test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState::new(repo as RepositoryState, AppConfig::default())
}

/// Inserts a user with a real bcrypt hash of `password` and returns it with a
/// freshly signed token.
pub async fn seed_user(
    state: &AppState,
    name: &str,
    user_type: UserType,
    password: &str,
) -> (User, String) {
    let password_hash = state.credentials.hash_password(password).await.unwrap();
    let user = state
        .repo
        .create_user(NewUser {
            name: name.to_string(),
            email: format!("{name}@test.com"),
            password_hash,
            user_type,
        })
        .await
        .unwrap();
    let token = state
        .credentials
        .generate_token(TokenData { id: user.id })
        .unwrap();
    (user, token)
}

pub async fn seed_post(state: &AppState, author_id: i32, is_hidden: bool) -> Post {
    state
        .repo
        .create_post(NewPost {
            author_id,
            title: "Title".to_string(),
            content: "Content".to_string(),
            is_hidden,
        })
        .await
        .unwrap()
}

// --- Request Helpers ---

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
