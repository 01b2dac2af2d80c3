use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthContext,
    error::{ApiError, ApiResult, ErrorBody, ErrorCode},
    extract::ApiJson,
    models::{
        CreateUserRequest, LoginRequest, NewUser, RegisterUserRequest, TokenResponse,
        UserSummary, UserType,
    },
    repository::{USERS_EMAIL_KEY, USERS_NAME_KEY, unique_violation},
    security::TokenData,
    validation::{sanitize_email, sanitize_password, sanitize_username},
};

/// Validated registration input, ready for `create_user`.
struct UserInput {
    name: String,
    email: String,
    password: String,
    user_type: UserType,
}

/// Checks name, email and password in that order and reports the first failing field.
fn validate_user_input(
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    user_type: UserType,
) -> ApiResult<UserInput> {
    if !sanitize_username(name.as_deref()) {
        return Err(ApiError::BadRequest(ErrorCode::BadUsername));
    }
    if !sanitize_email(email.as_deref()) {
        return Err(ApiError::BadRequest(ErrorCode::BadEmail));
    }
    if !sanitize_password(password.as_deref()) {
        return Err(ApiError::BadRequest(ErrorCode::BadPassword));
    }
    Ok(UserInput {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
        user_type,
    })
}

/// create_user
///
/// Shared by registration and admin creation: rejects a taken name (checked first)
/// or email, hashes the password and inserts the record. The store's unique
/// constraints catch registrations that race past the lookup.
async fn create_user(state: &AppState, input: UserInput) -> ApiResult<()> {
    if let Some(similar) = state
        .repo
        .find_user_by_name_or_email(&input.name, &input.email)
        .await?
    {
        if similar.name == input.name {
            return Err(ApiError::BadRequest(ErrorCode::NameAlreadyUsed));
        }
        if similar.email == input.email {
            return Err(ApiError::BadRequest(ErrorCode::EmailAlreadyUsed));
        }
    }

    let password_hash = state.credentials.hash_password(&input.password).await?;

    let new_user = NewUser {
        name: input.name,
        email: input.email,
        password_hash,
        user_type: input.user_type,
    };

    match state.repo.create_user(new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, user_type = ?user.user_type, "user created");
            Ok(())
        }
        Err(e) => match unique_violation(&e).as_deref() {
            Some(USERS_NAME_KEY) => Err(ApiError::BadRequest(ErrorCode::NameAlreadyUsed)),
            Some(USERS_EMAIL_KEY) => Err(ApiError::BadRequest(ErrorCode::EmailAlreadyUsed)),
            _ => Err(e.into()),
        },
    }
}

/// list_users
///
/// [Authenticated Route] Admins see every user with ids; everyone else sees
/// name and email of non-admin users only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserSummary]),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn list_users(
    AuthContext { user, .. }: AuthContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let is_admin = user.is_admin();
    let users = state.repo.list_users(is_admin).await?;

    let summaries = users
        .into_iter()
        .map(|u| UserSummary {
            id: is_admin.then_some(u.id),
            name: u.name,
            email: u.email,
        })
        .collect();
    Ok(Json(summaries))
}

/// create_user_as_admin
///
/// [Admin Route] Creates a user of any type. Access is enforced by `require_admin`.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 204, description = "Created"),
        (status = 400, description = "Invalid or duplicate field", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn create_user_as_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<StatusCode> {
    let input = validate_user_input(
        payload.name,
        payload.email,
        payload.password,
        payload.user_type,
    )?;
    create_user(&state, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// register_user
///
/// [Public Route] Self-service sign-up. The account is always a blogger.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 204, description = "Registered"),
        (status = 400, description = "Invalid or duplicate field", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<StatusCode> {
    let input = validate_user_input(
        payload.name,
        payload.email,
        payload.password,
        UserType::Blogger,
    )?;
    create_user(&state, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// login_user
///
/// [Public Route] Exchanges email and password for a bearer token. An unknown
/// email and a wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed email or password", body = ErrorBody),
        (status = 401, description = "Wrong credentials", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if !sanitize_email(payload.email.as_deref()) {
        return Err(ApiError::BadRequest(ErrorCode::BadEmail));
    }
    if !sanitize_password(payload.password.as_deref()) {
        return Err(ApiError::BadRequest(ErrorCode::BadPassword));
    }
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        tracing::warn!("login with unknown email");
        return Err(ApiError::Unauthorized(ErrorCode::EmailOrPasswordIncorrect));
    };

    if !state
        .credentials
        .check_password(&password, &user.password_hash)
        .await?
    {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(ApiError::Unauthorized(ErrorCode::EmailOrPasswordIncorrect));
    }

    let token = state.credentials.generate_token(TokenData { id: user.id })?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}
