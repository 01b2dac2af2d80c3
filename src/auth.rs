use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::{ApiError, ErrorCode},
    models::User,
    repository::RepositoryState,
    security::CredentialsState,
};

/// AuthContext
///
/// The resolved identity of an authenticated request: the raw bearer token and the
/// user it belongs to. Lives only for the duration of the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: String,
    pub user: User,
}

/// authenticate
///
/// Runs the bearer-token state machine against the request headers:
///
/// 1. No header, or a value that is not visible ASCII: `AUTH_MISSING`.
/// 2. Scheme other than `bearer` (any case): `AUTH_WRONG_TYPE`.
/// 3. Nothing after the scheme: `AUTH_TOKEN_MISSING`.
/// 4. Bad signature or expired: `AUTH_TOKEN_INVALID`.
/// 5. Token names a user that no longer exists: `AUTH_TOKEN_INVALID`.
///
/// All rejections are 401.
pub async fn authenticate(
    repo: &RepositoryState,
    credentials: &CredentialsState,
    headers: &HeaderMap,
) -> Result<AuthContext, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized(ErrorCode::AuthMissing))?;

    let mut segments = header_value.split(' ');
    let scheme = segments.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Unauthorized(ErrorCode::AuthWrongType));
    }

    let token = segments.next().unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::Unauthorized(ErrorCode::AuthTokenMissing));
    }

    if !credentials.is_valid_token(token) {
        return Err(ApiError::Unauthorized(ErrorCode::AuthTokenInvalid));
    }

    let data = credentials
        .extract_data_from_token(token)
        .map_err(|_| ApiError::Unauthorized(ErrorCode::AuthTokenInvalid))?;

    // The user may have disappeared after the token was issued.
    let user = repo
        .find_user(data.id)
        .await?
        .ok_or(ApiError::Unauthorized(ErrorCode::AuthTokenInvalid))?;

    Ok(AuthContext {
        token: token.to_owned(),
        user,
    })
}

/// AuthContext Extractor Implementation
///
/// Handlers take `AuthContext` as an argument. Behind `require_auth` the context is
/// already attached to the request and is simply read back; anywhere else the
/// extractor authenticates the request itself.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    CredentialsState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let credentials = CredentialsState::from_ref(state);
        authenticate(&repo, &credentials, &parts.headers).await
    }
}

/// require_auth
///
/// Route layer for every protected route. Rejects the request before the handler
/// runs, or attaches the resolved `AuthContext` for the stages after it.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = authenticate(&state.repo, &state.credentials, request.headers()).await?;
    tracing::debug!(user_id = ctx.user.id, "request authenticated");
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// require_admin
///
/// Route layer for admin-only routes; only meaningful behind `require_auth`.
/// A missing context or a non-admin user is rejected with 403 `UNAUTHORIZED`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<AuthContext>()
        .is_some_and(|ctx| ctx.user.is_admin());

    if !is_admin {
        return Err(ApiError::Forbidden(ErrorCode::Unauthorized));
    }
    Ok(next.run(request).await)
}
