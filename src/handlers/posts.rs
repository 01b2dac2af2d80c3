use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
};

use crate::{
    AppState,
    auth::AuthContext,
    error::{ApiError, ApiResult, ErrorBody, ErrorCode},
    extract::{ApiJson, ApiQuery},
    models::{
        CreatePostRequest, CreatedPostResponse, DeletePostRequest, NewPost, Post, PostChanges,
        PostQuery, PostView, UpdatePostRequest,
    },
};

fn post_not_found(method: Method, uri: &OriginalUri) -> ApiError {
    ApiError::NotFound {
        code: ErrorCode::PostNotFound,
        method,
        path: uri.0.path().to_owned(),
    }
}

async fn load_post(
    state: &AppState,
    id: i32,
    method: Method,
    uri: &OriginalUri,
) -> ApiResult<Post> {
    state
        .repo
        .find_post(id)
        .await?
        .ok_or_else(|| post_not_found(method, uri))
}

/// get_post
///
/// [Authenticated Route] Hidden posts are readable by their author only.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PostQuery),
    responses(
        (status = 200, description = "Post found", body = PostView),
        (status = 400, description = "Missing or non-numeric id", body = ErrorBody),
        (status = 401, description = "Not authenticated or private post", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn get_post(
    AuthContext { user, .. }: AuthContext,
    State(state): State<AppState>,
    method: Method,
    uri: OriginalUri,
    ApiQuery(query): ApiQuery<PostQuery>,
) -> ApiResult<Json<PostView>> {
    let post = load_post(&state, query.id, method, &uri).await?;

    if post.is_hidden && post.author_id != user.id {
        return Err(ApiError::Unauthorized(ErrorCode::PrivatePost));
    }
    Ok(Json(post.into()))
}

/// create_post
///
/// [Authenticated Route] The requester becomes the author.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = CreatedPostResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn create_post(
    AuthContext { user, .. }: AuthContext,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<Json<CreatedPostResponse>> {
    let post = state
        .repo
        .create_post(NewPost {
            author_id: user.id,
            title: payload.title,
            content: payload.content,
            is_hidden: payload.is_hidden,
        })
        .await?;

    tracing::info!(post_id = post.id, author_id = user.id, "post created");
    Ok(Json(CreatedPostResponse { id: post.id }))
}

/// update_post
///
/// [Authenticated Route] Only the author may edit; omitted fields keep their value.
#[utoipa::path(
    put,
    path = "/api/v1/posts",
    request_body = UpdatePostRequest,
    responses(
        (status = 204, description = "Post updated"),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Not authenticated or not the author", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn update_post(
    AuthContext { user, .. }: AuthContext,
    State(state): State<AppState>,
    method: Method,
    uri: OriginalUri,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> ApiResult<StatusCode> {
    let post = load_post(&state, payload.id, method.clone(), &uri).await?;

    if post.author_id != user.id {
        return Err(ApiError::Unauthorized(ErrorCode::Unauthorized));
    }

    let changes = PostChanges {
        title: payload.title,
        content: payload.content,
        is_hidden: payload.is_hidden,
    };
    // Deleted between the lookup and the write.
    if !state.repo.update_post(post.id, changes).await? {
        return Err(post_not_found(method, &uri));
    }

    tracing::info!(post_id = post.id, "post updated");
    Ok(StatusCode::NO_CONTENT)
}

/// delete_post
///
/// [Authenticated Route] Authors may delete their posts and admins may delete
/// visible posts of others. The checks run in this order:
///
/// 1. Neither the author nor an admin: `UNAUTHORIZED`.
/// 2. An admin and the post is hidden: `UNAUTHORIZED`, even for the admin's own post.
#[utoipa::path(
    delete,
    path = "/api/v1/posts",
    request_body = DeletePostRequest,
    responses(
        (status = 204, description = "Post deleted"),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Not allowed to delete", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn delete_post(
    AuthContext { user, .. }: AuthContext,
    State(state): State<AppState>,
    method: Method,
    uri: OriginalUri,
    ApiJson(payload): ApiJson<DeletePostRequest>,
) -> ApiResult<StatusCode> {
    let post = load_post(&state, payload.id, method.clone(), &uri).await?;

    let is_author = post.author_id == user.id;
    if !is_author && !user.is_admin() {
        return Err(ApiError::Unauthorized(ErrorCode::Unauthorized));
    }
    if user.is_admin() && post.is_hidden {
        return Err(ApiError::Unauthorized(ErrorCode::Unauthorized));
    }

    if !state.repo.delete_post(post.id).await? {
        return Err(post_not_found(method, &uri));
    }

    tracing::info!(post_id = post.id, user_id = user.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
