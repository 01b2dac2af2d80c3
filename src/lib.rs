use axum::{
    Router,
    extract::{FromRef, OriginalUri},
    http::{HeaderName, Method},
    middleware,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod security;
pub mod validation;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use repository::{PostgresRepository, RepositoryState};
pub use security::{Credentials, CredentialsState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and request/response schema into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::register_user, handlers::users::login_user,
        handlers::users::list_users, handlers::users::create_user_as_admin,
        handlers::posts::get_post, handlers::posts::create_post,
        handlers::posts::update_post, handlers::posts::delete_post,
    ),
    components(
        schemas(
            models::UserType, models::RegisterUserRequest, models::CreateUserRequest,
            models::LoginRequest, models::TokenResponse, models::UserSummary,
            models::CreatePostRequest, models::UpdatePostRequest, models::DeletePostRequest,
            models::CreatedPostResponse, models::PostView,
            error::ErrorBody, error::ErrorCode,
        )
    ),
    tags(
        (name = "blog-backend", description = "Blog users and posts API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users and posts.
    pub repo: RepositoryState,
    /// Password hashing and token signing, keyed by the configured secret.
    pub credentials: CredentialsState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the credential service from `config` and bundles it with `repo`.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let credentials = std::sync::Arc::new(Credentials::new(&config));
        Self {
            repo,
            credentials,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for CredentialsState {
    fn from_ref(app_state: &AppState) -> CredentialsState {
        app_state.credentials.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree, applies the tiered access layers and the
/// observability stack, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly
    // Layers added later run first, so on admin routes `require_auth` attaches the
    // context before `require_admin` inspects it.
    let api_router = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn(auth::require_admin))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_auth,
                )),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Liveness probe for load balancers; no state is touched.
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api_router)
        .fallback(route_not_found)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing, correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// Fallback for any path no router matched.
async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound {
        code: ErrorCode::NotFound,
        method,
        path: uri.path().to_owned(),
    }
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its method,
/// URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
