use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
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
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Editorial, Admin).
pub mod routes;
use routes::{admin, authenticated, editorial, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use auth::TokenCodec;
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login,
        handlers::get_posts, handlers::get_post, handlers::create_post,
        handlers::update_post, handlers::delete_post,
        handlers::get_categories, handlers::get_category, handlers::create_category,
        handlers::update_category, handlers::delete_category,
        handlers::get_tags, handlers::get_tag, handlers::create_tag,
        handlers::update_tag, handlers::delete_tag,
        handlers::get_users, handlers::get_user, handlers::update_user,
        handlers::delete_user
    ),
    components(
        schemas(
            auth::Role,
            models::UserResponse, models::Post, models::Category, models::Tag,
            models::RegisterRequest, models::LoginRequest, models::TokenResponse,
            models::CreatePostRequest, models::UpdatePostRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateTagRequest, models::UpdateTagRequest,
            models::UpdateUserRequest,
        )
    ),
    tags(
        (name = "gorecta", description = "Content Management System API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding all application services and
/// configuration, shared across all incoming requests. Every member is either
/// immutable after startup (`tokens`, `config`) or internally synchronized
/// (`repo`'s connection pool), so request handling takes no locks of its own.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access behind the trait object.
    pub repo: RepositoryState,
    /// Token Codec: issues and verifies signed bearer tokens. Constructed once
    /// from the configured secret; there is no process-global signing key.
    pub tokens: TokenCodec,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow handlers and middleware to selectively pull components from the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> TokenCodec {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the
/// authentication and authorization layers at their tiers, and registers the
/// application state.
///
/// Layering: the role gates are attached to the editorial and admin routers
/// first, then the authentication middleware wraps all protected tiers, so per
/// request the order is authenticate, then gate, then handler. A request rejected by
/// the authentication layer never reaches a gate or a handler.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Protected Tier Assembly
    // Role sets are bound here, at registration time. Request-time evaluation
    // is a pure membership check against the identity the authentication
    // middleware injected.
    let protected_routes = Router::new()
        .merge(authenticated::authenticated_routes())
        .merge(
            editorial::editorial_routes().route_layer(middleware::from_fn(
                |request: Request, next: Next| auth::role_gate(auth::EDITORS, request, next),
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn(
                |request: Request, next: Next| auth::role_gate(auth::ADMINS, request, next),
            )),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // 3. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // The versioned API surface: public auth entry points plus the
        // protected tiers.
        .nest(
            "/api/v1",
            Router::new()
                .merge(public::auth_routes())
                .merge(protected_routes),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 4. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: returns x-request-id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation. It extracts the
/// `x-request-id` header (if present) and includes it in the structured
/// logging metadata alongside the HTTP method and URI, so every log line for a
/// single request is correlated by a unique ID.
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
