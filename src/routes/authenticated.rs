use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any request that passed the authentication
/// layer, regardless of role: the read-only content surface plus self-service
/// account update. The authentication layer itself is applied in
/// `create_router`, over this router and the editorial/admin routers together.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // --- Content reads ---
        // GET /posts?published=...&category_id=...
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Detail view with tags embedded.
        .route("/posts/{id}", get(handlers::get_post))
        // GET /categories, /categories/{id}
        .route("/categories", get(handlers::get_categories))
        .route("/categories/{id}", get(handlers::get_category))
        // GET /tags, /tags/{id}
        .route("/tags", get(handlers::get_tags))
        .route("/tags/{id}", get(handlers::get_tag))
        // --- Accounts ---
        // GET /users/{id}
        // Public projection only; the hash never serializes.
        .route("/users/{id}", get(handlers::get_user))
        // PUT /users/{id}
        // Self-or-admin, enforced in the handler (the route itself only
        // requires authentication); role changes are additionally admin-only.
        .route("/users/{id}", put(handlers::update_user))
}
