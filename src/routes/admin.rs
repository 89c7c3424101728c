use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to the `admin` role: destructive
/// content operations, taxonomy management, and user administration. The
/// `{admin}` role set is bound to this router in `create_router` via a
/// `role_gate` route layer; there is no in-handler admin check to forget.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // DELETE /posts/{id}
        // Removes a post and its tag links.
        .route("/posts/{id}", delete(handlers::delete_post))
        // Category management. Reads stay in the authenticated tier; every
        // mutation of the taxonomy is admin-only.
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // Tag management, same split as categories.
        .route("/tags", post(handlers::create_tag))
        .route(
            "/tags/{id}",
            put(handlers::update_tag).delete(handlers::delete_tag),
        )
        // User administration: full listing and account removal.
        .route("/users", get(handlers::get_users))
        .route("/users/{id}", delete(handlers::delete_user))
}
