use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Editorial Router Module
///
/// Post-authoring routes, permitted to the `admin` and `editor` roles. The
/// allowed-role set is bound to this router in `create_router` via a
/// `role_gate` route layer; the handlers themselves perform no role checks.
pub fn editorial_routes() -> Router<AppState> {
    Router::new()
        // POST /posts
        // Submits a new post. The author is the verified identity.
        .route("/posts", post(handlers::create_post))
        // PUT /posts/{id}
        // Partial update, including the tag set.
        .route("/posts/{id}", put(handlers::update_post))
}
