use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Feedback Mutation Router Module
///
/// Per-row edit and delete routes, addressed by feedback id. These are NOT
/// behind the blanket session layer: the contract is 404-before-ownership
/// (the row must be loaded first), and a failed ownership check answers with
/// the permission flash routed through the login page, for logged-in
/// non-owners and anonymous visitors alike.
pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /feedback/{id}/update
        // Edit form and submission, owner only. Unknown ids are a 404.
        .route(
            "/feedback/{id}/update",
            get(handlers::edit_feedback_form).post(handlers::edit_feedback_submit),
        )
        // POST /feedback/{id}/delete
        // Row deletion, owner only. Unknown ids are a 404.
        .route("/feedback/{id}/delete", post(handlers::delete_feedback))
}
