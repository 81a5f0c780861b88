use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any visitor holding a valid session.
/// This module is wrapped by the session layer in `create_router`, so an
/// anonymous request is redirected to the login page before any handler runs.
///
/// Access Control Strategy:
/// Every handler here also extracts `CurrentUser` itself and performs its own
/// ownership comparison where the route mutates user-scoped data (deleting an
/// account, adding feedback under a profile). The layer guarantees identity;
/// the handlers decide what that identity may touch.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/{username}
        // Profile page with the user's feedback list. Any logged-in user may
        // view any profile; unknown usernames are a 404.
        .route("/users/{username}", get(handlers::user_profile))
        // POST /users/{username}/delete
        // Self-service account removal, owner only. Cascades to the user's
        // feedback rows and clears the session.
        .route("/users/{username}/delete", post(handlers::delete_user))
        // GET/POST /users/{username}/feedback/add
        // Feedback creation under one's own profile, owner only.
        .route(
            "/users/{username}/feedback/add",
            get(handlers::add_feedback_form).post(handlers::add_feedback_submit),
        )
        // GET/POST /feedback
        // The session user's own feedback list with inline submission; the
        // owner is always the session identity.
        .route(
            "/feedback",
            get(handlers::feedback_index).post(handlers::feedback_submit),
        )
}
