use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines endpoints that are accessible without a session: the identity flow
/// and the health probe. The register and login handlers redirect visitors who
/// already hold a valid session to their own profile.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // No landing page; everything starts at registration.
        .route("/", get(handlers::home))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET/POST /register
        // New account creation. On success the visitor is logged in and sent
        // to their profile; a duplicate username re-renders the form.
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register_submit),
        )
        // GET/POST /login
        // Credential verification. Failure shows one generic message for
        // unknown users and wrong passwords alike.
        .route(
            "/login",
            get(handlers::login_form).post(handlers::login_submit),
        )
        // GET /logout
        // Clears the session cookie. There is no server-side session state
        // to revoke.
        .route("/logout", get(handlers::logout))
}
