/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers
/// and extractors), preventing accidental exposure of protected endpoints.

/// Routes accessible without a session: home, health, and the
/// register/login/logout identity flow.
pub mod public;

/// Routes requiring a valid session, enforced by the `CurrentUser` layer.
/// Ownership checks (own profile deletion, adding under one's own profile)
/// happen inside the handlers.
pub mod authenticated;

/// Per-row feedback mutation routes. NOT wrapped by the session layer: the
/// ownership check needs the loaded row first, and its permission flash must
/// fire for anonymous visitors too.
pub mod feedback;
