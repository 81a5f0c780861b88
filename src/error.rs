use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

/// AppError
///
/// The application's failure taxonomy. Validation failures never reach this type
/// (they are re-rendered as inline form errors), and authorization failures are
/// expressed as flash-carrying redirects. What remains:
///
/// - `DuplicateUser`: the `users` primary key rejected an insert. The register
///   handler recovers from this locally; the 400 mapping below is a fallback.
/// - `NotFound`: unknown username or feedback id, shown as a 404 page.
/// - `Store`: connectivity/transaction failure from the backing store. Not
///   recoverable per request; logged and mapped to a generic 500 page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("username already taken")]
    DuplicateUser,

    #[error("resource not found")]
    NotFound,

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::DuplicateUser => {
                (StatusCode::BAD_REQUEST, "username already taken").into_response()
            }
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response()
            }
            AppError::Store(e) => {
                // The underlying cause goes to the log, never to the client.
                tracing::error!("store failure: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error_page())).into_response()
            }
        }
    }
}
