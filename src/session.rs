use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";
/// Cookie carrying the one-shot flash message code.
pub const FLASH_COOKIE: &str = "flash";

/// Sessions expire after 24 hours. There is no server-side revocation list:
/// a token remains valid until it expires or the client clears it.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Set-Cookie value that expires the flash cookie after it has been shown.
pub const CLEAR_FLASH: &str = "flash=; Path=/; Max-Age=0";

/// Claims
///
/// Payload of the signed session token. The session carries exactly one
/// identity field: the authenticated username.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the authenticated username.
    pub sub: String,
    /// Expiration time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued at (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// issue_session
///
/// Signs a session token for `username` and returns the full Set-Cookie value.
/// The cookie is HttpOnly and SameSite=Lax; the signature is HS256 over the
/// configured session secret.
pub fn issue_session(username: &str, config: &AppConfig) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .expect("failed to sign session token");

    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECS}")
}

/// Set-Cookie value that removes the session cookie. Logging out is purely
/// client-side state removal; the token itself is not revoked.
pub fn clear_session() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// verify_token
///
/// Decodes and validates a session token, returning the username it names.
/// Every failure mode (bad signature, malformed token, expired) reads as
/// "no session".
pub fn verify_token(token: &str, config: &AppConfig) -> Option<String> {
    let decoding_key = DecodingKey::from_secret(config.session_secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims.sub),
        Err(e) => match e.kind() {
            // Token expired: the most common failure for a valid-but-old token.
            ErrorKind::ExpiredSignature => None,
            // Catch all other failure types (bad signature, malformed token, etc.).
            _ => None,
        },
    }
}

/// session_username
///
/// Reads and verifies the session cookie from a request's headers.
pub fn session_username(headers: &HeaderMap, config: &AppConfig) -> Option<String> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    verify_token(token, config)
}

fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| {
            raw.split(';').map(str::trim).find_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                (key == name).then_some(value)
            })
        })
}

// --- Flash Messages ---

/// Flash
///
/// The one-shot status messages shown on the page following a redirect. The
/// cookie stores only the short code; text and category are resolved at render
/// time, so no free text ever rides in a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Welcome,
    LoggedIn,
    LoggedOut,
    LoginRequired,
    AccountDeleted,
    FeedbackAdded,
    FeedbackSubmitted,
    FeedbackUpdated,
    FeedbackDeleted,
    FieldsRequired,
    EditDenied,
    DeleteDenied,
}

impl Flash {
    pub fn code(self) -> &'static str {
        match self {
            Flash::Welcome => "welcome",
            Flash::LoggedIn => "logged-in",
            Flash::LoggedOut => "logged-out",
            Flash::LoginRequired => "login-required",
            Flash::AccountDeleted => "account-deleted",
            Flash::FeedbackAdded => "feedback-added",
            Flash::FeedbackSubmitted => "feedback-submitted",
            Flash::FeedbackUpdated => "feedback-updated",
            Flash::FeedbackDeleted => "feedback-deleted",
            Flash::FieldsRequired => "fields-required",
            Flash::EditDenied => "edit-denied",
            Flash::DeleteDenied => "delete-denied",
        }
    }

    pub fn from_code(code: &str) -> Option<Flash> {
        match code {
            "welcome" => Some(Flash::Welcome),
            "logged-in" => Some(Flash::LoggedIn),
            "logged-out" => Some(Flash::LoggedOut),
            "login-required" => Some(Flash::LoginRequired),
            "account-deleted" => Some(Flash::AccountDeleted),
            "feedback-added" => Some(Flash::FeedbackAdded),
            "feedback-submitted" => Some(Flash::FeedbackSubmitted),
            "feedback-updated" => Some(Flash::FeedbackUpdated),
            "feedback-deleted" => Some(Flash::FeedbackDeleted),
            "fields-required" => Some(Flash::FieldsRequired),
            "edit-denied" => Some(Flash::EditDenied),
            "delete-denied" => Some(Flash::DeleteDenied),
            _ => None,
        }
    }

    /// Banner styling class, matching the two categories the pages render.
    pub fn category(self) -> &'static str {
        match self {
            Flash::LoginRequired
            | Flash::FieldsRequired
            | Flash::EditDenied
            | Flash::DeleteDenied => "danger",
            _ => "success",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::Welcome => "Welcome! You successfully created your account!",
            Flash::LoggedIn => "Successfully logged in!",
            Flash::LoggedOut => "You have been logged out.",
            Flash::LoginRequired => "Please login first to access this page!",
            Flash::AccountDeleted => "Your account has been deleted.",
            Flash::FeedbackAdded => "Feedback added!",
            Flash::FeedbackSubmitted => "Feedback submitted successfully!",
            Flash::FeedbackUpdated => "Feedback updated!",
            Flash::FeedbackDeleted => "Feedback deleted!",
            Flash::FieldsRequired => "Title and content are required.",
            Flash::EditDenied => "You do not have permission to edit this feedback.",
            Flash::DeleteDenied => "You do not have permission to delete this feedback.",
        }
    }

    /// Set-Cookie value carrying this flash to the next rendered page.
    /// Short-lived so an unconsumed flash does not linger.
    pub fn cookie(self) -> String {
        format!("{FLASH_COOKIE}={}; Path=/; Max-Age=60", self.code())
    }
}

/// redirect_with_flash
///
/// The one-shot message is attached explicitly to the redirect response rather
/// than stored in mutable session state; the next rendered page consumes it.
pub fn redirect_with_flash(to: &str, flash: Flash) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash.cookie())]),
        Redirect::to(to),
    )
        .into_response()
}

// --- Extractors ---

/// Session
///
/// Optional-identity extractor: the verified session username, if any. Never
/// rejects. Used where an active session changes behavior but is not required
/// (the register/login redirect-if-logged-in checks, and the feedback
/// ownership checks that must fire even for anonymous visitors).
pub struct Session(pub Option<String>);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Session(session_username(&parts.headers, &config)))
    }
}

/// CurrentUser
///
/// Required-identity extractor. If no valid session cookie is present the
/// request is rejected with a redirect to the login page carrying the
/// login-required flash, never a bare 401. Handlers use the resolved username
/// for all ownership checks.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        match session_username(&parts.headers, &config) {
            Some(username) => Ok(CurrentUser { username }),
            None => Err(redirect_with_flash("/login", Flash::LoginRequired)),
        }
    }
}

/// FlashMessage
///
/// Reads the pending one-shot message, if any. The rendering side clears the
/// cookie once the banner has been shown.
pub struct FlashMessage(pub Option<Flash>);

impl<S> FromRequestParts<S> for FlashMessage
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flash = cookie_value(&parts.headers, FLASH_COOKIE).and_then(Flash::from_code);
        Ok(FlashMessage(flash))
    }
}
