use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use chrono::Utc;
use feedback_portal::{
    AppState,
    auth,
    config::AppConfig,
    repository::{MemoryRepository, RepositoryState},
    session::{self, Claims, CurrentUser, Flash, Session},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;

// --- Helper Functions ---

const TEST_SECRET: &str = "super-secure-test-secret-value-local";

fn create_token(username: &str, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();

    let claims = Claims {
        sub: username.to_string(),
        iat: now as usize,
        // Token expires exp_offset seconds from now (negative = already expired).
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(TEST_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state() -> AppState {
    // AppConfig::default() already carries the test secret.
    let config = AppConfig::default();
    assert_eq!(config.session_secret, TEST_SECRET);

    AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        config,
    }
}

/// Helper to get the mutable Parts struct from a generated Request.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_session_cookie(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/feedback".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("session={token}")).unwrap(),
    );
    parts
}

// --- CurrentUser Extractor Tests ---

#[tokio::test]
async fn test_current_user_with_valid_session_cookie() {
    let token = create_token("alice", 3600);
    let app_state = create_app_state();

    let mut parts = parts_with_session_cookie(&token);
    let current = CurrentUser::from_request_parts(&mut parts, &app_state).await;

    assert!(current.is_ok());
    assert_eq!(current.unwrap().username, "alice");
}

#[tokio::test]
async fn test_current_user_rejects_missing_cookie_with_login_redirect() {
    let app_state = create_app_state();

    let mut parts = get_request_parts(Method::GET, "/feedback".parse().unwrap());
    let rejection = CurrentUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    // The rejection is a redirect to the login page, never a bare 401.
    assert_eq!(rejection.status(), StatusCode::SEE_OTHER);
    assert_eq!(rejection.headers().get(header::LOCATION).unwrap(), "/login");

    // It carries the login-required flash for the next rendered page.
    let set_cookie = rejection
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with(&format!("flash={}", Flash::LoginRequired.code())));
}

#[tokio::test]
async fn test_current_user_rejects_tampered_token() {
    let app_state = create_app_state();

    // Signed with a different secret: the signature check must fail.
    let claims = Claims {
        sub: "alice".to_string(),
        iat: Utc::now().timestamp() as usize,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let mut parts = parts_with_session_cookie(&forged);
    let current = CurrentUser::from_request_parts(&mut parts, &app_state).await;

    assert!(current.is_err());
}

#[tokio::test]
async fn test_current_user_rejects_expired_token() {
    let app_state = create_app_state();

    // Expired well beyond the decoder's default leeway.
    let token = create_token("alice", -300);

    let mut parts = parts_with_session_cookie(&token);
    let current = CurrentUser::from_request_parts(&mut parts, &app_state).await;

    assert!(current.is_err());
}

#[tokio::test]
async fn test_current_user_rejects_garbage_cookie() {
    let app_state = create_app_state();

    let mut parts = parts_with_session_cookie("not-a-token");
    let current = CurrentUser::from_request_parts(&mut parts, &app_state).await;

    assert!(current.is_err());
}

// --- Optional Session Extractor Tests ---

#[tokio::test]
async fn test_session_extractor_is_none_without_cookie() {
    let app_state = create_app_state();

    let mut parts = get_request_parts(Method::GET, "/register".parse().unwrap());
    let Session(current) = Session::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert!(current.is_none());
}

#[tokio::test]
async fn test_session_roundtrip_through_cookie_value() {
    let config = AppConfig::default();

    // issue_session returns the full Set-Cookie value; the token is the part
    // before the first attribute.
    let set_cookie = session::issue_session("alice", &config);
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let token = set_cookie
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("session=")
        .unwrap();

    assert_eq!(session::verify_token(token, &config).as_deref(), Some("alice"));
}

#[test]
fn test_clear_session_expires_cookie() {
    let cleared = session::clear_session();
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));
}

// --- Password Hashing Tests ---

#[test]
fn test_hash_password_is_salted_and_opaque() {
    let hash = auth::hash_password("secret1");

    assert_ne!(hash, "secret1");
    assert!(hash.starts_with("$argon2"));

    // A second hash of the same password uses a fresh salt.
    assert_ne!(hash, auth::hash_password("secret1"));
}

#[test]
fn test_verify_password() {
    let hash = auth::hash_password("secret1");

    assert!(auth::verify_password(&hash, "secret1"));
    assert!(!auth::verify_password(&hash, "wrongpass"));
    // An unparseable stored hash counts as a mismatch, not a panic.
    assert!(!auth::verify_password("not-a-phc-string", "secret1"));
}

// --- Authenticator Tests ---

#[tokio::test]
async fn test_authenticate_returns_user_only_for_matching_credentials() {
    let state = create_app_state();

    let form = feedback_portal::models::RegisterForm {
        username: "alice".to_string(),
        password: "secret1".to_string(),
        email: "a@x.com".to_string(),
        first_name: "A".to_string(),
        last_name: "L".to_string(),
    };
    let created = auth::register(&state.repo, &form).await.unwrap();

    // The stored password field holds only the opaque hash.
    assert_ne!(created.password, "secret1");
    assert!(auth::verify_password(&created.password, "secret1"));

    let found = auth::authenticate(&state.repo, "alice", "secret1")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.username).as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_authenticate_is_indistinguishable_for_unknown_user_and_wrong_password() {
    let state = create_app_state();

    let form = feedback_portal::models::RegisterForm {
        username: "alice".to_string(),
        password: "secret1".to_string(),
        email: "a@x.com".to_string(),
        first_name: "A".to_string(),
        last_name: "L".to_string(),
    };
    auth::register(&state.repo, &form).await.unwrap();

    let wrong_password = auth::authenticate(&state.repo, "alice", "wrongpass")
        .await
        .unwrap();
    let unknown_user = auth::authenticate(&state.repo, "mallory", "secret1")
        .await
        .unwrap();

    // Both failure modes collapse to None; there is nothing to enumerate.
    assert!(wrong_password.is_none());
    assert!(unknown_user.is_none());
}
