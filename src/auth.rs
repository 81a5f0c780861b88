use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::{
    error::AppError,
    models::{RegisterForm, User},
    repository::RepositoryState,
};

/// Generates a salted argon2 hash in PHC string format.
/// The plaintext is consumed here and never stored or logged.
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("failed to hash password")
        .to_string()
}

/// Verifies a plaintext password against a stored PHC hash string.
/// An unparseable hash counts as a mismatch rather than an error.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("failed to parse stored password hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// register
///
/// Creates a new account from an already shape-validated form. The password is
/// hashed before the user record ever reaches the store; the returned User
/// carries only the opaque hash. A username collision surfaces as
/// `AppError::DuplicateUser` with the store transaction fully rolled back.
pub async fn register(repo: &RepositoryState, form: &RegisterForm) -> Result<User, AppError> {
    let user = User {
        username: form.username.clone(),
        password: hash_password(&form.password),
        email: form.email.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
    };

    repo.create_user(user).await
}

/// authenticate
///
/// Looks up the user and verifies the password hash. Returns `Ok(None)` for an
/// unknown username and for a wrong password alike; callers must not be able to
/// tell the two apart, so the login page can only ever show one generic
/// invalid-credentials message.
pub async fn authenticate(
    repo: &RepositoryState,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    match repo.find_user(username).await? {
        Some(user) if verify_password(&user.password, password) => Ok(Some(user)),
        _ => Ok(None),
    }
}
