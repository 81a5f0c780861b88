use std::collections::BTreeMap;

use serde::Deserialize;
use sqlx::FromRow;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a registered account stored in the `users` table. The `username`
/// is the primary key and the sole identity carried in the session cookie.
/// The `password` field only ever holds the opaque argon2 hash, never plaintext.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Feedback
///
/// A short note posted by a user, stored in the `feedback` table.
/// Ownership is by value of the `username` column; one user owns
/// zero-or-more feedback rows.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Feedback {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub username: String,
}

// --- Form Payloads (Input Schemas) ---

/// Field-level validation output: field name mapped to its error message.
/// An empty map means the input passed.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// RegisterForm
///
/// Input payload for the registration form (POST /register).
/// `#[serde(default)]` tolerates missing fields the way a browser submits
/// empty inputs, so validation (not deserialization) reports the errors.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// LoginForm
///
/// Input payload for the login form (POST /login).
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// FeedbackForm
///
/// Input payload shared by every add/edit feedback form.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
}

// --- Validation ---

fn require(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.is_empty() {
        errors.insert(field, "This field is required.".to_string());
        return false;
    }
    true
}

fn limit(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.insert(field, format!("Must be at most {max} characters."));
    }
}

/// Loose shape check: one '@' with a dotted, non-empty domain.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl RegisterForm {
    /// Shape validation for registration input. Uniqueness of the username is
    /// the store's job and is reported separately as a duplicate-key error.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if require(&mut errors, "username", &self.username) {
            limit(&mut errors, "username", &self.username, 20);
        }
        require(&mut errors, "password", &self.password);
        if require(&mut errors, "email", &self.email) {
            limit(&mut errors, "email", &self.email, 50);
            if !errors.contains_key("email") && !looks_like_email(&self.email) {
                errors.insert("email", "Must be a valid email address.".to_string());
            }
        }
        if require(&mut errors, "first_name", &self.first_name) {
            limit(&mut errors, "first_name", &self.first_name, 30);
        }
        if require(&mut errors, "last_name", &self.last_name) {
            limit(&mut errors, "last_name", &self.last_name, 30);
        }

        errors
    }
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "username", &self.username);
        require(&mut errors, "password", &self.password);
        errors
    }
}

impl FeedbackForm {
    /// Both fields must be non-empty. Matches the add/edit handlers, which
    /// bounce invalid submissions back to the form with a flash message
    /// instead of re-rendering inline.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.content.is_empty()
    }
}
