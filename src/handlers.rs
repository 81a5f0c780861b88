use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState, auth,
    error::AppError,
    models::{FeedbackForm, FieldErrors, LoginForm, RegisterForm},
    session::{self, CurrentUser, Flash, FlashMessage, Session, redirect_with_flash},
    views,
};

// --- Response Helpers ---

fn profile_path(username: &str) -> String {
    format!("/users/{username}")
}

/// Wraps rendered markup, expiring the flash cookie when a pending message
/// was consumed by this page.
fn render(html: String, consumed_flash: bool) -> Response {
    let mut response = Html(html).into_response();
    if consumed_flash {
        response.headers_mut().append(
            header::SET_COOKIE,
            HeaderValue::from_static(session::CLEAR_FLASH),
        );
    }
    response
}

/// Redirect that establishes a session for `username` and carries a flash.
fn redirect_with_session(to: &str, session_cookie: String, flash: Flash) -> Response {
    (
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, flash.cookie()),
        ]),
        Redirect::to(to),
    )
        .into_response()
}

// --- Handlers ---

/// home
///
/// [Public Route] GET /: the application has no landing page of its own;
/// everything starts at registration.
pub async fn home() -> Redirect {
    Redirect::to("/register")
}

/// register_form
///
/// [Public Route] GET /register: renders the registration form.
/// A visitor who already has an active session is sent to their profile.
pub async fn register_form(
    Session(current): Session,
    FlashMessage(flash): FlashMessage,
) -> Response {
    if let Some(username) = current {
        return Redirect::to(&profile_path(&username)).into_response();
    }

    let html = views::register_page(&RegisterForm::default(), &FieldErrors::new(), flash.as_ref());
    render(html, flash.is_some())
}

/// register_submit
///
/// [Public Route] POST /register: shape validation, then creation.
///
/// A duplicate username comes back from the store with its transaction fully
/// rolled back; it is surfaced as a field error on the re-rendered form and
/// the session is left untouched. On success the user is logged in
/// immediately and redirected to their new profile.
pub async fn register_submit(
    Session(current): Session,
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Some(username) = current {
        return Ok(Redirect::to(&profile_path(&username)).into_response());
    }

    let mut errors = form.validate();
    if !errors.is_empty() {
        return Ok(render(views::register_page(&form, &errors, None), false));
    }

    match auth::register(&state.repo, &form).await {
        Ok(user) => Ok(redirect_with_session(
            &profile_path(&user.username),
            session::issue_session(&user.username, &state.config),
            Flash::Welcome,
        )),
        Err(AppError::DuplicateUser) => {
            errors.insert("username", "Username taken. Please pick another".to_string());
            Ok(render(views::register_page(&form, &errors, None), false))
        }
        Err(e) => Err(e),
    }
}

/// login_form
///
/// [Public Route] GET /login: renders the login form, or redirects an
/// already-authenticated visitor to their profile.
pub async fn login_form(Session(current): Session, FlashMessage(flash): FlashMessage) -> Response {
    if let Some(username) = current {
        return Redirect::to(&profile_path(&username)).into_response();
    }

    let html = views::login_page(&LoginForm::default(), &FieldErrors::new(), flash.as_ref());
    render(html, flash.is_some())
}

/// login_submit
///
/// [Public Route] POST /login: verifies credentials.
///
/// Unknown username and wrong password produce the same generic form error;
/// nothing in the response distinguishes the two cases.
pub async fn login_submit(
    Session(current): Session,
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(username) = current {
        return Ok(Redirect::to(&profile_path(&username)).into_response());
    }

    let mut errors = form.validate();
    if errors.is_empty() {
        match auth::authenticate(&state.repo, &form.username, &form.password).await? {
            Some(user) => {
                return Ok(redirect_with_session(
                    &profile_path(&user.username),
                    session::issue_session(&user.username, &state.config),
                    Flash::LoggedIn,
                ));
            }
            None => {
                errors.insert("credentials", "Invalid credentials.".to_string());
            }
        }
    }

    Ok(render(views::login_page(&form, &errors, None), false))
}

/// logout
///
/// [Public Route] GET /logout: clears the session cookie and redirects to
/// the login page. Works with or without an active session.
pub async fn logout() -> Response {
    (
        AppendHeaders([
            (header::SET_COOKIE, session::clear_session()),
            (header::SET_COOKIE, Flash::LoggedOut.cookie()),
        ]),
        Redirect::to("/login"),
    )
        .into_response()
}

/// user_profile
///
/// [Authenticated Route] GET /users/{username}: profile page with the
/// user's feedback list. Any logged-in user may view any profile; 404 when
/// the named user does not exist.
pub async fn user_profile(
    current: CurrentUser,
    State(state): State<AppState>,
    FlashMessage(flash): FlashMessage,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let user = state
        .repo
        .find_user(&username)
        .await?
        .ok_or(AppError::NotFound)?;
    let feedback = state.repo.feedback_for_user(&username).await?;

    let html = views::profile_page(&user, &feedback, &current.username, flash.as_ref());
    Ok(render(html, flash.is_some()))
}

/// delete_user
///
/// [Authenticated Route] POST /users/{username}/delete: self-service account
/// removal. Only the account owner may do this; the store cascades the
/// deletion to every feedback row the user owns, then the session is cleared.
pub async fn delete_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    if current.username != username {
        return Ok(redirect_with_flash("/login", Flash::LoginRequired));
    }

    if !state.repo.delete_user(&username).await? {
        return Err(AppError::NotFound);
    }

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session::clear_session()),
            (header::SET_COOKIE, Flash::AccountDeleted.cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response())
}

/// add_feedback_form
///
/// [Authenticated Route] GET /users/{username}/feedback/add: feedback can
/// only be added under one's own profile.
pub async fn add_feedback_form(
    current: CurrentUser,
    FlashMessage(flash): FlashMessage,
    Path(username): Path<String>,
) -> Response {
    if current.username != username {
        return redirect_with_flash("/login", Flash::LoginRequired);
    }

    render(
        views::add_feedback_page(&username, flash.as_ref()),
        flash.is_some(),
    )
}

/// add_feedback_submit
///
/// [Authenticated Route] POST /users/{username}/feedback/add: an incomplete
/// submission bounces back to the form with a flash rather than re-rendering
/// inline; a complete one lands on the profile page.
pub async fn add_feedback_submit(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    if current.username != username {
        return Ok(redirect_with_flash("/login", Flash::LoginRequired));
    }

    if !form.is_complete() {
        let back = format!("/users/{username}/feedback/add");
        return Ok(redirect_with_flash(&back, Flash::FieldsRequired));
    }

    state
        .repo
        .create_feedback(&username, &form.title, &form.content)
        .await?;

    Ok(redirect_with_flash(
        &profile_path(&username),
        Flash::FeedbackAdded,
    ))
}

/// feedback_index
///
/// [Authenticated Route] GET /feedback: the logged-in user's feedback with
/// an inline submission form. The owner is taken from the session, never
/// from the request.
pub async fn feedback_index(
    current: CurrentUser,
    State(state): State<AppState>,
    FlashMessage(flash): FlashMessage,
) -> Result<Response, AppError> {
    let feedback = state.repo.feedback_for_user(&current.username).await?;

    let html = views::feedback_page(&current.username, &feedback, flash.as_ref());
    Ok(render(html, flash.is_some()))
}

/// feedback_submit
///
/// [Authenticated Route] POST /feedback: inline submission from the
/// feedback index.
pub async fn feedback_submit(
    current: CurrentUser,
    State(state): State<AppState>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    if !form.is_complete() {
        return Ok(redirect_with_flash("/feedback", Flash::FieldsRequired));
    }

    state
        .repo
        .create_feedback(&current.username, &form.title, &form.content)
        .await?;

    Ok(redirect_with_flash("/feedback", Flash::FeedbackSubmitted))
}

/// edit_feedback_form
///
/// [Ownership Route] GET /feedback/{id}/update: 404 for an unknown id, then
/// the ownership check. A visitor who is not the owner is redirected to the
/// login page with the permission flash, including visitors with no session
/// at all, which is why this route reads the session optionally instead of
/// requiring one up front.
pub async fn edit_feedback_form(
    Session(current): Session,
    State(state): State<AppState>,
    FlashMessage(flash): FlashMessage,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let feedback = state
        .repo
        .find_feedback(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if current.as_deref() != Some(feedback.username.as_str()) {
        return Ok(redirect_with_flash("/login", Flash::EditDenied));
    }

    let html = views::edit_feedback_page(&feedback, flash.as_ref());
    Ok(render(html, flash.is_some()))
}

/// edit_feedback_submit
///
/// [Ownership Route] POST /feedback/{id}/update: same 404-then-ownership
/// order as the form; incomplete input bounces back to the edit form.
pub async fn edit_feedback_submit(
    Session(current): Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let feedback = state
        .repo
        .find_feedback(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if current.as_deref() != Some(feedback.username.as_str()) {
        return Ok(redirect_with_flash("/login", Flash::EditDenied));
    }

    if !form.is_complete() {
        let back = format!("/feedback/{id}/update");
        return Ok(redirect_with_flash(&back, Flash::FieldsRequired));
    }

    let updated = state
        .repo
        .update_feedback(id, &form.title, &form.content)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(redirect_with_flash(
        &profile_path(&updated.username),
        Flash::FeedbackUpdated,
    ))
}

/// delete_feedback
///
/// [Ownership Route] POST /feedback/{id}/delete: 404 for an unknown id,
/// permission flash for anyone but the owner.
pub async fn delete_feedback(
    Session(current): Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let feedback = state
        .repo
        .find_feedback(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if current.as_deref() != Some(feedback.username.as_str()) {
        return Ok(redirect_with_flash("/login", Flash::DeleteDenied));
    }

    if !state.repo.delete_feedback(id).await? {
        return Err(AppError::NotFound);
    }

    Ok(redirect_with_flash(
        &profile_path(&feedback.username),
        Flash::FeedbackDeleted,
    ))
}
