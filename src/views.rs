//! Server-rendered pages.
//!
//! Plain functions building HTML strings over a shared layout, with every
//! piece of user-supplied text escaped. Handlers wrap the returned markup in
//! an `axum::response::Html`.

use crate::models::{Feedback, FieldErrors, LoginForm, RegisterForm, User};
use crate::session::Flash;

/// Escapes text for safe interpolation into HTML body and attribute positions.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let banner = match flash {
        Some(flash) => format!(
            "<p class=\"flash {}\">{}</p>\n",
            flash.category(),
            flash.message()
        ),
        None => String::new(),
    };

    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} · Feedback</title>\n</head>\n<body>\n{banner}{body}\n</body>\n</html>\n",
        escape(title)
    )
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    match errors.get(field) {
        Some(message) => format!("<span class=\"error\">{}</span>", escape(message)),
        None => String::new(),
    }
}

fn text_input(label: &str, name: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\
         <input id=\"{name}\" name=\"{name}\" type=\"text\" value=\"{}\">{}</p>",
        escape(value),
        field_error(errors, name)
    )
}

/// Password inputs never echo the submitted value back.
fn password_input(label: &str, name: &str, errors: &FieldErrors) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\
         <input id=\"{name}\" name=\"{name}\" type=\"password\">{}</p>",
        field_error(errors, name)
    )
}

pub fn register_page(form: &RegisterForm, errors: &FieldErrors, flash: Option<&Flash>) -> String {
    let body = format!(
        "<h1>Register</h1>\n<form method=\"post\" action=\"/register\">\n{}{}{}{}{}\
         <p><button type=\"submit\">Register</button></p>\n</form>\n\
         <p><a href=\"/login\">Already have an account? Log in</a></p>",
        text_input("Username", "username", &form.username, errors),
        password_input("Password", "password", errors),
        text_input("Email", "email", &form.email, errors),
        text_input("First name", "first_name", &form.first_name, errors),
        text_input("Last name", "last_name", &form.last_name, errors),
    );
    layout("Register", flash, &body)
}

pub fn login_page(form: &LoginForm, errors: &FieldErrors, flash: Option<&Flash>) -> String {
    // The generic invalid-credentials message is a form-level error; it must
    // not reveal whether the username or the password was wrong.
    let credentials = field_error(errors, "credentials");

    let body = format!(
        "<h1>Log in</h1>\n{credentials}\n<form method=\"post\" action=\"/login\">\n{}{}\
         <p><button type=\"submit\">Log in</button></p>\n</form>\n\
         <p><a href=\"/register\">Need an account? Register</a></p>",
        text_input("Username", "username", &form.username, errors),
        password_input("Password", "password", errors),
    );
    layout("Log in", flash, &body)
}

fn feedback_item(feedback: &Feedback, with_controls: bool) -> String {
    let controls = if with_controls {
        format!(
            "<a href=\"/feedback/{id}/update\">Edit</a>\n\
             <form method=\"post\" action=\"/feedback/{id}/delete\">\
             <button type=\"submit\">Delete</button></form>",
            id = feedback.id
        )
    } else {
        String::new()
    };

    format!(
        "<li><h3>{}</h3><p>{}</p>{controls}</li>",
        escape(&feedback.title),
        escape(&feedback.content)
    )
}

/// Profile page: account details, the user's feedback, and (for the owner)
/// the add/edit/delete/account-removal controls.
pub fn profile_page(
    user: &User,
    feedback: &[Feedback],
    viewer: &str,
    flash: Option<&Flash>,
) -> String {
    let is_owner = viewer == user.username;
    let items: String = feedback
        .iter()
        .map(|f| feedback_item(f, is_owner))
        .collect();

    let owner_controls = if is_owner {
        format!(
            "<p><a href=\"/users/{username}/feedback/add\">Add feedback</a></p>\n\
             <form method=\"post\" action=\"/users/{username}/delete\">\
             <button type=\"submit\">Delete account</button></form>\n\
             <p><a href=\"/logout\">Log out</a></p>",
            username = escape(&user.username)
        )
    } else {
        String::new()
    };

    let body = format!(
        "<h1>{} {}</h1>\n<p>@{} · {}</p>\n<h2>Feedback</h2>\n<ul>\n{items}\n</ul>\n{owner_controls}",
        escape(&user.first_name),
        escape(&user.last_name),
        escape(&user.username),
        escape(&user.email),
    );
    layout(&user.username, flash, &body)
}

/// Feedback index for the logged-in user, with an inline submission form.
pub fn feedback_page(username: &str, feedback: &[Feedback], flash: Option<&Flash>) -> String {
    let items: String = feedback.iter().map(|f| feedback_item(f, true)).collect();

    let body = format!(
        "<h1>Your feedback</h1>\n<ul>\n{items}\n</ul>\n\
         <form method=\"post\" action=\"/feedback\">\n\
         <p><label for=\"title\">Title</label><input id=\"title\" name=\"title\" type=\"text\"></p>\n\
         <p><label for=\"content\">Content</label><textarea id=\"content\" name=\"content\"></textarea></p>\n\
         <p><button type=\"submit\">Submit</button></p>\n</form>\n\
         <p><a href=\"/users/{}\">Back to profile</a></p>",
        escape(username)
    );
    layout("Your feedback", flash, &body)
}

pub fn add_feedback_page(username: &str, flash: Option<&Flash>) -> String {
    let body = format!(
        "<h1>Add feedback</h1>\n<form method=\"post\" action=\"/users/{}/feedback/add\">\n\
         <p><label for=\"title\">Title</label><input id=\"title\" name=\"title\" type=\"text\"></p>\n\
         <p><label for=\"content\">Content</label><textarea id=\"content\" name=\"content\"></textarea></p>\n\
         <p><button type=\"submit\">Add</button></p>\n</form>",
        escape(username)
    );
    layout("Add feedback", flash, &body)
}

pub fn edit_feedback_page(feedback: &Feedback, flash: Option<&Flash>) -> String {
    let body = format!(
        "<h1>Edit feedback</h1>\n<form method=\"post\" action=\"/feedback/{}/update\">\n\
         <p><label for=\"title\">Title</label>\
         <input id=\"title\" name=\"title\" type=\"text\" value=\"{}\"></p>\n\
         <p><label for=\"content\">Content</label>\
         <textarea id=\"content\" name=\"content\">{}</textarea></p>\n\
         <p><button type=\"submit\">Save</button></p>\n</form>",
        feedback.id,
        escape(&feedback.title),
        escape(&feedback.content),
    );
    layout("Edit feedback", flash, &body)
}

pub fn not_found_page() -> String {
    layout(
        "Not found",
        None,
        "<h1>404</h1>\n<p>The page you were looking for does not exist.</p>\n\
         <p><a href=\"/\">Home</a></p>",
    )
}

pub fn error_page() -> String {
    layout(
        "Something went wrong",
        None,
        "<h1>500</h1>\n<p>Something went wrong on our side. Please try again later.</p>",
    )
}
