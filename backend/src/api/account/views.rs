//! HTML views for the account pages.
//!
//! Simple inline templates without a template engine. Each page can carry a
//! `Notification` that the page script shows as a toast on load.

use super::models::Notification;
use crate::api::common::FieldError;
use crate::database::models::{User, UserClass};

/// Model for the login page.
#[derive(Debug, Clone, Default)]
pub struct LoginView {
    pub username: String,
    pub remember_me: bool,
    pub return_url: Option<String>,
    pub field_errors: Vec<FieldError>,
    pub model_errors: Vec<String>,
    pub notification: Option<Notification>,
}

/// Model for the registration page.
#[derive(Debug, Clone, Default)]
pub struct RegisterView {
    pub username: String,
    pub email: String,
    pub password_length: usize,
    pub field_errors: Vec<FieldError>,
    pub model_errors: Vec<String>,
    pub notification: Option<Notification>,
}

const STYLES: &str = r#"
    body { font-family: Arial, sans-serif; max-width: 480px; margin: 40px auto; color: #333; }
    .container { padding: 24px; border: 1px solid #ddd; border-radius: 6px; }
    .form-group { margin: 12px 0; }
    label { display: block; font-weight: bold; margin-bottom: 4px; }
    input[type="text"], input[type="email"], input[type="password"] { width: 100%; padding: 8px; box-sizing: border-box; }
    .field-error, .validation-summary { color: #c0392b; }
    #notification { padding: 10px; margin-bottom: 12px; display: none; border-radius: 4px; }
    #notification.success { display: block; background: #e8f8ef; color: #1e8449; }
    #notification.error { display: block; background: #fdecea; color: #c0392b; }
"#;

const NOTIFICATION_SCRIPT: &str = r#"
    function notify(kind, message) {
        var el = document.getElementById('notification');
        el.className = kind;
        el.textContent = message;
    }
    function showSuccess(message) { notify('success', message); }
    function showError(message) { notify('error', message); }
"#;

fn layout(title: &str, body: &str, notification: Option<&Notification>) -> String {
    let on_load = notification
        .map(|notification| {
            format!(
                "document.addEventListener('DOMContentLoaded', function () {{ {} }});",
                notification.script()
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{STYLES}</style>
    <script>{NOTIFICATION_SCRIPT}{on_load}</script>
</head>
<body>
    <div class="container">
        <div id="notification"></div>
        {body}
    </div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn validation_summary(model_errors: &[String]) -> String {
    if model_errors.is_empty() {
        return String::new();
    }
    let items: String = model_errors
        .iter()
        .map(|error| format!("<li>{}</li>", html_escape(error)))
        .collect();
    format!(r#"<ul class="validation-summary">{items}</ul>"#)
}

fn field_error(errors: &[FieldError], field: &str) -> String {
    errors
        .iter()
        .filter(|error| error.field == field)
        .map(|error| format!(r#"<span class="field-error">{}</span>"#, html_escape(&error.message)))
        .collect()
}

pub fn login_page(view: &LoginView) -> String {
    let action = match &view.return_url {
        Some(return_url) => format!(
            "/account/login?{}",
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("returnUrl", return_url)
                .finish()
        ),
        None => "/account/login".to_string(),
    };
    let checked = if view.remember_me { " checked" } else { "" };

    let body = format!(
        r#"<h1>Log On</h1>
        {summary}
        <form method="post" action="{action}">
            <div class="form-group">
                <label for="username">User name</label>
                <input type="text" id="username" name="username" value="{username}">
                {username_error}
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input type="password" id="password" name="password">
                {password_error}
            </div>
            <div class="form-group">
                <label><input type="checkbox" name="remember_me" value="true"{checked}> Remember me?</label>
            </div>
            <button type="submit">Log On</button>
        </form>
        <p>No account yet? <a href="/account/register">Register</a>.</p>"#,
        summary = validation_summary(&view.model_errors),
        action = html_escape(&action),
        username = html_escape(&view.username),
        username_error = field_error(&view.field_errors, "username"),
        password_error = field_error(&view.field_errors, "password"),
    );

    layout("Log On", &body, view.notification.as_ref())
}

pub fn register_page(view: &RegisterView) -> String {
    let body = format!(
        r#"<h1>Create a New Account</h1>
        <p>Passwords are required to be a minimum of {password_length} characters in length.</p>
        {summary}
        <form method="post" action="/account/register">
            <div class="form-group">
                <label for="username">User name</label>
                <input type="text" id="username" name="username" value="{username}">
                {username_error}
            </div>
            <div class="form-group">
                <label for="email">Email address</label>
                <input type="email" id="email" name="email" value="{email}">
                {email_error}
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input type="password" id="password" name="password">
                {password_error}
            </div>
            <div class="form-group">
                <label for="confirm_password">Confirm password</label>
                <input type="password" id="confirm_password" name="confirm_password">
                {confirm_error}
            </div>
            <button type="submit">Register</button>
        </form>"#,
        password_length = view.password_length,
        summary = validation_summary(&view.model_errors),
        username = html_escape(&view.username),
        username_error = field_error(&view.field_errors, "username"),
        email = html_escape(&view.email),
        email_error = field_error(&view.field_errors, "email"),
        password_error = field_error(&view.field_errors, "password"),
        confirm_error = field_error(&view.field_errors, "confirm_password"),
    );

    layout("Register", &body, view.notification.as_ref())
}

pub fn index_page(user: &User) -> String {
    let class = match user.class {
        UserClass::Unactivated => "Unactivated",
        UserClass::Member => "Member",
    };

    let body = format!(
        r#"<h1>Welcome, {username}</h1>
        <p>Class: {class}</p>
        <p>Uploaded: {uploaded}</p>
        <p>Downloaded: {downloaded}</p>
        <p><a href="/account/logoff">Log off</a></p>"#,
        username = html_escape(&user.username),
        uploaded = format_bytes(user.uploaded),
        downloaded = format_bytes(user.downloaded),
    );

    layout("My Account", &body, None)
}

/// Formats a byte count with binary units, e.g. `10.00 GiB`.
fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
