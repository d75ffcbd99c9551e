//! Form payloads, query strings and page notifications for the account pages.

use crate::services::account_service::{MAX_USERNAME_LENGTH, is_valid_username};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Minimum password length, also shown on the registration form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Posted by the login form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "The User name field is required."))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "The Password field is required."))]
    pub password: String,

    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub remember_me: bool,
}

/// Posted by the registration form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "The Email address field is required."),
        email(message = "The Email address field is not a valid e-mail address.")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "The Password must be at least 6 characters long."))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(
        other = "password",
        message = "The password and confirmation password do not match."
    ))]
    pub confirm_password: String,
}

/// Query string of the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub message: Option<String>,
    #[serde(rename = "returnUrl", alias = "ReturnUrl")]
    pub return_url: Option<String>,
}

/// Query string form of the activation link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivateQuery {
    pub hash: Option<String>,
}

/// Status carried to the login page in `?message=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMessage {
    RegisterSuccess,
    ActivationFail,
    ActivationSuccess,
    ActivateExist,
}

impl LoginMessage {
    /// Parses the query value; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registersuccess" => Some(LoginMessage::RegisterSuccess),
            "activationfail" => Some(LoginMessage::ActivationFail),
            "activationsuccess" => Some(LoginMessage::ActivationSuccess),
            "activateexist" => Some(LoginMessage::ActivateExist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMessage::RegisterSuccess => "registersuccess",
            LoginMessage::ActivationFail => "activationfail",
            LoginMessage::ActivationSuccess => "activationsuccess",
            LoginMessage::ActivateExist => "activateexist",
        }
    }

    /// Login page URL carrying this message.
    pub fn login_url(&self) -> String {
        format!("/account/login?message={}", self.as_str())
    }

    pub fn notification(&self) -> Notification {
        match self {
            LoginMessage::RegisterSuccess => {
                Notification::Success("Please check your inbox for activation link.".to_string())
            }
            LoginMessage::ActivationFail => {
                Notification::Error("Invalid activation code.".to_string())
            }
            LoginMessage::ActivationSuccess => Notification::Success(
                "Your account has successfully been activated.".to_string(),
            ),
            LoginMessage::ActivateExist => {
                Notification::Error("Your account has already been activated.".to_string())
            }
        }
    }
}

/// Toast shown by the page script once it loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    /// Script statement that displays the notification, e.g. `showError('...');`.
    pub fn script(&self) -> String {
        let (function, message) = match self {
            Notification::Success(message) => ("showSuccess", message),
            Notification::Error(message) => ("showError", message),
        };
        format!("{}('{}');", function, escape_js_string(message))
    }
}

/// Escapes text for a single-quoted JavaScript string inside a `<script>` block.
fn escape_js_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '<' => escaped.push_str("\\x3C"),
            '>' => escaped.push_str("\\x3E"),
            '&' => escaped.push_str("\\x26"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("The User name field is required.")));
    }
    if !is_valid_username(username) {
        return Err(ValidationError::new("username").with_message(Cow::Owned(format!(
            "The User name may only contain letters, digits, '_', '.' and '-', up to {} characters.",
            MAX_USERNAME_LENGTH
        ))));
    }
    Ok(())
}

/// Accepts the values browsers and clients send for a checked box.
fn deserialize_checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(
        value.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "on" | "1" | "yes")
    ))
}
