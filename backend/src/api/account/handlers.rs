//! Handler functions for the account pages.
//!
//! Each handler validates its form, delegates to the account or
//! authentication service, and then either redirects (with a `?message=`
//! status for the login page) or re-renders the form with its errors.

use super::models::{
    ActivateQuery, LoginForm, LoginMessage, LoginQuery, MIN_PASSWORD_LENGTH, Notification,
    RegisterForm,
};
use super::views::{self, LoginView, RegisterView};
use crate::api::common::{HttpError, service_error_to_http, validation_errors_to_field_errors};
use crate::auth::service::AuthenticationService;
use crate::config::Config;
use crate::errors::ServiceError;
use crate::profiling::RequestProfiler;
use crate::repositories::user_repository::UserRepository;
use crate::services::account_service::{
    AccountCreateStatus, AccountService, ActivationStatus, hash_password,
};
use crate::services::email_service::Mailer;
use crate::utils::jwt::Claims;
use crate::utils::local_url::local_redirect_target;
use axum::{
    Form,
    extract::{Extension, Path, Query},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_cookies::Cookies;
use validator::Validate;

const ACCOUNT_HOME: &str = "/account";

const INVALID_CREDENTIALS: &str = "The user name or password provided is incorrect.";

/// GET /account - the signed-in user's account page
#[axum::debug_handler]
pub async fn index(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Extension(profiler): Extension<RequestProfiler>,
) -> Result<Response, HttpError> {
    let user = UserRepository::new(&pool)
        .get_user_by_username(claims.username())
        .await
        .map_err(|e| service_error_to_http(e.into()))?;

    let user = match user {
        Some(user) => user,
        // Identity cookie outlived the user record.
        None => {
            return Err(service_error_to_http(ServiceError::not_found(
                "User",
                claims.username(),
            )));
        }
    };

    let _render = profiler.step("render");
    Ok(Html(views::index_page(&user)).into_response())
}

/// GET /account/login - login form with an optional status notification
#[axum::debug_handler]
pub async fn login_page(
    Extension(profiler): Extension<RequestProfiler>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let notification = query
        .message
        .as_deref()
        .and_then(LoginMessage::parse)
        .map(|message| message.notification());

    let view = LoginView {
        return_url: query.return_url,
        notification,
        ..Default::default()
    };

    let _render = profiler.step("render");
    Html(views::login_page(&view))
}

/// POST /account/login - check credentials and sign the user in
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(profiler): Extension<RequestProfiler>,
    cookies: Cookies,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, HttpError> {
    let mut view = LoginView {
        username: form.username.clone(),
        remember_me: form.remember_me,
        return_url: query.return_url.clone(),
        ..Default::default()
    };

    if let Err(errors) = form.validate() {
        view.field_errors = validation_errors_to_field_errors(&errors);
        let _render = profiler.step("render");
        return Ok(Html(views::login_page(&view)).into_response());
    }

    let account_service = AccountService::new(&pool, &config, mailer.as_ref());
    let user = {
        let _step = profiler.step("bcrypt match password");
        account_service
            .validate_user(&form.username, &form.password)
            .await
            .map_err(service_error_to_http)?
    };

    if let Some(user) = user {
        AuthenticationService::new(&config)
            .sign_in(&cookies, &user, form.remember_me)
            .map_err(service_error_to_http)?;

        tracing::info!(user_id = user.id, username = %user.username, "User logged in");

        let target = query
            .return_url
            .as_deref()
            .and_then(local_redirect_target)
            .unwrap_or_else(|| ACCOUNT_HOME.to_string());
        return Ok(Redirect::to(&target).into_response());
    }

    tracing::info!(username = %form.username, "Failed login attempt");
    view.model_errors.push(INVALID_CREDENTIALS.to_string());
    view.notification = Some(Notification::Error(
        "The username or password provided is incorrect..".to_string(),
    ));

    let _render = profiler.step("render");
    Ok(Html(views::login_page(&view)).into_response())
}

/// GET|POST /account/logoff - clear the identity cookie
#[axum::debug_handler]
pub async fn logoff(Extension(config): Extension<Arc<Config>>, cookies: Cookies) -> Redirect {
    AuthenticationService::new(&config).sign_out(&cookies);
    Redirect::to(ACCOUNT_HOME)
}

/// GET /account/register - registration form
#[axum::debug_handler]
pub async fn register_page(Extension(profiler): Extension<RequestProfiler>) -> Html<String> {
    let view = RegisterView {
        password_length: MIN_PASSWORD_LENGTH,
        ..Default::default()
    };

    let _render = profiler.step("render");
    Html(views::register_page(&view))
}

/// POST /account/register - create an unactivated user and mail the activation link
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Extension(profiler): Extension<RequestProfiler>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, HttpError> {
    let mut view = RegisterView {
        username: form.username.clone(),
        email: form.email.clone(),
        password_length: MIN_PASSWORD_LENGTH,
        ..Default::default()
    };

    if let Err(errors) = form.validate() {
        view.field_errors = validation_errors_to_field_errors(&errors);
        let _render = profiler.step("render");
        return Ok(Html(views::register_page(&view)).into_response());
    }

    let password_hash = {
        let _step = profiler.step("bcrypt password");
        hash_password(&form.password, config.bcrypt_cost)
            .await
            .map_err(service_error_to_http)?
    };

    let status = {
        let _step = profiler.step("register user");
        AccountService::new(&pool, &config, mailer.as_ref())
            .create_user(&form.username, &password_hash, &form.email)
            .await
            .map_err(service_error_to_http)?
    };

    if status == AccountCreateStatus::Success {
        return Ok(Redirect::to(&LoginMessage::RegisterSuccess.login_url()).into_response());
    }

    tracing::info!(username = %form.username, ?status, "Registration rejected");
    view.model_errors.push(status.message().to_string());
    view.notification = Some(Notification::Error(status.message().to_string()));

    let _render = profiler.step("render");
    Ok(Html(views::register_page(&view)).into_response())
}

/// GET /account/activate?hash=... - follow the activation link
#[axum::debug_handler]
pub async fn activate(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Query(query): Query<ActivateQuery>,
) -> Result<Redirect, HttpError> {
    let hash = query.hash.unwrap_or_default();
    activate_with_hash(&pool, &config, mailer.as_ref(), &hash).await
}

/// GET /account/activate/{hash} - path form of the activation link
#[axum::debug_handler]
pub async fn activate_path(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<Config>>,
    Extension(mailer): Extension<Arc<dyn Mailer>>,
    Path(hash): Path<String>,
) -> Result<Redirect, HttpError> {
    activate_with_hash(&pool, &config, mailer.as_ref(), &hash).await
}

async fn activate_with_hash(
    pool: &SqlitePool,
    config: &Config,
    mailer: &dyn Mailer,
    hash: &str,
) -> Result<Redirect, HttpError> {
    let status = AccountService::new(pool, config, mailer)
        .activate(hash)
        .await
        .map_err(service_error_to_http)?;

    let message = match status {
        ActivationStatus::Activated => LoginMessage::ActivationSuccess,
        ActivationStatus::AlreadyActivated => LoginMessage::ActivateExist,
        ActivationStatus::InvalidCode => {
            tracing::info!("Activation attempted with unknown code");
            LoginMessage::ActivationFail
        }
    };

    Ok(Redirect::to(&message.login_url()))
}
