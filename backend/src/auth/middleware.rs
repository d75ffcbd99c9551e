//! Middleware for pages that need a signed-in user.
//!
//! Anonymous visitors are sent to the login page with the requested path as
//! `returnUrl`, so a successful login brings them back.

use crate::auth::service::AuthenticationService;
use crate::config::Config;
use axum::{
    Extension,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_cookies::Cookies;

/// Login route anonymous users are redirected to.
pub const LOGIN_PATH: &str = "/account/login";

/// Requires a valid identity cookie; inserts its `Claims` into the request.
pub async fn require_user(
    Extension(config): Extension<Arc<Config>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_service = AuthenticationService::new(&config);

    match auth_service.current_user(&cookies) {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        None => {
            let return_url = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            Redirect::to(&login_redirect(&return_url)).into_response()
        }
    }
}

/// Builds the login URL carrying `return_url`.
pub fn login_redirect(return_url: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("returnUrl", return_url)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_query() {
        assert_eq!(
            login_redirect("/account"),
            "/account/login?returnUrl=%2Faccount"
        );
        assert_eq!(
            login_redirect("/account?tab=a b&x=1"),
            "/account/login?returnUrl=%2Faccount%3Ftab%3Da+b%26x%3D1"
        );
    }
}
