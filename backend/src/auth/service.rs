//! Issues and clears the identity cookie.
//!
//! The cookie holds a signed JWT carrying the user's id and username. A "remember me" sign-in
//! gets a persistent cookie; otherwise the cookie lives for the browser
//! session and its token expires after the configured session lifetime.

use crate::config::Config;
use crate::database::models::User;
use crate::errors::ServiceResult;
use crate::utils::jwt::{Claims, JwtUtils};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

pub struct AuthenticationService<'a> {
    config: &'a Config,
    jwt_utils: JwtUtils,
}

impl<'a> AuthenticationService<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            jwt_utils: JwtUtils::new(&config.auth_secret),
        }
    }

    /// Signs `user` in by setting the identity cookie.
    pub fn sign_in(&self, cookies: &Cookies, user: &User, remember_me: bool) -> ServiceResult<()> {
        let expires_in = if remember_me {
            self.config.remember_me_expires_in_seconds
        } else {
            self.config.session_expires_in_seconds
        };

        let token = self
            .jwt_utils
            .generate_token(user.id, user.username.clone(), remember_me, expires_in)?;

        let mut cookie = Cookie::build((self.config.auth_cookie_name.clone(), token))
            .http_only(true)
            .path("/")
            .same_site(SameSite::Lax);
        if remember_me {
            cookie = cookie.max_age(time::Duration::seconds(expires_in as i64));
        }
        cookies.add(cookie.build());

        tracing::debug!(user_id = user.id, username = %user.username, remember_me, "Signed in");
        Ok(())
    }

    /// Clears the identity cookie.
    pub fn sign_out(&self, cookies: &Cookies) {
        let cookie = Cookie::build((self.config.auth_cookie_name.clone(), ""))
            .path("/")
            .build();
        cookies.remove(cookie);
    }

    /// Returns the signed-in user's claims, or `None` for anonymous requests.
    ///
    /// Tampered and expired tokens are treated as anonymous.
    pub fn current_user(&self, cookies: &Cookies) -> Option<Claims> {
        let cookie = cookies.get(&self.config.auth_cookie_name)?;
        match self.jwt_utils.validate_token(cookie.value()) {
            Ok(claims) => Some(claims),
            Err(error) => {
                tracing::debug!("Ignoring identity cookie: {}", error);
                None
            }
        }
    }
}
