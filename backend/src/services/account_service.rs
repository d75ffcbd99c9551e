//! Account business logic service.
//!
//! Credential checks for login, user creation for registration and the
//! one-time activation of a registered user.

use crate::config::Config;
use crate::database::models::{CreateUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::email_service::{Mailer, activation_url};
use crate::utils::generate_random_string::generate_activation_secret;
use sqlx::SqlitePool;
use validator::ValidateEmail;

/// Longest username accepted at registration.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCreateStatus {
    Success,
    InvalidUserName,
    InvalidPassword,
    InvalidEmail,
    DuplicateUserName,
    DuplicateEmail,
    UserRejected,
    ProviderError,
}

impl AccountCreateStatus {
    /// User-facing explanation shown on the registration form.
    pub fn message(&self) -> &'static str {
        match self {
            AccountCreateStatus::Success => "The account was created successfully.",
            AccountCreateStatus::DuplicateUserName => {
                "User name already exists. Please enter a different user name."
            }
            AccountCreateStatus::DuplicateEmail => {
                "A user name for that e-mail address already exists. Please enter a different e-mail address."
            }
            AccountCreateStatus::InvalidPassword => {
                "The password provided is invalid. Please enter a valid password value."
            }
            AccountCreateStatus::InvalidEmail => {
                "The e-mail address provided is invalid. Please check the value and try again."
            }
            AccountCreateStatus::InvalidUserName => {
                "The user name provided is invalid. Please check the value and try again."
            }
            AccountCreateStatus::ProviderError => {
                "The authentication provider returned an error. Please verify your entry and try again. If the problem persists, please contact your system administrator."
            }
            AccountCreateStatus::UserRejected => {
                "The user creation request has been canceled. Please verify your entry and try again. If the problem persists, please contact your system administrator."
            }
        }
    }
}

/// Outcome of following an activation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    Activated,
    AlreadyActivated,
    InvalidCode,
}

/// Returns true for 1 to `MAX_USERNAME_LENGTH` characters of ASCII letters,
/// digits, `_`, `.` or `-`.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Hashes a password with bcrypt on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> ServiceResult<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Hashing task failed: {e}")))??;
    Ok(hashed)
}

/// Verifies a password against a stored bcrypt hash on the blocking pool.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Verification task failed: {e}")))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            Ok(false)
        }
    }
}

/// Service layer for account operations.
pub struct AccountService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    config: &'a Config,
    mailer: &'a dyn Mailer,
}

impl<'a> AccountService<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a Config, mailer: &'a dyn Mailer) -> Self {
        Self {
            pool,
            config,
            mailer,
        }
    }

    /// Checks a username/password pair.
    ///
    /// # Returns
    /// The user only if it exists, has been activated and the password
    /// matches the stored hash. Unknown and unactivated usernames cost the
    /// same bcrypt work as a real check.
    pub async fn validate_user(&self, username: &str, password: &str) -> ServiceResult<Option<User>> {
        let repo = UserRepository::new(self.pool);

        let user = match repo.get_user_by_username(username).await? {
            Some(user) => user,
            None => {
                tracing::debug!(username, "Login for unknown user");
                hash_password(password, self.config.bcrypt_cost).await?;
                return Ok(None);
            }
        };

        let matches = verify_password(password, &user.password_hash).await?;
        if !user.activated {
            tracing::debug!(username, "Login for unactivated user");
            return Ok(None);
        }

        Ok(matches.then_some(user))
    }

    /// Registers a new, unactivated user and mails the activation link.
    ///
    /// # Arguments
    /// * `username` - Requested username
    /// * `password_hash` - bcrypt hash of the chosen password
    /// * `email` - Address the activation link is sent to
    ///
    /// # Returns
    /// `AccountCreateStatus::Success` or the reason the user was not created.
    /// A failed activation mail is logged and does not undo the registration.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> ServiceResult<AccountCreateStatus> {
        if !is_valid_username(username) {
            return Ok(AccountCreateStatus::InvalidUserName);
        }
        if password_hash.is_empty() {
            return Ok(AccountCreateStatus::InvalidPassword);
        }
        if !email.validate_email() {
            return Ok(AccountCreateStatus::InvalidEmail);
        }

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(username).await? {
            return Ok(AccountCreateStatus::DuplicateUserName);
        }
        if repo.email_exists(email).await? {
            return Ok(AccountCreateStatus::DuplicateEmail);
        }

        let create_user = CreateUser {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.to_string(),
            activate_secret: generate_activation_secret(),
        };

        let user = match repo.create_user(create_user).await {
            Ok(user) => user,
            Err(error) => {
                // Lost a race against a concurrent registration.
                if let Some(status) = unique_violation_status(&error) {
                    return Ok(status);
                }
                return Err(error.into());
            }
        };

        tracing::info!(user_id = user.id, username = %user.username, "Registered new user");

        let link = activation_url(&self.config.base_url, &user.activate_secret);
        if let Err(error) = self
            .mailer
            .send_activation_email(&user.email, &user.username, &link)
            .await
        {
            tracing::error!(user_id = user.id, "Activation email not sent: {}", error);
        }

        Ok(AccountCreateStatus::Success)
    }

    /// Activates the user holding `secret`.
    ///
    /// Sets the activated flag, promotes the user to `Member` and credits the
    /// configured default upload amount. A user is activated at most once.
    pub async fn activate(&self, secret: &str) -> ServiceResult<ActivationStatus> {
        if secret.is_empty() {
            return Ok(ActivationStatus::InvalidCode);
        }

        let repo = UserRepository::new(self.pool);
        let user = match repo.get_user_by_activate_secret(secret).await? {
            Some(user) => user,
            None => return Ok(ActivationStatus::InvalidCode),
        };

        if user.activated {
            return Ok(ActivationStatus::AlreadyActivated);
        }

        if !repo
            .activate_user(user.id, self.config.default_uploaded_value)
            .await?
        {
            return Ok(ActivationStatus::AlreadyActivated);
        }

        tracing::info!(user_id = user.id, username = %user.username, "Activated user");
        Ok(ActivationStatus::Activated)
    }
}

/// Maps a unique-constraint failure on `users` to the matching duplicate status.
fn unique_violation_status(error: &anyhow::Error) -> Option<AccountCreateStatus> {
    let db_error = error.downcast_ref::<sqlx::Error>()?.as_database_error()?;
    if !db_error.is_unique_violation() {
        return None;
    }

    let message = db_error.message();
    if message.contains("users.username") {
        Some(AccountCreateStatus::DuplicateUserName)
    } else if message.contains("users.email") {
        Some(AccountCreateStatus::DuplicateEmail)
    } else {
        Some(AccountCreateStatus::ProviderError)
    }
}
