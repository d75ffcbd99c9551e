//! Global application error types.
//!
//! Services return `ServiceResult<T>`; repositories return `anyhow::Result`
//! and are folded into `ServiceError::Database` by `?`. Outcomes that the
//! account pages report back to the user (duplicate username, bad activation
//! code, ...) are modelled as status enums in the services, not as errors.

use thiserror::Error;

/// Service-layer failure shared by the account, auth and email services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    /// The identity cookie was missing, malformed or expired.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("Password hashing failed: {source}")]
    Hashing {
        #[from]
        source: bcrypt::BcryptError,
    },

    /// Mail relay or other collaborator outside this process failed.
    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
