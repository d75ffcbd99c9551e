//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Form payloads live with the handlers in
//! `api::account::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Site class of a user. Stored as an integer in `users.class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i64)]
pub enum UserClass {
    /// Registered but the activation link has not been followed yet.
    Unactivated = 0,
    Member = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub activate_secret: String,
    pub class: UserClass,
    /// Bytes uploaded, credited with the configured default on activation.
    pub uploaded: i64,
    pub downloaded: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a freshly registered, unactivated user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub activate_secret: String,
}
