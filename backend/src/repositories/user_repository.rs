//! Database repository for tracker users.
//!
//! Provides the lookups and updates the account flows need: creation at
//! registration, lookup by username for login, and activation by secret.

use crate::database::models::{CreateUser, User, UserClass};
use anyhow::Result;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = r#"
    id, username, password_hash, email, activated, activate_secret,
    class, uploaded, downloaded, created_at, updated_at
"#;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new unactivated user.
    ///
    /// # Arguments
    /// * `user` - CreateUser DTO containing the hashed password and activation secret
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, password_hash, email, activated, activate_secret, class)
            VALUES (?, ?, ?, 0, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.email)
            .bind(user.activate_secret)
            .bind(UserClass::Unactivated)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by username. Matching is case-insensitive.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves the user holding the given activation secret.
    ///
    /// # Returns
    /// `Some(User)` for the first match, `None` when no user carries the secret
    pub async fn get_user_by_activate_secret(&self, secret: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE activate_secret = ? LIMIT 1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(secret)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Checks if an email address is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Marks a user activated, promotes them to `Member` and sets their
    /// starting upload credit.
    ///
    /// The update only applies to rows that are still unactivated.
    ///
    /// # Returns
    /// `true` if this call performed the activation, `false` if the user was
    /// already activated (or does not exist)
    pub async fn activate_user(&self, id: i64, uploaded: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET activated = 1, class = ?, uploaded = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND activated = 0
            "#,
        )
        .bind(UserClass::Member)
        .bind(uploaded)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
