//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, auth cookie settings and the optional SMTP
//! relay used for activation mail.

use anyhow::{Context, Result};
use std::env;

/// Upload credit granted to a user on activation: 10 GiB.
pub const DEFAULT_UPLOADED_VALUE: i64 = 10 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub auth_secret: String,
    pub auth_cookie_name: String,
    pub session_expires_in_seconds: u64,
    pub remember_me_expires_in_seconds: u64,
    pub server_port: u16,
    pub base_url: String,
    pub bcrypt_cost: u32,
    pub default_uploaded_value: i64,
    pub profiling_enabled: bool,
    pub email: Option<EmailConfig>,
}

/// SMTP relay settings. Absent when `SMTP_HOST` is not set.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let auth_secret = env::var("AUTH_SECRET").context("AUTH_SECRET not set")?;

        let auth_cookie_name =
            env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "tracker_auth".to_string());

        let session_expires_in_seconds = env::var("SESSION_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .context("SESSION_EXPIRES_IN_SECONDS must be a valid number")?;

        let remember_me_expires_in_seconds = env::var("REMEMBER_ME_EXPIRES_IN_SECONDS")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse::<u64>()
            .context("REMEMBER_ME_EXPIRES_IN_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}"))
            .trim_end_matches('/')
            .to_string();

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("BCRYPT_COST must be a valid number")?;

        let default_uploaded_value = env::var("DEFAULT_UPLOADED_VALUE")
            .unwrap_or_else(|_| DEFAULT_UPLOADED_VALUE.to_string())
            .parse::<i64>()
            .context("DEFAULT_UPLOADED_VALUE must be a valid number")?;

        let profiling_enabled = env::var("PROFILING_ENABLED")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let email = EmailConfig::from_env()?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            auth_secret,
            auth_cookie_name,
            session_expires_in_seconds,
            remember_me_expires_in_seconds,
            server_port,
            base_url,
            bcrypt_cost,
            default_uploaded_value,
            profiling_enabled,
            email,
        })
    }
}

impl EmailConfig {
    /// Loads SMTP settings, returning `None` when no relay host is configured.
    pub fn from_env() -> Result<Option<Self>> {
        let smtp_host = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => host,
            _ => return Ok(None),
        };

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        let smtp_username = env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?;
        let smtp_password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?;
        let from_email = env::var("FROM_EMAIL").context("FROM_EMAIL not set")?;
        let from_name = env::var("FROM_NAME").unwrap_or_else(|_| "Tracker".to_string());

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
        }))
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by the in-crate tests.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            auth_secret: "test-secret".to_string(),
            auth_cookie_name: "tracker_auth".to_string(),
            session_expires_in_seconds: 3600,
            remember_me_expires_in_seconds: 7200,
            server_port: 3000,
            base_url: "http://localhost:3000".to_string(),
            bcrypt_cost: 4,
            default_uploaded_value: DEFAULT_UPLOADED_VALUE,
            profiling_enabled: false,
            email: None,
        }
    }
}
