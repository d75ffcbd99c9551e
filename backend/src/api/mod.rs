//! Central module for organizing the application's HTTP surface.
//!
//! Builds the application router: the account pages nested under
//! `/account`, the profiling hook, the cookie manager and the shared
//! extensions every handler draws on.

pub mod account;
pub mod common;

use crate::config::Config;
use crate::profiling::profile_request;
use crate::services::email_service::Mailer;
use axum::{Extension, Router, middleware, response::Json, routing::get};
use crate::api::common::ApiResponse;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;

/// Assembles the application router with its shared state.
pub fn app_router(pool: SqlitePool, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/account", account::routes::account_router())
        .layer(middleware::from_fn(profile_request))
        .layer(CookieManagerLayer::new())
        .layer(Extension(pool))
        .layer(Extension(config))
        .layer(Extension(mailer))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Tracker Backend",
            "version": env!("CARGO_PKG_VERSION"),
            "account": "/account",
        }),
        "Welcome to the tracker",
    ))
}
