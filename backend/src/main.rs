//! Main entry point for the tracker backend.
//!
//! This file initializes the Axum web server, sets up the database
//! connection and mailer, and serves the account pages.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod profiling;
mod repositories;
mod services;
mod utils;

use anyhow::Result;
use config::Config;
use database::Database;
use services::email_service::{LogMailer, Mailer, SmtpMailer};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> Result<()> {
    init();

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;

    let mailer: Arc<dyn Mailer> = match config.email.clone() {
        Some(email_config) => Arc::new(SmtpMailer::new(email_config)?),
        None => {
            info!("SMTP_HOST not set, activation links will be logged");
            Arc::new(LogMailer)
        }
    };

    let server_port = config.server_port;
    let app = api::app_router(db.pool().clone(), Arc::new(config), mailer);

    let bind_address = format!("0.0.0.0:{}", server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Starting tracker server on port {}", server_port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    db.close().await;
    Ok(())
}
