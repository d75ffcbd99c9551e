//! Module for the account pages.
//!
//! Login, logoff, registration and email activation for tracker users,
//! rendered as HTML forms with redirect-based flow control.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod views;
