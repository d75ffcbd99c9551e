//! Module for core business logic services.
//!
//! Account registration, credential checks and activation, plus the mail
//! delivery they depend on.

pub mod account_service;
pub mod email_service;
