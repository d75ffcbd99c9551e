//! Authentication module for signed-in sessions.
//!
//! This module issues and clears the identity cookie and provides the
//! middleware that guards pages requiring a signed-in user.

pub mod middleware;
pub mod service;
