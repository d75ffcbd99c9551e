//! Collection of general utility functions.
//!
//! Small, reusable helpers that do not belong to a single domain module:
//! random secrets, identity tokens and return-URL checks.

pub mod generate_random_string;
pub mod jwt;
pub mod local_url;
