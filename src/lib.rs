//! Artist onboarding — progression logic for the royalty platform's artist
//! setup wizard.

pub mod api;
pub mod config;
pub mod error;
pub mod onboarding;
