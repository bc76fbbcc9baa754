//! Domain layer for Portal.
//!
//! Holds the lead and conversation models together with the repository and
//! gateway traits that the infrastructure and interaction crates implement.

pub mod config;
pub mod conversation;
pub mod error;
pub mod lead;

// Re-export common error type
pub use error::PortalError;
