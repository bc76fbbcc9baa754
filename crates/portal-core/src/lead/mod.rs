//! Lead domain module.
//!
//! - `model`: Access tokens, stored rows and resolved lead records
//! - `repository`: Repository trait for the external record store

mod model;
mod repository;

pub use model::{AccessToken, BusinessData, LeadRecord, StoredLead};
pub use repository::LeadRepository;
