//! Infrastructure layer for Portal.
//!
//! Concrete record store access and configuration loading.

pub mod config_service;
pub mod paths;
pub mod supabase_lead_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::PortalPaths;
pub use crate::supabase_lead_repository::SupabaseLeadRepository;
