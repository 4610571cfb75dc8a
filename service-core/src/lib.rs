//! service-core: Shared infrastructure for the greeting workspace services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
