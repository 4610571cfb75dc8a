//! HTTP handlers for the greeting service.

pub mod generate;
pub mod index;
pub mod models;
pub mod quote;
