//! Domain models for the greeting service.

pub mod content;
pub mod request;
pub mod response;

pub use content::ContentKind;
pub use request::GenerateParams;
pub use response::{GeneratedText, Quote, TextSource, FALLBACK_MODEL};
