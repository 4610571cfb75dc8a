//! Response bodies.

use super::content::ContentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker used in place of a model identifier when a fallback string is served.
pub const FALLBACK_MODEL: &str = "fallback";

/// Where the returned text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Model,
    Fallback,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::Model => "model",
            TextSource::Fallback => "fallback",
        }
    }
}

/// JSON body returned by the greeting and wish endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    /// The greeting or wish.
    pub text: String,

    /// Content type the text was generated for.
    #[serde(rename = "type")]
    pub content_type: String,

    /// Product kind.
    pub kind: ContentKind,

    /// Model identifier, or `fallback`.
    pub model: String,

    /// Whether a model or the fallback table produced the text.
    pub source: TextSource,

    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
}

/// A quote with its attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl Quote {
    /// Plain-text wire form: `<quote>"text"` newline `<author>Name`.
    pub fn render(&self) -> String {
        format!("<quote>\"{}\"\n<author>{}", self.text, self.author)
    }
}
