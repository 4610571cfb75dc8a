//! What is being generated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The product a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Greeting,
    Wish,
    Quote,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Greeting, ContentKind::Wish, ContentKind::Quote];

    /// Name used on the wire and in metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Greeting => "greeting",
            ContentKind::Wish => "wish",
            ContentKind::Quote => "quote",
        }
    }

    /// Content type used when the request does not name one.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            ContentKind::Greeting => "morning",
            ContentKind::Wish => "day",
            ContentKind::Quote => "inspiration",
        }
    }

    /// How many of the most recent history entries go into the avoid clause.
    pub fn history_window(&self) -> usize {
        match self {
            ContentKind::Greeting => 5,
            ContentKind::Wish => 3,
            ContentKind::Quote => 10,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
