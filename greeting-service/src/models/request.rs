//! Request decoding.
//!
//! Decoding never fails. A body that is empty, not JSON or not a JSON object
//! yields the default parameters for the requested kind; an out-of-bounds
//! field falls back to its own default.

use super::content::ContentKind;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Longest history entry accepted from a client.
pub const MAX_HISTORY_ENTRY_CHARS: usize = 500;

/// Most history entries accepted from a client.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Decoded, defaulted request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateParams {
    /// Category of text, e.g. `morning`.
    pub content_type: String,

    /// Previously returned strings, oldest first.
    pub history: Vec<String>,
}

impl GenerateParams {
    /// Default parameter set for a kind.
    pub fn defaults(kind: ContentKind) -> Self {
        Self {
            content_type: kind.default_content_type().to_string(),
            history: Vec::new(),
        }
    }

    /// Decode a raw request body.
    ///
    /// Each field is taken on its own: an invalid `history` is dropped without
    /// losing a valid content type, and vice versa.
    pub fn decode(kind: ContentKind, body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::defaults(kind);
        }

        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                tracing::warn!(kind = %kind, "Request body is not a JSON object, using defaults");
                return Self::defaults(kind);
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Malformed request body, using defaults");
                return Self::defaults(kind);
            }
        };

        let mut raw = RawParams::from_fields(&fields);

        if let Err(errors) = raw.validate() {
            let invalid = errors.field_errors();
            if invalid.contains_key("content_type") {
                raw.content_type = None;
            }
            if invalid.contains_key("history") {
                raw.history = Vec::new();
            }
            tracing::warn!(kind = %kind, error = %errors, "Dropping invalid request fields");
        }

        raw.into_params(kind)
    }

    /// Decode history passed as a JSON array in a query string value.
    pub fn from_query_history(kind: ContentKind, history: Option<&str>) -> Self {
        let mut params = Self::defaults(kind);

        let Some(history) = history else {
            return params;
        };

        match serde_json::from_str::<Vec<String>>(history) {
            Ok(entries) if validate_history_entries(&entries).is_ok() => {
                params.history = normalize_history(entries);
            }
            Ok(_) => {
                tracing::warn!(kind = %kind, "History query parameter out of bounds, ignoring");
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Malformed history query parameter, ignoring");
            }
        }

        params
    }
}

/// Field names accepted for the content type, in precedence order.
const CONTENT_TYPE_FIELDS: [&str; 4] = ["contentType", "greetingType", "wishType", "type"];

#[derive(Debug, Validate)]
struct RawParams {
    #[validate(length(min = 1, max = 32))]
    content_type: Option<String>,

    #[validate(custom(function = "validate_history_entries"))]
    history: Vec<String>,
}

impl RawParams {
    /// Non-string content types and non-list histories are treated as absent.
    fn from_fields(fields: &Map<String, Value>) -> Self {
        let content_type = CONTENT_TYPE_FIELDS
            .iter()
            .find_map(|name| fields.get(*name)?.as_str())
            .map(str::to_string);

        let history = fields
            .get("history")
            .and_then(|value| Vec::<String>::deserialize(value).ok())
            .unwrap_or_default();

        Self {
            content_type,
            history,
        }
    }

    fn into_params(self, kind: ContentKind) -> GenerateParams {
        let content_type = self
            .content_type
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| kind.default_content_type().to_string());

        GenerateParams {
            content_type,
            history: normalize_history(self.history),
        }
    }
}

#[allow(clippy::ptr_arg)]
fn validate_history_entries(history: &Vec<String>) -> Result<(), ValidationError> {
    if history.len() > MAX_HISTORY_ENTRIES {
        return Err(ValidationError::new("history_too_long"));
    }
    if history
        .iter()
        .any(|entry| entry.chars().count() > MAX_HISTORY_ENTRY_CHARS)
    {
        return Err(ValidationError::new("history_entry_too_long"));
    }
    Ok(())
}

fn normalize_history(history: Vec<String>) -> Vec<String> {
    history
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_yields_defaults() {
        assert_eq!(
            GenerateParams::decode(ContentKind::Greeting, b""),
            GenerateParams::defaults(ContentKind::Greeting)
        );
        assert_eq!(
            GenerateParams::decode(ContentKind::Wish, b"  \n"),
            GenerateParams::defaults(ContentKind::Wish)
        );
    }

    #[test]
    fn malformed_json_yields_defaults() {
        let params = GenerateParams::decode(ContentKind::Greeting, b"{contentType: night");
        assert_eq!(params.content_type, "morning");
        assert!(params.history.is_empty());
    }

    #[test]
    fn wrong_shape_yields_defaults() {
        let params = GenerateParams::decode(ContentKind::Wish, br#"{"history": "not-a-list"}"#);
        assert_eq!(params, GenerateParams::defaults(ContentKind::Wish));

        let params = GenerateParams::decode(ContentKind::Wish, br#"["night"]"#);
        assert_eq!(params, GenerateParams::defaults(ContentKind::Wish));

        let params = GenerateParams::decode(ContentKind::Greeting, br#""night""#);
        assert_eq!(params, GenerateParams::defaults(ContentKind::Greeting));

        let params = GenerateParams::decode(ContentKind::Greeting, br#"{"contentType": 42}"#);
        assert_eq!(params, GenerateParams::defaults(ContentKind::Greeting));
    }

    #[test]
    fn bad_history_keeps_content_type() {
        for body in [
            r#"{"contentType": "night", "history": null}"#,
            r#"{"contentType": "night", "history": [1, 2]}"#,
            r#"{"contentType": "night", "history": "Good night!"}"#,
        ] {
            let params = GenerateParams::decode(ContentKind::Greeting, body.as_bytes());
            assert_eq!(params.content_type, "night", "body {body}");
            assert!(params.history.is_empty(), "body {body}");
        }
    }

    #[test]
    fn content_type_field_takes_precedence_over_legacy_names() {
        let params = GenerateParams::decode(
            ContentKind::Greeting,
            br#"{"contentType": "night", "greetingType": "evening"}"#,
        );
        assert_eq!(params.content_type, "night");
    }

    #[test]
    fn decodes_content_type_and_history() {
        let params = GenerateParams::decode(
            ContentKind::Greeting,
            br#"{"contentType": " Night ", "history": ["Good night!", "  ", "Sweet dreams!"]}"#,
        );
        assert_eq!(params.content_type, "night");
        assert_eq!(params.history, vec!["Good night!", "Sweet dreams!"]);
    }

    #[test]
    fn accepts_legacy_field_names() {
        let greeting =
            GenerateParams::decode(ContentKind::Greeting, br#"{"greetingType": "evening"}"#);
        assert_eq!(greeting.content_type, "evening");

        let wish = GenerateParams::decode(ContentKind::Wish, br#"{"wishType": "weekend"}"#);
        assert_eq!(wish.content_type, "weekend");
    }

    #[test]
    fn oversized_content_type_yields_defaults() {
        let body = format!(r#"{{"contentType": "{}"}}"#, "x".repeat(64));
        let params = GenerateParams::decode(ContentKind::Greeting, body.as_bytes());
        assert_eq!(params, GenerateParams::defaults(ContentKind::Greeting));
    }

    #[test]
    fn oversized_history_is_dropped() {
        let body = format!(r#"{{"contentType": "night", "history": ["{}"]}}"#, "y".repeat(600));
        let params = GenerateParams::decode(ContentKind::Greeting, body.as_bytes());
        assert_eq!(params.content_type, "night");
        assert!(params.history.is_empty());

        let entries = vec!["\"Hi\""; MAX_HISTORY_ENTRIES + 1].join(",");
        let body = format!(r#"{{"contentType": "noon", "history": [{entries}]}}"#);
        let params = GenerateParams::decode(ContentKind::Greeting, body.as_bytes());
        assert_eq!(params.content_type, "noon");
        assert!(params.history.is_empty());
    }

    #[test]
    fn query_history_is_parsed_or_ignored() {
        let params = GenerateParams::from_query_history(
            ContentKind::Quote,
            Some(r#"["<quote>\"A\"\n<author>B"]"#),
        );
        assert_eq!(params.history.len(), 1);

        let params = GenerateParams::from_query_history(ContentKind::Quote, Some("not json"));
        assert!(params.history.is_empty());

        let params = GenerateParams::from_query_history(ContentKind::Quote, None);
        assert_eq!(params.content_type, "inspiration");
    }
}
