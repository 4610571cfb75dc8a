//! Normalization and validation of raw model output.
//!
//! One [`clean`] function serves every kind; what differs between greetings,
//! wishes and quotes is the [`CleanPolicy`] value passed in. `clean` is
//! idempotent: cleaning an already-cleaned string returns it unchanged.

use crate::models::{ContentKind, Quote};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static LEADING_DECORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s"'`•*#>\-–—“”‘’]+"#).expect("valid regex"));
static TRAILING_DECORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s"'`•*\-–—“”‘’]+$"#).expect("valid regex"));
static LEADING_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s•*#>\-–—]+").expect("valid regex"));
static TRAILING_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s•*\-–—]+$").expect("valid regex"));
static LEADING_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?\d{1,3}[.)]\s*").expect("valid regex"));
static LEADING_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(greeting|wish|quote|answer|response)\s*:\s*").expect("valid regex")
});
// Closing quotes and emphasis may sit between the punctuation and the space.
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["'`*”’]*\s"#).expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));
static QUOTE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<quote>\s*(?P<text>.+?)\s*<author>\s*(?P<author>\S[^\n]*)")
        .expect("valid regex")
});
static ATTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<text>.+?)\s+(?:[-–—~]+)\s*(?P<author>[^"“”]+)$"#).expect("valid regex")
});

/// Meta-commentary that marks a response as chatter rather than content.
pub const DEFAULT_BANNED_TOKENS: &[&str] = &[
    "here",
    "okay",
    "options",
    "option",
    "sure",
    "certainly",
    "as an ai",
    "i cannot",
    "i can't",
];

/// How raw output is normalized and what counts as acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPolicy {
    pub min_words: usize,
    pub max_words: usize,
    pub max_chars: usize,

    /// Strip quotation marks as well as markdown bullets at either end.
    pub strip_quotes: bool,

    /// Keep only the first non-empty line; otherwise lines are joined.
    pub first_line_only: bool,

    /// Keep only the first sentence.
    pub first_sentence_only: bool,

    /// Lowercase words or phrases rejected anywhere in the text.
    pub banned_tokens: Vec<String>,
}

impl CleanPolicy {
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Greeting => Self {
                min_words: 2,
                max_words: 12,
                max_chars: 80,
                strip_quotes: true,
                first_line_only: true,
                first_sentence_only: true,
                banned_tokens: default_banned_tokens(),
            },
            ContentKind::Wish => Self {
                min_words: 4,
                max_words: 30,
                max_chars: 200,
                strip_quotes: true,
                first_line_only: true,
                first_sentence_only: false,
                banned_tokens: default_banned_tokens(),
            },
            ContentKind::Quote => Self {
                min_words: 3,
                max_words: 50,
                max_chars: 300,
                strip_quotes: true,
                first_line_only: false,
                first_sentence_only: false,
                banned_tokens: default_banned_tokens(),
            },
        }
    }
}

fn default_banned_tokens() -> Vec<String> {
    DEFAULT_BANNED_TOKENS.iter().map(|t| t.to_string()).collect()
}

/// Why a cleaned response was not accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty after cleaning")]
    Empty,

    #[error("too short: {words} words, minimum {min}")]
    TooShort { words: usize, min: usize },

    #[error("too long: {words} words, maximum {max}")]
    TooLong { words: usize, max: usize },

    #[error("contains banned token '{0}'")]
    BannedToken(String),

    #[error("not in quote format")]
    MalformedQuote,

    #[error("author attribution missing or too long")]
    BadAuthor,
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::Empty => "empty",
            Rejection::TooShort { .. } => "too_short",
            Rejection::TooLong { .. } => "too_long",
            Rejection::BannedToken(_) => "banned_token",
            Rejection::MalformedQuote => "malformed_quote",
            Rejection::BadAuthor => "bad_author",
        }
    }
}

/// Normalize raw provider text according to `policy`.
pub fn clean(raw: &str, policy: &CleanPolicy) -> String {
    let selected = if policy.first_line_only {
        raw.lines()
            .find(|line| !strip_decorations(line, policy.strip_quotes).is_empty())
            .unwrap_or("")
            .to_string()
    } else {
        raw.to_string()
    };

    let mut text = WHITESPACE.replace_all(&selected, " ").into_owned();
    text = strip_decorations(&text, policy.strip_quotes);

    if policy.first_sentence_only {
        if let Some(end) = SENTENCE_END.find(&text) {
            let cut = end.as_str().trim_end().len();
            text.truncate(end.start() + cut);
            text = strip_decorations(&text, policy.strip_quotes);
        }
    }

    if text.chars().count() > policy.max_chars {
        text = truncate_at_word(&text, policy.max_chars);
        text = strip_decorations(&text, policy.strip_quotes);
    }

    text
}

/// Check a cleaned string against `policy`.
pub fn validate(text: &str, policy: &CleanPolicy) -> Result<(), Rejection> {
    if text.is_empty() {
        return Err(Rejection::Empty);
    }

    let words = text.split_whitespace().count();
    if words < policy.min_words {
        return Err(Rejection::TooShort {
            words,
            min: policy.min_words,
        });
    }
    if words > policy.max_words {
        return Err(Rejection::TooLong {
            words,
            max: policy.max_words,
        });
    }

    let lowered = text.to_lowercase();
    let text_words: Vec<&str> = WORD.find_iter(&lowered).map(|m| m.as_str()).collect();
    for token in &policy.banned_tokens {
        let token_words: Vec<&str> = WORD.find_iter(token).map(|m| m.as_str()).collect();
        if !token_words.is_empty()
            && text_words
                .windows(token_words.len())
                .any(|window| window == token_words.as_slice())
        {
            return Err(Rejection::BannedToken(token.clone()));
        }
    }

    Ok(())
}

/// Clean then validate.
pub fn clean_and_validate(raw: &str, policy: &CleanPolicy) -> Result<String, Rejection> {
    let cleaned = clean(raw, policy);
    validate(&cleaned, policy)?;
    Ok(cleaned)
}

/// Extract a quote and its author from raw output.
///
/// Accepts the tagged `<quote>"…"` / `<author>…` block, and the common
/// `"…" - Author` attribution shape (any dash or tilde) models fall back to.
pub fn parse_quote(raw: &str, policy: &CleanPolicy) -> Result<Quote, Rejection> {
    let (text, author) = if let Some(caps) = QUOTE_BLOCK.captures(raw) {
        (caps["text"].to_string(), caps["author"].to_string())
    } else {
        let joined = WHITESPACE.replace_all(raw.trim(), " ").into_owned();
        let caps = ATTRIBUTION
            .captures(&joined)
            .ok_or(Rejection::MalformedQuote)?;
        (caps["text"].to_string(), caps["author"].to_string())
    };

    let text = clean_and_validate(&text, policy)?;

    let author = strip_decorations(&WHITESPACE.replace_all(&author, " "), true);
    let author_words = author.split_whitespace().count();
    if author.is_empty() || author_words > 8 || author.chars().count() > 60 || author.contains('<')
    {
        return Err(Rejection::BadAuthor);
    }

    Ok(Quote { text, author })
}

fn strip_decorations(text: &str, strip_quotes: bool) -> String {
    let (leading, trailing) = if strip_quotes {
        (&*LEADING_DECORATION, &*TRAILING_DECORATION)
    } else {
        (&*LEADING_BULLET, &*TRAILING_BULLET)
    };

    let mut current = text.trim().to_string();
    loop {
        let mut next = leading.replace(&current, "").into_owned();
        next = LEADING_NUMBERING.replace(&next, "").into_owned();
        next = LEADING_LABEL.replace(&next, "").into_owned();
        next = trailing.replace(&next, "").into_owned();
        let next = next.trim().to_string();

        if next == current {
            return current;
        }
        current = next;
    }
}

fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let hard_end = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let head = &text[..hard_end];

    match head.rfind(' ') {
        Some(space) if space > 0 => head[..space].to_string(),
        _ => head.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting() -> CleanPolicy {
        CleanPolicy::for_kind(ContentKind::Greeting)
    }

    fn wish() -> CleanPolicy {
        CleanPolicy::for_kind(ContentKind::Wish)
    }

    #[test]
    fn strips_quotes_bullets_and_numbering() {
        assert_eq!(clean("\"Good morning!\"", &greeting()), "Good morning!");
        assert_eq!(clean("* Rise and shine!", &greeting()), "Rise and shine!");
        assert_eq!(clean("1. Hello, sunshine!", &greeting()), "Hello, sunshine!");
        assert_eq!(clean("- \"“Evening vibes!”\" -", &greeting()), "Evening vibes!");
        assert_eq!(clean("Greeting: Good night!", &greeting()), "Good night!");
    }

    #[test]
    fn keeps_first_line_and_sentence() {
        let raw = "\n\n  \"Good morning, sunshine! Hope you slept well.\"\nAlternative: Hi";
        assert_eq!(clean(raw, &greeting()), "Good morning, sunshine!");

        let raw = "May your day be bright and full of joy!\n2. Another wish";
        assert_eq!(clean(raw, &wish()), "May your day be bright and full of joy!");
    }

    #[test]
    fn sentence_ends_before_closing_quotes() {
        assert_eq!(
            clean("\"Good morning!\" \"Sweet dreams!\"", &greeting()),
            "Good morning!"
        );
        assert_eq!(
            clean("“Rise and shine, friend!” Have a great day.", &greeting()),
            "Rise and shine, friend!"
        );
        assert_eq!(
            clean("**Hello, sunshine!** Enjoy.", &greeting()),
            "Hello, sunshine!"
        );
    }

    #[test]
    fn collapses_whitespace_when_joining_lines() {
        let policy = CleanPolicy::for_kind(ContentKind::Quote);
        assert_eq!(
            clean("The best   way\nout is\n\nalways through.", &policy),
            "The best way out is always through."
        );
    }

    #[test]
    fn truncates_on_word_boundary() {
        let policy = CleanPolicy {
            max_chars: 12,
            ..greeting()
        };
        assert_eq!(clean("Wonderful morning to you", &policy), "Wonderful");
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "\"Good morning!\"",
            "  1) **Rise and shine, friend!** Have fun.  ",
            "- “I wish you a calm evening.” -\n- second",
            "Greeting: 'Quote: hello there'",
            "\n\n",
            "\"\"",
            "\"Good morning!\" \"Sweet dreams!\"",
            "A very long wish that keeps going and going well past any reasonable length for a single line of text that anybody would want to read aloud at breakfast on a sunny Sunday morning in the park with friends and family",
            "<quote>\"Stay hungry.\"\n<author>Steve Jobs",
        ];

        for kind in ContentKind::ALL {
            let policy = CleanPolicy::for_kind(kind);
            for sample in samples {
                let once = clean(sample, &policy);
                assert_eq!(clean(&once, &policy), once, "kind {kind}, sample {sample:?}");
            }
        }
    }

    #[test]
    fn rejects_empty_and_out_of_range_lengths() {
        assert_eq!(validate("", &greeting()), Err(Rejection::Empty));
        assert!(matches!(
            validate("Hi", &greeting()),
            Err(Rejection::TooShort { .. })
        ));
        assert!(matches!(
            validate(&"word ".repeat(20), &greeting()),
            Err(Rejection::TooLong { .. })
        ));
        assert_eq!(validate("Good morning!", &greeting()), Ok(()));
    }

    #[test]
    fn rejects_meta_commentary() {
        assert_eq!(
            validate("Okay, good morning!", &greeting()),
            Err(Rejection::BannedToken("okay".to_string()))
        );
        assert_eq!(
            validate("Here are some options for you", &wish()),
            Err(Rejection::BannedToken("here".to_string()))
        );
        assert_eq!(
            validate("As an AI I wish you a nice day", &wish()),
            Err(Rejection::BannedToken("as an ai".to_string()))
        );
        // whole words only
        assert_eq!(validate("Wishing everyone somewhere sunny", &wish()), Ok(()));
    }

    #[test]
    fn parses_tagged_quote() {
        let policy = CleanPolicy::for_kind(ContentKind::Quote);
        let quote = parse_quote(
            "<quote>\"The only way to do great work is to love what you do.\"\n<author>Steve Jobs\n",
            &policy,
        )
        .unwrap();
        assert_eq!(
            quote.text,
            "The only way to do great work is to love what you do."
        );
        assert_eq!(quote.author, "Steve Jobs");
    }

    #[test]
    fn parses_dash_attribution() {
        let policy = CleanPolicy::for_kind(ContentKind::Quote);
        let quote = parse_quote("\"Well done is better than well said.\" — Benjamin Franklin", &policy)
            .unwrap();
        assert_eq!(quote.text, "Well done is better than well said.");
        assert_eq!(quote.author, "Benjamin Franklin");
    }

    #[test]
    fn rejects_quote_without_attribution() {
        let policy = CleanPolicy::for_kind(ContentKind::Quote);
        assert_eq!(
            parse_quote("Just some words without an author", &policy),
            Err(Rejection::MalformedQuote)
        );
        assert_eq!(
            parse_quote("<quote>\"Keep going, always.\"\n<author>  ", &policy),
            Err(Rejection::MalformedQuote)
        );
    }
}
