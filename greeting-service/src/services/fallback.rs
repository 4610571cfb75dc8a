//! Static fallback strings served when generation fails.

use crate::models::ContentKind;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Placeholder replaced by the requested content type in default entries.
const TYPE_PLACEHOLDER: &str = "{type}";

/// How an entry is chosen when a content type has several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackSelection {
    First,
    #[default]
    Random,
}

impl FromStr for FallbackSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(FallbackSelection::First),
            "random" => Ok(FallbackSelection::Random),
            other => Err(format!("unknown fallback selection '{}'", other)),
        }
    }
}

/// Immutable content type → pre-written strings map for one kind.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    entries: HashMap<String, Vec<String>>,
    default: Vec<String>,
}

impl FallbackTable {
    /// Build a table. Empty lists are dropped; an empty default is replaced
    /// with a generic line so `pick` always has something to return.
    pub fn new(entries: HashMap<String, Vec<String>>, default: Vec<String>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, list)| (key.to_lowercase(), list))
            .collect();
        let default = if default.is_empty() {
            vec!["Hello!".to_string()]
        } else {
            default
        };
        Self { entries, default }
    }

    /// Built-in table for a kind.
    pub fn builtin(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Greeting => Self::new(
                table([
                    entry("morning", &["Good morning!", "Rise and shine!"]),
                    entry("afternoon", &["Good afternoon!", "Afternoon boost!"]),
                    entry("evening", &["Good evening!", "Evening vibes!"]),
                    entry("night", &["Good night!", "Sweet dreams!"]),
                ]),
                strings(&["Hello!", "Hello! Have a wonderful day!"]),
            ),
            ContentKind::Wish => Self::new(
                table([
                    entry(
                        "day",
                        &[
                            "I wish you a productive and joyful day!",
                            "May your day be filled with small wins and big smiles!",
                        ],
                    ),
                    entry(
                        "morning",
                        &["May your morning start bright and carry you through a wonderful day!"],
                    ),
                    entry("evening", &["May your evening bring peace and relaxation!"]),
                    entry("night", &["I wish you a calm night and the sweetest of dreams!"]),
                ]),
                strings(&["I wish you a wonderful {type}!"]),
            ),
            ContentKind::Quote => Self::new(
                HashMap::new(),
                strings(&[
                    "<quote>\"Success is not final, failure is not fatal.\"\n<author>Winston Churchill",
                    "<quote>\"The only way to do great work is to love what you do.\"\n<author>Steve Jobs",
                    "<quote>\"Innovation distinguishes between a leader and a follower.\"\n<author>Steve Jobs",
                    "<quote>\"Life is 10% what happens to you and 90% how you react to it.\"\n<author>Charles R. Swindoll",
                    "<quote>\"The best time to plant a tree was 20 years ago. The second best time is now.\"\n<author>Chinese Proverb",
                ]),
            ),
        }
    }

    /// Every string `pick` may return for `content_type`.
    pub fn candidates(&self, content_type: &str) -> Vec<String> {
        match self.entries.get(&content_type.to_lowercase()) {
            Some(list) => list.clone(),
            None => self
                .default
                .iter()
                .map(|entry| entry.replace(TYPE_PLACEHOLDER, content_type))
                .collect(),
        }
    }

    /// Choose a fallback string. Never fails and never returns an empty list
    /// entry for a table built with non-empty strings.
    pub fn pick(&self, content_type: &str, selection: FallbackSelection) -> String {
        let candidates = self.candidates(content_type);
        let chosen = match selection {
            FallbackSelection::First => candidates.first(),
            FallbackSelection::Random => candidates.choose(&mut rand::thread_rng()),
        };

        chosen.cloned().unwrap_or_else(|| "Hello!".to_string())
    }
}

fn table<const N: usize>(rows: [(String, Vec<String>); N]) -> HashMap<String, Vec<String>> {
    rows.into_iter().collect()
}

fn entry(content_type: &str, list: &[&str]) -> (String, Vec<String>) {
    (content_type.to_string(), strings(list))
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
