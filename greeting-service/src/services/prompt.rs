//! Prompt construction.

use crate::models::ContentKind;

/// Longest history entry quoted back into a prompt.
const DEFAULT_ENTRY_MAX_CHARS: usize = 200;

/// Builds the instruction string sent to the model.
///
/// History entries are interpolated verbatim apart from newline collapsing and
/// a length cap; they are client-supplied and not otherwise sanitized.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    entry_max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            entry_max_chars: DEFAULT_ENTRY_MAX_CHARS,
        }
    }
}

impl PromptBuilder {
    pub fn new(entry_max_chars: usize) -> Self {
        Self { entry_max_chars }
    }

    pub fn build(&self, kind: ContentKind, content_type: &str, history: &[String]) -> String {
        let avoid = self.avoid_entries(history, kind.history_window());

        match kind {
            ContentKind::Greeting => greeting_prompt(content_type, &avoid),
            ContentKind::Wish => wish_prompt(content_type, &avoid),
            ContentKind::Quote => quote_prompt(content_type, &avoid),
        }
    }

    /// Last `window` distinct entries, oldest first.
    fn avoid_entries(&self, history: &[String], window: usize) -> Vec<String> {
        let mut recent: Vec<String> = Vec::with_capacity(window);

        for entry in history.iter().rev() {
            if recent.len() == window {
                break;
            }
            let entry = self.normalize_entry(entry);
            if !entry.is_empty() && !recent.contains(&entry) {
                recent.push(entry);
            }
        }

        recent.reverse();
        recent
    }

    fn normalize_entry(&self, entry: &str) -> String {
        entry
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(self.entry_max_chars)
            .collect()
    }
}

fn quoted_list(entries: &[String]) -> String {
    entries
        .iter()
        .map(|e| format!("\"{}\"", e))
        .collect::<Vec<_>>()
        .join("; ")
}

fn greeting_prompt(content_type: &str, avoid: &[String]) -> String {
    let mut prompt = format!(
        "Write ONE short {content_type} greeting (3-8 words).\n\
         Examples: \"Good morning!\", \"Rise and shine!\"\n"
    );
    if !avoid.is_empty() {
        prompt.push_str(&format!("Avoid: {}\n", quoted_list(avoid)));
    }
    prompt.push_str(
        "Reply with ONLY the greeting text: no quotes, no numbering, no explanation.\n\nGreeting:",
    );
    prompt
}

fn wish_prompt(content_type: &str, avoid: &[String]) -> String {
    let mut prompt = format!("Generate ONE {content_type} wish (10-20 words).\n");
    if !avoid.is_empty() {
        prompt.push_str(&format!("Avoid: {}\n", quoted_list(avoid)));
    }
    prompt.push_str(
        "\nExamples:\n\
         \"I wish you a productive and joyful day!\"\n\
         \"May your evening bring peace and relaxation!\"\n\n\
         ONLY wish text:",
    );
    prompt
}

fn quote_prompt(theme: &str, avoid: &[String]) -> String {
    let mut prompt = String::from(
        "Generate ONE UNIQUE inspirational quote in this format:\n\
         <quote>\"Quote text here\"\n\
         <author>Author Name\n",
    );
    prompt.push_str(&format!("Theme: {theme}\n"));

    if !avoid.is_empty() {
        prompt.push_str("\nAvoid these previously generated quotes (DO NOT REPEAT):\n");
        for (i, quote) in avoid.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, quote));
        }
    }

    prompt.push_str(
        "\nREQUIREMENTS:\n\
         - Must be completely different from the quotes above\n\
         - Use diverse topics: success, courage, wisdom, happiness, perseverance\n\
         - Real or inspirational authors\n\
         - Keep it concise and powerful\n\n\
         Return ONLY the quote in the exact format.",
    );
    prompt
}
