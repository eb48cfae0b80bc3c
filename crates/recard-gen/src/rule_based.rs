//! Deterministic rule-based card generation.
//!
//! Produces a card's title/content/type/tags from a stored snippet with
//! no model call: same snippet in, same card out, every time. This is
//! the always-available half of the regenerate/compare workflow.

use async_trait::async_trait;
use tracing::debug;

use recard_core::{CardGenerator, CardType, Error, GeneratedCard, Result};

/// Maximum title length in characters.
const TITLE_MAX_CHARS: usize = 80;

/// Maximum number of keyword tags.
const TAG_LIMIT: usize = 5;

/// Words too common to be useful as tags.
const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "between", "both", "each", "every",
    "from", "have", "into", "more", "most", "other", "over", "shall", "should", "some", "such",
    "than", "that", "their", "them", "then", "there", "these", "they", "this", "those", "under",
    "until", "upon", "were", "what", "when", "where", "which", "while", "will", "with", "within",
    "would", "your",
];

/// Leading verbs that mark an action card.
const ACTION_VERBS: &[&str] = &[
    "add", "check", "complete", "conduct", "create", "define", "ensure", "perform", "prepare",
    "review", "run", "schedule", "send", "submit", "update", "verify", "write",
];

/// The deterministic generation strategy.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedGenerator;

impl RuleBasedGenerator {
    pub fn new() -> Self {
        Self
    }
}

/// Collapse whitespace runs within lines and drop blank lines.
fn clean_snippet(snippet: &str) -> String {
    snippet
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First sentence (or line), stripped of list markers, truncated on a
/// character boundary.
fn derive_title(cleaned: &str) -> String {
    let first_line = cleaned.lines().next().unwrap_or_default();
    let first_sentence = first_line
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(first_line);
    let stripped = first_sentence
        .trim_start_matches(['-', '*', '•', '#', ' '])
        .trim()
        .trim_end_matches(['.', '!', '?']);
    stripped.chars().take(TITLE_MAX_CHARS).collect()
}

fn is_list_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('-')
        || trimmed.starts_with('*')
        || trimmed.starts_with('•')
        || trimmed
            .split_once('.')
            .is_some_and(|(head, _)| head.chars().all(|c| c.is_ascii_digit()) && !head.is_empty())
}

/// Infer the card type from the snippet's shape.
fn infer_card_type(cleaned: &str) -> CardType {
    let list_lines = cleaned.lines().filter(|l| is_list_line(l)).count();
    if list_lines >= 2 {
        return CardType::Checklist;
    }
    let trimmed = cleaned.trim_start();
    if trimmed.starts_with('"') || trimmed.starts_with('\u{201c}') {
        return CardType::Quote;
    }
    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if ACTION_VERBS.contains(&first_word.as_str()) {
        return CardType::Action;
    }
    CardType::Concept
}

/// Top keywords by frequency, ties broken alphabetically so the result
/// is stable.
fn extract_tags(cleaned: &str) -> Vec<String> {
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for word in cleaned.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if word.len() < 4 || !word.chars().any(|c| c.is_alphabetic()) {
            continue;
        }
        if STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(TAG_LIMIT).map(|(w, _)| w).collect()
}

#[async_trait]
impl CardGenerator for RuleBasedGenerator {
    async fn generate(&self, snippet: &str) -> Result<GeneratedCard> {
        let cleaned = clean_snippet(snippet);
        if cleaned.is_empty() {
            return Err(Error::Generation(
                "snippet is empty after normalization".into(),
            ));
        }

        let card = GeneratedCard {
            title: derive_title(&cleaned),
            card_type: infer_card_type(&cleaned),
            tags: extract_tags(&cleaned),
            // Category stays with the card being regenerated.
            category: None,
            content: cleaned,
        };
        debug!(
            subsystem = "gen",
            component = "rule_based",
            op = "generate",
            strategy = "rule-based",
            "Generated card from snippet"
        );
        Ok(card)
    }
}
