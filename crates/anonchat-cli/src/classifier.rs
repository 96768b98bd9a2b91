//! Keyword-based content classifier
//!
//! An offline stand-in for a text model: interest labels come from a keyword
//! table, toxicity from a blocklist. Matching is on lowercase word tokens.

use anonchat_core::{ContentClassifier, SafetyVerdict};
use async_trait::async_trait;

const INTEREST_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Music",
        &["music", "song", "songs", "band", "guitar", "piano", "concert", "album", "rap", "jazz", "synthwave"],
    ),
    (
        "Coding",
        &["code", "coding", "programming", "rust", "python", "software", "developer", "compiler", "bug"],
    ),
    (
        "Dating",
        &["date", "dating", "love", "romance", "relationship", "crush", "single"],
    ),
    (
        "Gaming",
        &["game", "games", "gaming", "gamer", "console", "minecraft", "steam", "rpg"],
    ),
    (
        "Fitness",
        &["gym", "fitness", "workout", "running", "lifting", "yoga", "cardio", "training"],
    ),
];

const DEFAULT_BLOCKLIST: &[&str] = &["idiot", "stupid", "loser", "kill", "hate"];

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    interests: Vec<(String, Vec<String>)>,
    blocklist: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            interests: INTEREST_KEYWORDS
                .iter()
                .map(|(label, words)| {
                    (label.to_string(), words.iter().map(|w| w.to_string()).collect())
                })
                .collect(),
            blocklist: DEFAULT_BLOCKLIST.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the blocklist
    pub fn with_blocklist<I, T>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.blocklist = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    /// Label with the most keyword hits; earlier labels win ties
    fn best_label(&self, text: &str) -> Option<&str> {
        let tokens = Self::tokens(text);
        let mut best: Option<(&str, usize)> = None;

        for (label, words) in &self.interests {
            let hits = tokens.iter().filter(|t| words.contains(t)).count();
            if hits > 0 && best.map_or(true, |(_, most)| hits > most) {
                best = Some((label.as_str(), hits));
            }
        }
        best.map(|(label, _)| label)
    }
}

#[async_trait]
impl ContentClassifier for KeywordClassifier {
    async fn classify_interest(&self, text: &str) -> Option<String> {
        self.best_label(text).map(str::to_string)
    }

    async fn check_safety(&self, text: &str) -> SafetyVerdict {
        let toxic = Self::tokens(text)
            .iter()
            .any(|t| self.blocklist.contains(t));
        if toxic {
            SafetyVerdict::Toxic
        } else {
            SafetyVerdict::Safe
        }
    }
}
