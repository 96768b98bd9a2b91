//! Content classification collaborator
//!
//! Adapters may consult a classifier to turn free text into an interest tag or
//! to screen messages before they reach the engine. The engine never calls it
//! and treats whatever tag comes out as opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyVerdict {
    Safe,
    Toxic,
}

#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// One-word interest label for the text, if any
    async fn classify_interest(&self, text: &str) -> Option<String>;

    async fn check_safety(&self, text: &str) -> SafetyVerdict;
}

/// Classifier that never labels and never blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClassifier;

#[async_trait]
impl ContentClassifier for NoopClassifier {
    async fn classify_interest(&self, _text: &str) -> Option<String> {
        None
    }

    async fn check_safety(&self, _text: &str) -> SafetyVerdict {
        SafetyVerdict::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_classifier_passes_everything() {
        let classifier = NoopClassifier;
        assert_eq!(classifier.classify_interest("I love synthwave").await, None);
        assert_eq!(classifier.check_safety("anything").await, SafetyVerdict::Safe);
    }
}
