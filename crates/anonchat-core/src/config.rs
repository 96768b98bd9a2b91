//! Centralized Configuration Management
//!
//! This module consolidates the configuration structures used by the engine,
//! the runtime channels and the adapters so they can be loaded from one place.

use serde::{Deserialize, Serialize};

use crate::errors::{AnonchatError, AnonchatResult};
use crate::types::InterestTag;

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Configuration for CSP channel buffer sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Buffer size for Command channels (Operator → Core Logic)
    pub command_buffer_size: usize,
    /// Buffer size for Event channels (Transport → Core Logic)
    pub event_buffer_size: usize,
    /// Buffer size for Effect channels (Core Logic → Transport)
    pub effect_buffer_size: usize,
    /// Buffer size for AppEvent channels (Core Logic → Operator)
    pub app_event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,    // Operator commands are infrequent
            event_buffer_size: 256,     // Participant traffic is bursty
            effect_buffer_size: 256,    // Every event fans out to one or two notices
            app_event_buffer_size: 64,
        }
    }
}

impl ChannelConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            command_buffer_size: 16,
            event_buffer_size: 64,
            effect_buffer_size: 128,
            app_event_buffer_size: 32,
        }
    }
}

// ----------------------------------------------------------------------------
// Matching Configuration
// ----------------------------------------------------------------------------

/// What to do when no waiting participant shares the requester's interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Pair with the oldest waiting participant regardless of interest
    Fifo,
    /// A requester with an interest set waits for a matching partner instead
    Enqueue,
}

/// Configuration for the pairing engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Whether two participants without an interest count as an interest match
    pub unset_matches_unset: bool,
    /// Behaviour when the interest scan finds nobody
    pub fallback: FallbackPolicy,
    /// Alert the operator each time a report count reaches a multiple of this (0 disables)
    pub report_alert_threshold: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            unset_matches_unset: true,
            fallback: FallbackPolicy::Fifo,
            report_alert_threshold: 3,
        }
    }
}

impl MatchingConfig {
    /// Interest-only matching: participants with an interest never get a random partner
    pub fn strict_interest() -> Self {
        Self {
            fallback: FallbackPolicy::Enqueue,
            ..Self::default()
        }
    }

    /// Whether `count` crosses the operator alert threshold
    pub fn should_alert(&self, count: u32) -> bool {
        self.report_alert_threshold > 0 && count > 0 && count % self.report_alert_threshold == 0
    }
}

// ----------------------------------------------------------------------------
// Interest Catalog
// ----------------------------------------------------------------------------

/// The closed set of interest tags offered to participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCatalog {
    pub tags: Vec<String>,
}

impl Default for InterestCatalog {
    fn default() -> Self {
        Self {
            tags: ["Music", "Coding", "Gaming", "Dating"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl InterestCatalog {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the exact tag is offered
    pub fn contains(&self, tag: &InterestTag) -> bool {
        self.tags.iter().any(|t| t == tag.as_str())
    }

    /// Case-insensitive lookup returning the canonical tag
    pub fn resolve(&self, input: &str) -> Option<InterestTag> {
        let input = input.trim();
        self.tags
            .iter()
            .find(|t| t.eq_ignore_ascii_case(input))
            .map(|t| InterestTag::new(t.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn validate(&self) -> AnonchatResult<()> {
        if self.tags.is_empty() {
            return Err(AnonchatError::config_error("interest catalog must not be empty"));
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if tag.trim().is_empty() {
                return Err(AnonchatError::config_error("interest tags must not be blank"));
            }
            if self.tags[..i].iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return Err(AnonchatError::config_error(format!(
                    "duplicate interest tag: {tag}"
                )));
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Top-level Configuration
// ----------------------------------------------------------------------------

/// Complete engine and runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonchatConfig {
    /// Channel buffer configuration
    pub channels: ChannelConfig,
    /// Pairing policy
    pub matching: MatchingConfig,
    /// Interest tags offered by adapters
    pub interests: InterestCatalog,
}

impl AnonchatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AnonchatConfigBuilder {
        AnonchatConfigBuilder::default()
    }

    /// Configuration tuned for tests
    pub fn testing() -> Self {
        Self {
            channels: ChannelConfig::testing(),
            ..Self::default()
        }
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> AnonchatResult<()> {
        let channels = &self.channels;
        if channels.command_buffer_size == 0
            || channels.event_buffer_size == 0
            || channels.effect_buffer_size == 0
            || channels.app_event_buffer_size == 0
        {
            return Err(AnonchatError::config_error("channel buffer sizes must be positive"));
        }
        self.interests.validate()
    }
}

/// Builder for [`AnonchatConfig`]
#[derive(Debug, Default)]
pub struct AnonchatConfigBuilder {
    channels: Option<ChannelConfig>,
    matching: Option<MatchingConfig>,
    interests: Option<InterestCatalog>,
}

impl AnonchatConfigBuilder {
    pub fn channels(mut self, channels: ChannelConfig) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = Some(matching);
        self
    }

    pub fn interests(mut self, interests: InterestCatalog) -> Self {
        self.interests = Some(interests);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> AnonchatResult<AnonchatConfig> {
        let config = AnonchatConfig {
            channels: self.channels.unwrap_or_default(),
            matching: self.matching.unwrap_or_default(),
            interests: self.interests.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
