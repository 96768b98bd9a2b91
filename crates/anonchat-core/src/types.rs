//! Core types for the anonymous chat engine
//!
//! This module defines the fundamental identifiers and values handed between the
//! transport adapter and the engine, using newtype patterns for type safety.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::errors::AnonchatError;

// ----------------------------------------------------------------------------
// Participant Identifier
// ----------------------------------------------------------------------------

/// Opaque, stable identifier issued by the transport for a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Create a new ParticipantId from the raw transport handle
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw transport handle
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = AnonchatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| AnonchatError::invalid_input(format!("invalid participant id: {s:?}")))
    }
}

impl From<u64> for ParticipantId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

// ----------------------------------------------------------------------------
// Interest Tag
// ----------------------------------------------------------------------------

/// Self-declared interest category used to bias matching.
///
/// The engine compares tags by exact equality and never validates them; the
/// closed set offered to participants lives in [`crate::config::InterestCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterestTag(String);

impl InterestTag {
    pub fn new<T: Into<String>>(tag: T) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InterestTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for InterestTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

// ----------------------------------------------------------------------------
// Payload
// ----------------------------------------------------------------------------

/// Opaque message body relayed between paired participants
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Lossy UTF-8 view for text transports
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Message content stays out of logs.
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// ----------------------------------------------------------------------------
// Participant State
// ----------------------------------------------------------------------------

/// Per-participant lifecycle: `Idle -> Waiting -> Paired -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantState {
    Idle,
    Waiting,
    Paired { partner: ParticipantId },
}

impl ParticipantState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ParticipantState::Idle)
    }
}
