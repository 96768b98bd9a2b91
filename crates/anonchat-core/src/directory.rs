//! Participant Directory and Report Ledger
//!
//! Participants are never registered explicitly: every lookup treats an unknown
//! identifier as a fresh participant with no interest and no reports.

use std::collections::HashMap;

use crate::types::{InterestTag, ParticipantId};

// ----------------------------------------------------------------------------
// Participant Directory
// ----------------------------------------------------------------------------

/// Declared interest per participant
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    interests: HashMap<ParticipantId, Option<InterestTag>>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a participant has been seen
    pub fn touch(&mut self, participant: ParticipantId) {
        self.interests.entry(participant).or_insert(None);
    }

    /// Interest of a participant, `None` when unset or unknown
    pub fn interest(&self, participant: ParticipantId) -> Option<&InterestTag> {
        self.interests.get(&participant).and_then(Option::as_ref)
    }

    /// Set the interest, returning the previous one
    pub fn set_interest(&mut self, participant: ParticipantId, tag: InterestTag) -> Option<InterestTag> {
        self.interests.insert(participant, Some(tag)).flatten()
    }

    /// Clear the interest, returning the previous one
    pub fn clear_interest(&mut self, participant: ParticipantId) -> Option<InterestTag> {
        self.interests.insert(participant, None).flatten()
    }

    /// Number of participants seen so far
    pub fn len(&self) -> usize {
        self.interests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Report Ledger
// ----------------------------------------------------------------------------

/// Reports filed against each participant. Counts only ever grow.
#[derive(Debug, Default)]
pub struct ReportLedger {
    counts: HashMap<ParticipantId, u32>,
}

impl ReportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one report against `participant` and return the new count
    pub fn record(&mut self, participant: ParticipantId) -> u32 {
        let count = self.counts.entry(participant).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn count(&self, participant: ParticipantId) -> u32 {
        self.counts.get(&participant).copied().unwrap_or(0)
    }
}
