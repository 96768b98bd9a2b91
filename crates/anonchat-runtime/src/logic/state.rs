//! Core Logic State Management

use anonchat_core::Matchmaker;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ----------------------------------------------------------------------------
// Core Logic State
// ----------------------------------------------------------------------------

/// State owned by the Core Logic task
#[derive(Debug, Clone)]
pub struct CoreState {
    /// Shared handle to the pairing engine
    pub matchmaker: Matchmaker,
    /// Task start time for uptime calculation
    pub start_time: Instant,
    pub stats: CoreStats,
}

impl CoreState {
    pub fn new(matchmaker: Matchmaker) -> Self {
        Self {
            matchmaker,
            start_time: Instant::now(),
            stats: CoreStats::default(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Statistics for the Core Logic task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreStats {
    pub commands_processed: u64,
    pub events_processed: u64,
    pub effects_generated: u64,
    pub app_events_generated: u64,
    /// Effects sent while no transport was subscribed
    pub effects_unrouted: u64,
    /// App events dropped because the operator queue was full or gone
    pub app_events_dropped: u64,
}
