//! Shared Matchmaker Handle
//!
//! Wraps the [`PairingEngine`] in a single mutual-exclusion domain so that
//! concurrently arriving events see each operation as one atomic step. The
//! lock is held only while state is mutated; the returned effects are
//! dispatched by the caller after it has been released.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::channel::Event;
use crate::config::MatchingConfig;
use crate::pairing::{
    ConnectOutcome, DisconnectOutcome, EngineStats, InvariantViolation, NextOutcome,
    PairingEngine, Reaction, ReportOutcome,
};
use crate::relay::{Delivery, Relay};
use crate::types::{InterestTag, ParticipantId, ParticipantState, Payload};

/// Read-only view of the engine at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub participants: usize,
    /// Waiting participants, oldest first
    pub waiting: Vec<ParticipantId>,
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
    pub stats: EngineStats,
}

/// Cloneable handle to the process-wide engine
#[derive(Debug, Clone, Default)]
pub struct Matchmaker {
    engine: Arc<Mutex<PairingEngine>>,
}

impl Matchmaker {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            engine: Arc::new(Mutex::new(PairingEngine::new(config))),
        }
    }

    pub fn connect(&self, participant: ParticipantId) -> Reaction<ConnectOutcome> {
        self.engine.lock().request_connect(participant)
    }

    pub fn disconnect(&self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        self.engine.lock().disconnect(participant)
    }

    /// Disconnect and reconnect under one lock acquisition
    pub fn next(&self, participant: ParticipantId) -> Reaction<NextOutcome> {
        self.engine.lock().next(participant)
    }

    pub fn start(&self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        self.engine.lock().start(participant)
    }

    pub fn stop(&self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        self.engine.lock().stop(participant)
    }

    pub fn report(&self, participant: ParticipantId) -> Reaction<ReportOutcome> {
        self.engine.lock().report(participant)
    }

    pub fn set_interest(&self, participant: ParticipantId, tag: InterestTag) -> Reaction<Option<InterestTag>> {
        self.engine.lock().set_interest(participant, tag)
    }

    pub fn clear_interest(&self, participant: ParticipantId) -> Reaction<Option<InterestTag>> {
        self.engine.lock().clear_interest(participant)
    }

    pub fn forward(&self, sender: ParticipantId, payload: Payload) -> Reaction<Delivery> {
        let mut engine = self.engine.lock();
        let reaction = Relay::forward(&engine, sender, payload);
        engine.record_delivery(&reaction.outcome);
        reaction
    }

    /// Route an inbound transport event to the matching operation
    pub fn handle_event(&self, event: Event) -> Reaction<()> {
        match event {
            Event::Start { participant } => self.start(participant).map(drop),
            Event::Connect { participant } => self.connect(participant).map(drop),
            Event::Next { participant } => self.next(participant).map(drop),
            Event::Stop { participant } => self.stop(participant).map(drop),
            Event::Report { participant } => self.report(participant).map(drop),
            Event::SetInterest { participant, tag } => {
                self.set_interest(participant, tag).map(drop)
            }
            Event::ClearInterest { participant } => self.clear_interest(participant).map(drop),
            Event::Message {
                participant,
                payload,
            } => self.forward(participant, payload).map(drop),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn state_of(&self, participant: ParticipantId) -> ParticipantState {
        self.engine.lock().state_of(participant)
    }

    pub fn report_count(&self, participant: ParticipantId) -> u32 {
        self.engine.lock().report_count(participant)
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.lock().stats().clone()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let engine = self.engine.lock();
        EngineSnapshot {
            participants: engine.participant_count(),
            waiting: engine.waiting(),
            pairs: engine.pairs(),
            stats: engine.stats().clone(),
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.engine.lock().check_invariants()
    }
}
