//! Pairing Engine
//!
//! State machine that moves participants between `Idle`, `Waiting` and
//! `Paired`. It owns the participant directory, the report ledger, the waiting
//! pool and the pairing map, and is the only code that mutates them.
//!
//! Every operation is total: duplicate connects, disconnects while idle and
//! reports without a partner are no-ops rather than errors. Operations return a
//! [`Reaction`] describing the outcome together with the notifications the
//! transport must deliver; nothing is sent from inside the engine.
//!
//! ## Matching
//!
//! 1. Scan the pool oldest-first for a participant whose interest equals the
//!    requester's (two unset interests match when
//!    [`MatchingConfig::unset_matches_unset`] is on).
//! 2. Otherwise fall back to the oldest waiting participant, unless the
//!    policy is [`FallbackPolicy::Enqueue`] and the requester declared an interest.
//! 3. Otherwise append the requester to the pool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::{AppEvent, Effect, Notice};
use crate::config::{FallbackPolicy, MatchingConfig};
use crate::directory::{ParticipantDirectory, ReportLedger};
use crate::pool::WaitingPool;
use crate::relay::Delivery;
use crate::types::{InterestTag, ParticipantId, ParticipantState};

// ----------------------------------------------------------------------------
// Reactions and Outcomes
// ----------------------------------------------------------------------------

/// Result of an engine operation: what happened, plus what must be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction<T> {
    pub outcome: T,
    /// Notifications for participants, in delivery order
    pub effects: Vec<Effect>,
    /// Events for the operator
    pub app_events: Vec<AppEvent>,
}

impl<T> Reaction<T> {
    pub fn new(outcome: T) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
            app_events: Vec::new(),
        }
    }

    /// Append another reaction's side effects and hand back its outcome
    fn absorb<U>(&mut self, other: Reaction<U>) -> U {
        self.effects.extend(other.effects);
        self.app_events.extend(other.app_events);
        other.outcome
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reaction<U> {
        Reaction {
            outcome: f(self.outcome),
            effects: self.effects,
            app_events: self.app_events,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Duplicate request while already queued
    AlreadyWaiting,
    /// Duplicate request while already chatting
    AlreadyPaired { partner: ParticipantId },
    /// A new pair was formed
    Paired { partner: ParticipantId },
    /// No partner available; the requester was queued
    Waiting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// The participant was removed from the waiting pool
    pub left_pool: bool,
    /// The partner of the pair that was torn down
    pub former_partner: Option<ParticipantId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextOutcome {
    pub former_partner: Option<ParticipantId>,
    pub connect: ConnectOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFiled {
    pub reported: ParticipantId,
    /// Report count of `reported` after this report
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOutcome {
    /// `None` when the reporter had no partner
    pub filed: Option<ReportFiled>,
    pub disconnect: DisconnectOutcome,
}

/// Counters kept by the engine since startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Connect requests that went through matching; duplicates are not counted
    pub connect_requests: u64,
    pub pairs_formed: u64,
    pub pairs_ended: u64,
    pub messages_relayed: u64,
    pub messages_dropped: u64,
    pub reports_filed: u64,
}

/// A broken structural invariant. Never expected outside of bugs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("participant {0} is both waiting and paired")]
    WaitingAndPaired(ParticipantId),
    #[error("pairing {0} -> {1} has no matching reverse entry")]
    Asymmetric(ParticipantId, ParticipantId),
    #[error("participant {0} is paired with itself")]
    SelfPaired(ParticipantId),
}

// ----------------------------------------------------------------------------
// Pairing Engine
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PairingEngine {
    config: MatchingConfig,
    directory: ParticipantDirectory,
    ledger: ReportLedger,
    pool: WaitingPool,
    /// Both directions of every active pair
    pairs: HashMap<ParticipantId, ParticipantId>,
    stats: EngineStats,
}

impl PairingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Replace the matching policy. Existing pairs and waiters are untouched.
    pub fn set_config(&mut self, config: MatchingConfig) {
        info!("Matching policy updated: {:?}", config);
        self.config = config;
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Find a partner for `participant` or queue them
    pub fn request_connect(&mut self, participant: ParticipantId) -> Reaction<ConnectOutcome> {
        self.directory.touch(participant);

        if let Some(&partner) = self.pairs.get(&participant) {
            debug!("Ignoring connect from {}: already paired", participant);
            return Reaction::new(ConnectOutcome::AlreadyPaired { partner });
        }
        if self.pool.contains(participant) {
            debug!("Ignoring connect from {}: already waiting", participant);
            return Reaction::new(ConnectOutcome::AlreadyWaiting);
        }
        self.stats.connect_requests += 1;

        match self.select_partner(participant) {
            Some(partner) => {
                self.pool.remove(partner);
                self.pairs.insert(participant, partner);
                self.pairs.insert(partner, participant);
                self.stats.pairs_formed += 1;
                info!("Paired {} with {}", participant, partner);

                let mut reaction = Reaction::new(ConnectOutcome::Paired { partner });
                reaction.effects.push(Effect::notify(participant, Notice::Connected));
                reaction.effects.push(Effect::notify(partner, Notice::Connected));
                reaction
            }
            None => {
                self.pool.push_back(participant);
                debug!("{} waiting ({} in pool)", participant, self.pool.len());

                let mut reaction = Reaction::new(ConnectOutcome::Waiting);
                reaction.effects.push(Effect::notify(participant, Notice::Waiting));
                reaction
            }
        }
    }

    /// Leave the pool and/or the current pair. Safe to call in any state.
    pub fn disconnect(&mut self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        let left_pool = self.pool.remove(participant);
        let former_partner = self.pairs.remove(&participant);
        let mut reaction = Reaction::new(DisconnectOutcome {
            left_pool,
            former_partner,
        });

        if let Some(partner) = former_partner {
            self.pairs.remove(&partner);
            self.stats.pairs_ended += 1;
            info!("Pair {} / {} ended by {}", participant, partner, participant);
            reaction.effects.push(Effect::notify(partner, Notice::PartnerLeft));
        }

        reaction
    }

    /// Disconnect, then immediately look for a new partner
    pub fn next(&mut self, participant: ParticipantId) -> Reaction<NextOutcome> {
        let mut reaction = Reaction::new(());
        let disconnect = reaction.absorb(self.disconnect(participant));
        let connect = reaction.absorb(self.request_connect(participant));
        reaction.map(|_| NextOutcome {
            former_partner: disconnect.former_partner,
            connect,
        })
    }

    /// Reset the participant and show the main menu
    pub fn start(&mut self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        let mut reaction = self.disconnect(participant);
        reaction.effects.push(Effect::notify(participant, Notice::Welcome));
        reaction
    }

    /// Disconnect and confirm to the participant that the chat stopped
    pub fn stop(&mut self, participant: ParticipantId) -> Reaction<DisconnectOutcome> {
        let mut reaction = self.disconnect(participant);
        reaction.effects.push(Effect::notify(participant, Notice::Stopped));
        reaction
    }

    /// Report the current partner, then disconnect
    pub fn report(&mut self, reporter: ParticipantId) -> Reaction<ReportOutcome> {
        self.directory.touch(reporter);

        let filed = self
            .pairs
            .get(&reporter)
            .copied()
            .filter(|&partner| partner != reporter)
            .map(|reported| {
                let count = self.ledger.record(reported);
                self.stats.reports_filed += 1;
                info!("{} reported {} (total reports: {})", reporter, reported, count);
                ReportFiled { reported, count }
            });

        let mut reaction = Reaction::new(());
        reaction.effects.push(Effect::notify(reporter, Notice::Reported));
        if let Some(filed) = filed {
            if self.config.should_alert(filed.count) {
                reaction.app_events.push(AppEvent::ParticipantFlagged {
                    participant: filed.reported,
                    reports: filed.count,
                });
            }
        }

        let disconnect = reaction.absorb(self.disconnect(reporter));
        reaction.map(|_| ReportOutcome { filed, disconnect })
    }

    /// Declare an interest; only affects future matching
    pub fn set_interest(&mut self, participant: ParticipantId, tag: InterestTag) -> Reaction<Option<InterestTag>> {
        let previous = self.directory.set_interest(participant, tag.clone());
        debug!("{} interest set to {}", participant, tag);

        let mut reaction = Reaction::new(previous);
        reaction
            .effects
            .push(Effect::notify(participant, Notice::InterestSet { tag }));
        reaction
    }

    /// Remove the declared interest; only affects future matching
    pub fn clear_interest(&mut self, participant: ParticipantId) -> Reaction<Option<InterestTag>> {
        let previous = self.directory.clear_interest(participant);
        debug!("{} interest cleared", participant);

        let mut reaction = Reaction::new(previous);
        reaction
            .effects
            .push(Effect::notify(participant, Notice::InterestCleared));
        reaction
    }

    /// Account for a relay attempt
    pub(crate) fn record_delivery(&mut self, delivery: &Delivery) {
        match delivery {
            Delivery::Forwarded { .. } => self.stats.messages_relayed += 1,
            Delivery::Dropped { .. } => self.stats.messages_dropped += 1,
        }
    }

    // ------------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------------

    fn select_partner(&self, requester: ParticipantId) -> Option<ParticipantId> {
        let wanted = self.directory.interest(requester);

        let by_interest = self.pool.find(|candidate| {
            candidate != requester && self.interests_match(wanted, self.directory.interest(candidate))
        });
        if by_interest.is_some() {
            return by_interest;
        }

        match self.config.fallback {
            FallbackPolicy::Enqueue if wanted.is_some() => None,
            _ => self.pool.find(|candidate| candidate != requester),
        }
    }

    fn interests_match(&self, a: Option<&InterestTag>, b: Option<&InterestTag>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.config.unset_matches_unset,
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn state_of(&self, participant: ParticipantId) -> ParticipantState {
        if let Some(&partner) = self.pairs.get(&participant) {
            ParticipantState::Paired { partner }
        } else if self.pool.contains(participant) {
            ParticipantState::Waiting
        } else {
            ParticipantState::Idle
        }
    }

    pub fn partner_of(&self, participant: ParticipantId) -> Option<ParticipantId> {
        self.pairs.get(&participant).copied()
    }

    pub fn interest_of(&self, participant: ParticipantId) -> Option<&InterestTag> {
        self.directory.interest(participant)
    }

    pub fn report_count(&self, participant: ParticipantId) -> u32 {
        self.ledger.count(participant)
    }

    /// Waiting participants, oldest first
    pub fn waiting(&self) -> Vec<ParticipantId> {
        self.pool.iter().collect()
    }

    pub fn waiting_count(&self) -> usize {
        self.pool.len()
    }

    /// Active pairs, each listed once with the smaller identifier first
    pub fn pairs(&self) -> Vec<(ParticipantId, ParticipantId)> {
        let mut pairs: Vec<_> = self
            .pairs
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(&a, &b)| (a, b))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn active_pair_count(&self) -> usize {
        self.pairs.len() / 2
    }

    pub fn participant_count(&self) -> usize {
        self.directory.len()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Verify the structural invariants of pool and pairing map
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (&a, &b) in &self.pairs {
            if a == b {
                return Err(InvariantViolation::SelfPaired(a));
            }
            if self.pairs.get(&b) != Some(&a) {
                return Err(InvariantViolation::Asymmetric(a, b));
            }
            if self.pool.contains(a) {
                return Err(InvariantViolation::WaitingAndPaired(a));
            }
        }
        Ok(())
    }
}
