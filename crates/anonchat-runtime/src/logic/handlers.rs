//! Core Logic Command and Event Handlers
//!
//! Handlers return the effects and app events to emit; the task sends them
//! once the engine lock has been released.

use anonchat_core::{AnonchatResult, AppEvent, Effect, Event, ParticipantId};
use tracing::{debug, error};

use super::state::CoreState;

pub type Emitted = (Vec<Effect>, Vec<AppEvent>);

// ----------------------------------------------------------------------------
// Event Handlers
// ----------------------------------------------------------------------------

/// Handlers for participant events arriving from transports
pub struct EventHandlers;

impl EventHandlers {
    /// Apply a participant event to the engine
    pub fn handle_event(
        state: &mut CoreState,
        event: Event,
        verify_invariants: bool,
    ) -> AnonchatResult<Emitted> {
        let participant = event.participant();
        let kind = event.kind();
        let reaction = state.matchmaker.handle_event(event);
        debug!(
            "{} from {} produced {} effect(s)",
            kind,
            participant,
            reaction.effects.len()
        );

        let mut app_events = reaction.app_events;
        if verify_invariants {
            if let Err(violation) = state.matchmaker.check_invariants() {
                error!("Engine invariant broken after {} from {}: {}", kind, participant, violation);
                app_events.push(AppEvent::SystemError {
                    error: violation.to_string(),
                });
            }
        }

        Ok((reaction.effects, app_events))
    }
}

// ----------------------------------------------------------------------------
// Command Handlers
// ----------------------------------------------------------------------------

/// Handlers for operator commands
pub struct CommandHandlers;

impl CommandHandlers {
    /// Handle system status request
    pub fn handle_get_system_status(state: &CoreState) -> AnonchatResult<Emitted> {
        let snapshot = state.matchmaker.snapshot();
        let app_events = vec![AppEvent::SystemStatusReport {
            participants: snapshot.participants,
            waiting: snapshot.waiting.len(),
            active_pairs: snapshot.pairs.len(),
            stats: snapshot.stats,
            uptime_seconds: state.uptime_seconds(),
        }];
        Ok((Vec::new(), app_events))
    }

    /// Handle report count lookup
    pub fn handle_get_report_count(
        state: &CoreState,
        participant: ParticipantId,
    ) -> AnonchatResult<Emitted> {
        let count = state.matchmaker.report_count(participant);
        Ok((Vec::new(), vec![AppEvent::ReportCount { participant, count }]))
    }

    /// Handle shutdown command
    pub fn handle_shutdown() -> AnonchatResult<Emitted> {
        Ok((Vec::new(), Vec::new()))
    }
}
