//! Core Logic Task Implementation

use anonchat_core::{
    channel::{AppEventSender, ChannelError, CommandReceiver, EffectSender, EventReceiver, NonBlockingSend},
    AnonchatResult, AppEvent, Command, Effect, Event, Matchmaker,
};
use tracing::{debug, error, info, warn};

use super::handlers::{CommandHandlers, EventHandlers};
use super::state::CoreState;

// ----------------------------------------------------------------------------
// Core Logic Task
// ----------------------------------------------------------------------------

/// The Core Logic task that processes all events and commands
pub struct CoreLogicTask {
    state: CoreState,
    /// Commands from the operator
    command_receiver: CommandReceiver,
    /// Participant events from transport tasks
    event_receiver: EventReceiver,
    /// Effects to transport tasks
    effect_sender: EffectSender,
    /// App events to the operator
    app_event_sender: AppEventSender,
    /// Check engine invariants after every event
    verify_invariants: bool,
    running: bool,
}

impl CoreLogicTask {
    pub fn new(
        matchmaker: Matchmaker,
        command_receiver: CommandReceiver,
        event_receiver: EventReceiver,
        effect_sender: EffectSender,
        app_event_sender: AppEventSender,
    ) -> Self {
        Self {
            state: CoreState::new(matchmaker),
            command_receiver,
            event_receiver,
            effect_sender,
            app_event_sender,
            verify_invariants: cfg!(debug_assertions),
            running: true,
        }
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// Run the main Core Logic task loop
    ///
    /// Returns when a `Shutdown` command arrives, when the command channel
    /// closes, or when an unrecoverable error occurs.
    pub async fn run(&mut self) -> AnonchatResult<()> {
        info!("Core Logic task starting");
        let mut events_open = true;

        while self.running {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(cmd) => {
                            debug!("Received command: {:?}", cmd);
                            if let Err(e) = self.process_command(cmd) {
                                if e.is_unrecoverable() {
                                    error!("Unrecoverable error processing command, shutting down CoreLogicTask: {}", e);
                                    self.running = false;
                                    return Err(e);
                                }
                                error!("Error processing command: {}", e);
                            }
                        }
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }

                event = self.event_receiver.recv(), if events_open => {
                    match event {
                        Some(evt) => {
                            debug!("Received {} from {}", evt.kind(), evt.participant());
                            if let Err(e) = self.process_event(evt) {
                                if e.is_unrecoverable() {
                                    error!("Unrecoverable error processing event, shutting down CoreLogicTask: {}", e);
                                    self.running = false;
                                    return Err(e);
                                }
                                warn!("Error processing event: {}", e);
                            }
                        }
                        None => {
                            // Keep serving operator commands after the last transport is gone
                            info!("Event channel closed");
                            events_open = false;
                        }
                    }
                }
            }
        }

        info!("Core Logic task stopped");
        Ok(())
    }

    fn process_command(&mut self, command: Command) -> AnonchatResult<()> {
        self.state.stats.commands_processed += 1;

        let (effects, app_events) = match command {
            Command::GetSystemStatus => CommandHandlers::handle_get_system_status(&self.state)?,
            Command::GetReportCount { participant } => {
                CommandHandlers::handle_get_report_count(&self.state, participant)?
            }
            Command::Shutdown => {
                self.running = false;
                CommandHandlers::handle_shutdown()?
            }
        };

        self.emit(effects, app_events)
    }

    fn process_event(&mut self, event: Event) -> AnonchatResult<()> {
        self.state.stats.events_processed += 1;
        let (effects, app_events) =
            EventHandlers::handle_event(&mut self.state, event, self.verify_invariants)?;
        self.emit(effects, app_events)
    }

    fn emit(&mut self, effects: Vec<Effect>, app_events: Vec<AppEvent>) -> AnonchatResult<()> {
        for effect in effects {
            self.send_effect(effect);
        }
        for app_event in app_events {
            self.send_app_event(app_event);
        }
        Ok(())
    }

    /// Broadcast an effect to every attached transport
    fn send_effect(&mut self, effect: Effect) {
        debug!("Emitting effect for {}: {:?}", effect.recipient(), effect);
        self.state.stats.effects_generated += 1;

        // A broadcast send only fails when no transport is subscribed; the
        // engine state has already moved on, so the notification is lost.
        if self.effect_sender.send(effect).is_err() {
            self.state.stats.effects_unrouted += 1;
            warn!("No transport subscribed, effect dropped");
        }
    }

    /// Queue an app event for the operator without stalling the loop
    fn send_app_event(&mut self, app_event: AppEvent) {
        debug!("Emitting app event: {:?}", app_event);

        match self.app_event_sender.try_send_non_blocking(app_event) {
            Ok(()) => self.state.stats.app_events_generated += 1,
            Err(ChannelError::ChannelFull) => {
                self.state.stats.app_events_dropped += 1;
                warn!("App event queue full, dropping app event");
            }
            Err(ChannelError::ChannelClosed) => {
                self.state.stats.app_events_dropped += 1;
                debug!("App event receiver gone, dropping app event");
            }
        }
    }
}
