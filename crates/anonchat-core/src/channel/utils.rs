//! Channel Utilities for CSP Communication
//!
//! Bounded tokio mpsc channels carry commands, events and app events; effects
//! fan out to every attached transport over a broadcast channel.

use crate::channel::communication::{AppEvent, Command, Effect, Event};
use crate::config::ChannelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel buffer is full")]
    ChannelFull,
    #[error("Channel is closed")]
    ChannelClosed,
}

pub type CommandSender = tokio::sync::mpsc::Sender<Command>;
pub type CommandReceiver = tokio::sync::mpsc::Receiver<Command>;
pub type EventSender = tokio::sync::mpsc::Sender<Event>;
pub type EventReceiver = tokio::sync::mpsc::Receiver<Event>;
pub type EffectSender = tokio::sync::broadcast::Sender<Effect>;
pub type EffectReceiver = tokio::sync::broadcast::Receiver<Effect>;
pub type AppEventSender = tokio::sync::mpsc::Sender<AppEvent>;
pub type AppEventReceiver = tokio::sync::mpsc::Receiver<AppEvent>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded command channel (Operator → Core Logic)
pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    tokio::sync::mpsc::channel(config.command_buffer_size)
}

/// Create bounded event channel (Transport → Core Logic)
pub fn create_event_channel(config: &ChannelConfig) -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(config.event_buffer_size)
}

/// Create broadcast effect channel (One-to-Many: Core Logic → Transports)
/// Returns a sender and a _receiver. Actual receivers should be created by calling sender.subscribe()
pub fn create_effect_channel(config: &ChannelConfig) -> (EffectSender, EffectReceiver) {
    tokio::sync::broadcast::channel(config.effect_buffer_size)
}

/// Create an effect receiver by subscribing to the broadcast channel
pub fn create_effect_receiver(effect_sender: &EffectSender) -> EffectReceiver {
    effect_sender.subscribe()
}

/// Create bounded app event channel (Core Logic → Operator)
pub fn create_app_event_channel(config: &ChannelConfig) -> (AppEventSender, AppEventReceiver) {
    tokio::sync::mpsc::channel(config.app_event_buffer_size)
}

// ----------------------------------------------------------------------------
// Non-blocking Send Utilities
// ----------------------------------------------------------------------------

/// Non-blocking send for adapters that must not stall on a full core queue
pub trait NonBlockingSend<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError>;
}

impl<T> NonBlockingSend<T> for tokio::sync::mpsc::Sender<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError> {
        self.try_send(message).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticipantId;

    #[tokio::test]
    async fn try_send_reports_full_and_closed() {
        let config = ChannelConfig {
            event_buffer_size: 1,
            ..ChannelConfig::testing()
        };
        let (sender, receiver) = create_event_channel(&config);
        let event = Event::Connect {
            participant: ParticipantId::new(1),
        };

        assert_eq!(sender.try_send_non_blocking(event.clone()), Ok(()));
        assert_eq!(
            sender.try_send_non_blocking(event.clone()),
            Err(ChannelError::ChannelFull)
        );

        drop(receiver);
        assert_eq!(
            sender.try_send_non_blocking(event),
            Err(ChannelError::ChannelClosed)
        );
    }

    #[test]
    fn channel_errors_display_their_cause() {
        assert_eq!(ChannelError::ChannelFull.to_string(), "Channel buffer is full");
        assert_eq!(ChannelError::ChannelClosed.to_string(), "Channel is closed");
    }

    #[tokio::test]
    async fn effects_reach_every_subscriber() {
        let (sender, _keep) = create_effect_channel(&ChannelConfig::testing());
        let mut first = create_effect_receiver(&sender);
        let mut second = create_effect_receiver(&sender);

        let effect = Effect::notify(
            ParticipantId::new(3),
            crate::channel::communication::Notice::Waiting,
        );
        sender.send(effect.clone()).unwrap();

        assert_eq!(first.recv().await.unwrap(), effect);
        assert_eq!(second.recv().await.unwrap(), effect);
    }
}
