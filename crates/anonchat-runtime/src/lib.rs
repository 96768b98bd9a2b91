//! Anonchat Runtime Engine
//!
//! This crate runs the matchmaking engine from `anonchat-core`:
//! - `CoreLogicTask`: the single consumer of participant events and operator commands
//! - `RuntimeBuilder` / `RuntimeHandle`: wiring of channels, the core task and transports
//!
//! Transports plug in through [`TransportTask`] and never touch engine state directly.

pub mod builder;
pub mod logic;

pub use builder::{RuntimeBuilder, RuntimeHandle};
pub use logic::{CoreLogicTask, CoreStats};

// Re-export core types for convenience
pub use anonchat_core::{
    channel::{
        create_app_event_channel, create_command_channel, create_effect_channel,
        create_effect_receiver, create_event_channel, AppEventReceiver, AppEventSender,
        ChannelError, CommandReceiver, CommandSender, EffectReceiver, EffectSender,
        EventReceiver, EventSender, NonBlockingSend,
    },
    AnonchatConfig, AnonchatError, AnonchatResult, AppEvent, Command, Effect, Event, Matchmaker,
    Notice, ParticipantId, TransportTask,
};
