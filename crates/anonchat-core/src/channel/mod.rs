//! Channel Module
//!
//! This module contains the CSP (Communicating Sequential Processes) channel infrastructure:
//! - `communication`: Core channel types, commands, events and effects
//! - `utils`: Channel type aliases and constructors

pub mod communication;
pub mod utils;

pub use communication::{AppEvent, Command, Effect, Event, Notice};

pub use utils::{
    create_app_event_channel, create_command_channel, create_effect_channel,
    create_effect_receiver, create_event_channel, AppEventReceiver, AppEventSender, ChannelError,
    CommandReceiver, CommandSender, EffectReceiver, EffectSender, EventReceiver, EventSender,
    NonBlockingSend,
};
