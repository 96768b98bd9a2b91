//! Core Logic Module
//!
//! - `state`: state owned by the Core Logic task and its statistics
//! - `handlers`: event and command handlers
//! - `task`: the `CoreLogicTask` select loop
//!
//! Matchmaking state lives behind the shared [`Matchmaker`] handle, so the
//! task is the only writer in normal operation but embedders may still query
//! or drive the engine directly through a clone of that handle.
//!
//! [`Matchmaker`]: anonchat_core::Matchmaker

pub mod handlers;
pub mod state;
pub mod task;

pub use handlers::{CommandHandlers, EventHandlers};
pub use state::{CoreState, CoreStats};
pub use task::CoreLogicTask;
