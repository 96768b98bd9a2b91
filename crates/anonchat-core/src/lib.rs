//! Anonchat Core
//!
//! Matchmaking and relay engine for anonymous one-to-one chat. Participants ask
//! for a partner, get paired (by declared interest first, then by wait order),
//! exchange messages through the relay and leave, report or skip to the next
//! partner. Transports talk to the engine through the channel schema in
//! [`channel`]; the engine itself never performs I/O.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod errors;
pub mod matchmaker;
pub mod pairing;
pub mod pool;
pub mod relay;
pub mod transport_task;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{AppEvent, Command, Effect, Event, Notice};
pub use classifier::{ContentClassifier, NoopClassifier, SafetyVerdict};
pub use config::{AnonchatConfig, ChannelConfig, FallbackPolicy, InterestCatalog, MatchingConfig};
pub use errors::{AnonchatError, AnonchatResult, TransportError};
pub use matchmaker::{EngineSnapshot, Matchmaker};
pub use pairing::{
    ConnectOutcome, DisconnectOutcome, EngineStats, InvariantViolation, NextOutcome,
    PairingEngine, Reaction, ReportFiled, ReportOutcome,
};
pub use relay::{Delivery, DropReason, Relay};
pub use transport_task::TransportTask;
pub use types::{InterestTag, ParticipantId, ParticipantState, Payload};
