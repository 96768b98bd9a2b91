//! CSP Channel Communication Protocol Types
//!
//! This module defines the typed communication protocol.
//! All inter-task communication flows through these channel message types.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::pairing::EngineStats;
use crate::types::{InterestTag, ParticipantId, Payload};

// ----------------------------------------------------------------------------
// Event: Transport → Core Logic
// ----------------------------------------------------------------------------

/// Inbound participant events delivered by a transport adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Participant opened the bot; resets any chat and shows the main menu
    Start { participant: ParticipantId },
    /// Participant asks for a partner
    Connect { participant: ParticipantId },
    /// Leave the current partner and look for a new one
    Next { participant: ParticipantId },
    /// Leave the current chat or the queue
    Stop { participant: ParticipantId },
    /// Report the current partner and leave
    Report { participant: ParticipantId },
    /// Declare an interest tag for future matching
    SetInterest {
        participant: ParticipantId,
        tag: InterestTag,
    },
    /// Remove the declared interest
    ClearInterest { participant: ParticipantId },
    /// Free-form message to relay to the partner
    Message {
        participant: ParticipantId,
        payload: Payload,
    },
}

impl Event {
    /// The participant the event originates from
    pub fn participant(&self) -> ParticipantId {
        match self {
            Event::Start { participant }
            | Event::Connect { participant }
            | Event::Next { participant }
            | Event::Stop { participant }
            | Event::Report { participant }
            | Event::SetInterest { participant, .. }
            | Event::ClearInterest { participant }
            | Event::Message { participant, .. } => *participant,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Connect { .. } => "connect",
            Event::Next { .. } => "next",
            Event::Stop { .. } => "stop",
            Event::Report { .. } => "report",
            Event::SetInterest { .. } => "set-interest",
            Event::ClearInterest { .. } => "clear-interest",
            Event::Message { .. } => "message",
        }
    }
}

// ----------------------------------------------------------------------------
// Command: Operator → Core Logic
// ----------------------------------------------------------------------------

/// Commands sent by the operator or embedding application to the Core Logic task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Request a system status report
    GetSystemStatus,
    /// Request the report count for a participant
    GetReportCount { participant: ParticipantId },
    /// Shutdown the system gracefully
    Shutdown,
}

// ----------------------------------------------------------------------------
// Effect: Core Logic → Transport
// ----------------------------------------------------------------------------

/// Notification kinds the transport renders for a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    Welcome,
    Connected,
    Waiting,
    PartnerLeft,
    Stopped,
    Reported,
    InterestSet { tag: InterestTag },
    InterestCleared,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Welcome => f.write_str("welcome"),
            Notice::Connected => f.write_str("connected"),
            Notice::Waiting => f.write_str("waiting"),
            Notice::PartnerLeft => f.write_str("partner-left"),
            Notice::Stopped => f.write_str("stopped"),
            Notice::Reported => f.write_str("reported"),
            Notice::InterestSet { tag } => write!(f, "interest-set({tag})"),
            Notice::InterestCleared => f.write_str("interest-cleared"),
        }
    }
}

/// Outbound side effects the transport must perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Send a notification to a participant
    Notify {
        participant: ParticipantId,
        notice: Notice,
    },
    /// Deliver a relayed payload to a participant
    DeliverPayload {
        participant: ParticipantId,
        payload: Payload,
    },
}

impl Effect {
    pub fn notify(participant: ParticipantId, notice: Notice) -> Self {
        Effect::Notify {
            participant,
            notice,
        }
    }

    /// The participant the effect is addressed to
    pub fn recipient(&self) -> ParticipantId {
        match self {
            Effect::Notify { participant, .. } | Effect::DeliverPayload { participant, .. } => {
                *participant
            }
        }
    }
}

// ----------------------------------------------------------------------------
// AppEvent: Core Logic → Operator
// ----------------------------------------------------------------------------

/// Events reported to the operator or embedding application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Snapshot of engine state
    SystemStatusReport {
        participants: usize,
        waiting: usize,
        active_pairs: usize,
        stats: EngineStats,
        uptime_seconds: u64,
    },
    /// Answer to [`Command::GetReportCount`]
    ReportCount {
        participant: ParticipantId,
        count: u32,
    },
    /// A participant's report count crossed the alert threshold
    ParticipantFlagged {
        participant: ParticipantId,
        reports: u32,
    },
    /// A non-fatal error occurred in the Core Logic task
    SystemError { error: String },
}
