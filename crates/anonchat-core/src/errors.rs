//! Error types for the anonymous chat engine
//!
//! The matchmaking operations themselves are total and never fail; the
//! conditions listed here only arise at the channel, configuration and
//! transport boundaries around the engine.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Specific transport error types
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Delivery to participant {participant} failed: {reason}")]
    DeliveryFailed { participant: String, reason: String },
}

/// Core error type for the anonymous chat engine
#[derive(Debug, thiserror::Error)]
pub enum AnonchatError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel communication error between tasks
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Malformed input at the adapter boundary
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl AnonchatError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        AnonchatError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        AnonchatError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an invalid input error with a reason
    pub fn invalid_input<T: Into<String>>(reason: T) -> Self {
        AnonchatError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a delivery failure for a participant
    pub fn delivery_failed<P: ToString, R: Into<String>>(participant: P, reason: R) -> Self {
        AnonchatError::Transport(TransportError::DeliveryFailed {
            participant: participant.to_string(),
            reason: reason.into(),
        })
    }

    /// Whether the error should stop the task that hit it
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            AnonchatError::Channel { .. } | AnonchatError::Configuration { .. }
        )
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, AnonchatError>;
pub type AnonchatResult<T> = Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_channel_and_config_errors_are_unrecoverable() {
        assert!(AnonchatError::channel_error("closed").is_unrecoverable());
        assert!(AnonchatError::config_error("bad").is_unrecoverable());
        assert!(!AnonchatError::invalid_input("x").is_unrecoverable());
        assert!(!AnonchatError::delivery_failed(7u64, "blocked").is_unrecoverable());
    }

    #[test]
    fn delivery_failure_message_names_participant() {
        let err = AnonchatError::delivery_failed(42u64, "bot blocked");
        assert_eq!(
            err.to_string(),
            "Transport error: Delivery to participant 42 failed: bot blocked"
        );
    }
}
