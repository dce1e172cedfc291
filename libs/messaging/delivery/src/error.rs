//! # Delivery Error Types
//!
//! Errors for the transport-facing side of the envelope system: publishing,
//! option/encode failures surfaced through the producer, and unhandled-message
//! forwarding.

use codec::{EncodeError, OptionError};
use thiserror::Error;

/// Failures reported by a transport implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not establish or test a connection
    #[error("Connection to '{address}' failed: {reason}")]
    Connect { address: String, reason: String },

    /// Publish was rejected or lost
    #[error("Publish to '{topic}' via '{address}' failed: {reason}")]
    Publish {
        address: String,
        topic: String,
        reason: String,
    },

    /// Handle has been stopped
    #[error("Transport handle '{0}' is closed")]
    Closed(String),
}

impl TransportError {
    pub fn connect(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn publish(
        address: impl Into<String>,
        topic: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Publish {
            address: address.into(),
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

/// Producer and forwarder operation errors
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Producer was closed before the write
    #[error("Producer has been disposed")]
    Disposed,

    /// No transport handle could be created from the configured addresses
    #[error("Producer must own at least one publisher")]
    NoPublishers,

    /// Connecting or pinging a configured address failed
    #[error("Cannot establish connection to '{address}': {reason}")]
    Connect { address: String, reason: String },

    /// A content option rejected the message
    #[error(transparent)]
    ContentOption(#[from] OptionError),

    /// Content could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Transport publish failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProducerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a retry of the same write could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProducerError::Transport(TransportError::Publish { .. }))
    }
}

/// Consumer-side handling errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsumeError {
    /// A message was escalated to the unhandled-message handler more than once,
    /// or from inside that handler. Indicates a wiring bug; never retry.
    #[error("Invalid forward of message {message_id} on '{topic}': it might be a recursive forward to the unhandled message handler")]
    RecursiveForward { topic: String, message_id: String },

    /// Handler reported a failure
    #[error("Handler error: {0}")]
    Handler(String),
}

impl ConsumeError {
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Fatal errors must be neither retried nor swallowed
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConsumeError::RecursiveForward { .. })
    }
}

/// Result type for producer operations
pub type ProducerResult<T> = std::result::Result<T, ProducerError>;

/// Result type for consumer-side handlers
pub type ConsumeResult<T> = std::result::Result<T, ConsumeError>;
