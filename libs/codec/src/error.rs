//! Envelope-level errors for tagged-state validation and frame processing
//!
//! Each error variant carries the context needed to diagnose a bad frame or a
//! rejected tag: offsets, needed/available byte counts, and the offending input.

use thiserror::Error;

/// Tag validation failures raised by `TaggedState::set`
///
/// Validation happens before any mutation, so a failed `set` leaves the state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Tag names must contain at least one byte
    #[error("Invalid tag name: name is empty")]
    EmptyName,

    /// Tag name longer than the protocol allows
    #[error("Tag name too long: {len} bytes exceeds maximum {max}")]
    NameTooLong { len: usize, max: usize },

    /// Tag name contains a byte outside `[A-Za-z0-9_-]`
    #[error("Tag name contains invalid {ch:?} at {position}")]
    InvalidNameChar { ch: char, position: usize },

    /// Tag value larger than the protocol allows
    #[error("Tag value too large: {size} bytes exceeds maximum {max}")]
    ValueTooLarge { size: usize, max: usize },
}

/// Frame decoding failures
///
/// Every decode error is total: no partially-populated state or body is ever
/// returned alongside it. A signature mismatch is the documented signal that
/// the payload was never enveloped and its raw bytes are the whole body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended before a fixed-size field could be read
    #[error("Truncated frame: need {need} bytes at offset {offset}, {available} available (reading: {context})")]
    Truncated {
        offset: usize,
        need: usize,
        available: usize,
        context: &'static str,
    },

    /// The first 4 bytes are not the envelope signature
    #[error("Invalid envelope signature: expected {expected}, got {actual}")]
    InvalidSignature { expected: String, actual: String },

    /// Version byte names a format this crate cannot read
    #[error("Unsupported envelope version {version:#04x}: supported version is {supported:#04x}")]
    UnsupportedVersion { version: u8, supported: u8 },

    /// Declared tag-block size runs past the end of the input
    #[error("Tag block size {declared} exceeds remaining {available} bytes at offset {offset}")]
    TagBlockOverrun {
        declared: usize,
        available: usize,
        offset: usize,
    },

    /// Declared entry size runs past the end of the tag block
    #[error("Tag entry size {declared} exceeds remaining {available} tag block bytes at offset {offset}")]
    EntryOverrun {
        declared: usize,
        available: usize,
        offset: usize,
    },

    /// Entry bytes contain no ':' separator
    #[error("Malformed tag entry at offset {offset}: missing ':' separator")]
    MissingSeparator { offset: usize },

    /// Entry decoded but its name or value violates tag constraints
    #[error("Invalid tag entry at offset {offset}: {source}")]
    InvalidTag {
        offset: usize,
        #[source]
        source: StateError,
    },

    /// Bytes following the tag block are not CRLF
    #[error("Invalid state end delimiter at offset {offset}: expected 0d0a, got {actual}")]
    InvalidDelimiter { offset: usize, actual: String },
}

impl DecodeError {
    /// Create a Truncated error for a read of `need` bytes at `offset`
    pub fn truncated(offset: usize, need: usize, available: usize, context: &'static str) -> Self {
        Self::Truncated {
            offset,
            need,
            available,
            context,
        }
    }

    /// Create an InvalidSignature error with hex-rendered bytes
    pub fn invalid_signature(expected: &[u8], actual: &[u8]) -> Self {
        Self::InvalidSignature {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }
    }

    /// Create an InvalidDelimiter error with hex-rendered bytes
    pub fn invalid_delimiter(offset: usize, actual: &[u8]) -> Self {
        Self::InvalidDelimiter {
            offset,
            actual: hex::encode(actual),
        }
    }

    /// True when the input is not an envelope at all and should be treated as a raw body
    pub fn is_unenveloped(&self) -> bool {
        match self {
            DecodeError::InvalidSignature { .. } => true,
            DecodeError::Truncated { offset, .. } => *offset == 0,
            _ => false,
        }
    }
}

/// Frame encoding failures
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Tag block does not fit the 2-byte size field
    #[error("Tag block too large: {size} bytes exceeds maximum {max} ({tag_count} tags)")]
    TagBlockTooLarge {
        size: usize,
        max: usize,
        tag_count: usize,
    },

    /// Underlying writer failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a content option applied before encoding
///
/// Propagated verbatim by `apply_options`; the publish for that message is aborted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// The option tried to write a tag the state rejected
    #[error("Content option rejected by tagged state: {0}")]
    State(#[from] StateError),

    /// The option could not be applied for its own reasons
    #[error("Content option '{option}' failed: {reason}")]
    Failed { option: String, reason: String },
}

impl OptionError {
    /// Create a Failed error for a named option
    pub fn failed(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for tag validation
pub type StateResult<T> = std::result::Result<T, StateError>;

/// Result type for frame decoding
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type for frame encoding
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
