//! Message content: tagged state plus opaque body
//!
//! The unit producers encode and consumers decode. Created fresh per outbound
//! message and decoded fresh per inbound one.

use crate::builder;
use crate::error::{DecodeResult, EncodeResult};
use crate::parser;
use crate::state::TaggedState;
use std::io::Write;
use tracing::debug;

/// Tagged state and body carried by one envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContent {
    pub state: TaggedState,
    pub body: Vec<u8>,
}

impl MessageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content with an empty state and the given body
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            state: TaggedState::new(),
            body: body.into(),
        }
    }

    /// Encode into a new frame
    pub fn encode(&self) -> EncodeResult<Vec<u8>> {
        builder::encode(&self.state, &self.body)
    }

    /// Encode into `w`, returning the number of bytes written
    pub fn write_to<W: Write>(&self, w: &mut W) -> EncodeResult<usize> {
        builder::write_to(&self.state, &self.body, w)
    }

    /// Frame length `encode` would produce
    pub fn encoded_len(&self) -> usize {
        builder::encoded_len(&self.state, &self.body)
    }

    /// Decode a frame
    pub fn decode(source: &[u8]) -> DecodeResult<Self> {
        parser::decode(source)
    }

    /// Decode a frame, treating anything that fails to decode as a raw body
    ///
    /// Payloads published without an envelope come back with an empty state and
    /// their bytes untouched.
    pub fn decode_or_raw(source: &[u8]) -> Self {
        match parser::decode(source) {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, size = source.len(), "payload is not an envelope; using raw body");
                Self::with_body(source)
            }
        }
    }
}
