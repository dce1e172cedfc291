//! # Envelope Codec - Tagged State over Opaque Payloads
//!
//! ## Purpose
//!
//! This crate is the wire layer of the envelope system:
//! - `TaggedState`: validated, size-accounted mapping from short names to bytes
//! - Frame encoding (`builder`) and decoding (`parser`) of state plus body
//! - `ContentOption`: ordered mutators applied to content before encoding
//!
//! ## Architecture Role
//!
//! ```text
//! producer → [MessageContent] → encode → bytes → transport publish
//! transport delivery → bytes → decode → [MessageContent] → consumer
//! ```
//!
//! A decode that fails the signature check means the payload was published
//! without an envelope; `MessageContent::decode_or_raw` applies that fallback.
//!
//! ## What This Crate Does NOT Contain
//! - Transport connections, publishing or acknowledgement (see `delivery`)
//! - Trace-context generation (see `propagation` for the carrier)

pub mod bounds;
pub mod builder;
pub mod constants;
pub mod content;
pub mod error;
pub mod options;
pub mod parser;
pub mod state;

pub use builder::{encode, encode_into, encoded_len, tag_block_size, write_to};
pub use constants::*;
pub use content::MessageContent;
pub use error::{
    DecodeError, DecodeResult, EncodeError, EncodeResult, OptionError, StateError, StateResult,
};
pub use options::{apply_options, with_tag, ContentOption, NamedOption};
pub use parser::{decode, is_enveloped};
pub use state::TaggedState;
