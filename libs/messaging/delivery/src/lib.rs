//! # Envelope Delivery - Transport-Facing Message Handling
//!
//! ## Purpose
//!
//! Connects the envelope codec to a pub/sub transport:
//! - `Message`: transport message plus topic, channel and application delegate
//! - `DelegateChain`: lifecycle callbacks forwarded to transport and application
//! - `ConsumeContext`: single-hop escalation of unhandled messages
//! - `Producer` / `Forwarder`: envelope publishing over a replicated handle pool
//!
//! ## Architecture Role
//!
//! ```text
//! MessageContent → [Producer] → Publisher ─── transport ─── TransportMessage
//!                                                               │
//!                                   Message ← DelegateChain ←───┘
//!                                      │
//!                   handler → ConsumeContext::forward_unhandled_message
//! ```
//!
//! The transport itself stays behind the `Publisher`, `Connector` and
//! `TransportDelegate` traits.

pub mod config;
pub mod consume;
pub mod delegate;
pub mod error;
pub mod forwarder;
pub mod message;
pub mod pool;
pub mod producer;
pub mod test_utils;
pub mod transport;

pub use config::{ProducerConfig, DEFAULT_ADDRESS};
pub use consume::{stop_recursive_forward, ConsumeContext, MessageHandler};
pub use delegate::{DelegateChain, MessageDelegate};
pub use error::{ConsumeError, ConsumeResult, ProducerError, ProducerResult, TransportError};
pub use forwarder::{Forwarder, ForwarderRunner};
pub use message::Message;
pub use pool::ProducerPool;
pub use producer::Producer;
pub use transport::{Connector, MessageId, Publisher, TransportDelegate, TransportMessage};
