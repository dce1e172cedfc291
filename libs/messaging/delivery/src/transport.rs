//! # Transport Seam
//!
//! ## Purpose
//!
//! The pub/sub transport is an external collaborator. This module defines the
//! narrow surface the envelope layer needs from it:
//! - `TransportMessage`: a delivered message with a replaceable lifecycle delegate
//! - `TransportDelegate`: transport bookkeeping for finish/requeue/touch
//! - `Publisher` / `Connector`: publishing and connection establishment
//!
//! Flow control, redelivery and the acknowledgement wire protocol stay on the
//! transport side of these traits.

use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 16-byte transport message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageId(pub [u8; 16]);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 16]> for MessageId {
    fn from(id: [u8; 16]) -> Self {
        Self(id)
    }
}

/// Transport-level lifecycle callbacks
///
/// Implemented by the transport to keep its own bookkeeping (in-flight counts,
/// acknowledgement frames) in step with message responses.
pub trait TransportDelegate: Send + Sync {
    fn on_finish(&self, message: &TransportMessage);
    fn on_requeue(&self, message: &TransportMessage, delay: Duration, backoff: bool);
    fn on_touch(&self, message: &TransportMessage);
}

/// A message as delivered by the transport
///
/// Responding (finish or requeue) happens at most once; later responses are
/// ignored. Touch is only forwarded while the message is unresponded.
pub struct TransportMessage {
    pub id: MessageId,
    pub body: Vec<u8>,
    pub timestamp: i64,
    pub attempts: u16,
    pub address: String,
    delegate: RwLock<Arc<dyn TransportDelegate>>,
    responded: AtomicBool,
}

impl fmt::Debug for TransportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportMessage")
            .field("id", &self.id)
            .field("body_len", &self.body.len())
            .field("timestamp", &self.timestamp)
            .field("attempts", &self.attempts)
            .field("address", &self.address)
            .field("responded", &self.has_responded())
            .finish()
    }
}

impl TransportMessage {
    pub fn new(
        id: impl Into<MessageId>,
        body: impl Into<Vec<u8>>,
        delegate: Arc<dyn TransportDelegate>,
    ) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            timestamp: 0,
            attempts: 1,
            address: String::new(),
            delegate: RwLock::new(delegate),
            responded: AtomicBool::new(false),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_attempts(mut self, attempts: u16) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Current lifecycle delegate
    pub fn delegate(&self) -> Arc<dyn TransportDelegate> {
        self.delegate.read().clone()
    }

    /// Replace the lifecycle delegate with one built from the current delegate
    pub fn replace_delegate<F>(&self, wrap: F)
    where
        F: FnOnce(Arc<dyn TransportDelegate>) -> Arc<dyn TransportDelegate>,
    {
        let mut delegate = self.delegate.write();
        let original = delegate.clone();
        *delegate = wrap(original);
    }

    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    /// Acknowledge successful processing
    pub fn finish(&self) {
        if !self.claim_response("finish") {
            return;
        }
        self.delegate().on_finish(self);
    }

    /// Return the message to the transport, with backoff
    pub fn requeue(&self, delay: Duration) {
        self.do_requeue(delay, true);
    }

    /// Return the message to the transport without triggering backoff
    pub fn requeue_without_backoff(&self, delay: Duration) {
        self.do_requeue(delay, false);
    }

    /// Extend the processing deadline
    pub fn touch(&self) {
        if self.has_responded() {
            return;
        }
        self.delegate().on_touch(self);
    }

    fn do_requeue(&self, delay: Duration, backoff: bool) {
        if !self.claim_response("requeue") {
            return;
        }
        self.delegate().on_requeue(self, delay, backoff);
    }

    fn claim_response(&self, action: &str) -> bool {
        let claimed = self
            .responded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed {
            warn!(message_id = %self.id, action, "message already responded; ignoring");
        }
        claimed
    }
}

/// A connected publishing handle
#[async_trait]
pub trait Publisher: Send + Sync + fmt::Debug {
    /// Address this handle publishes to
    fn address(&self) -> &str;

    /// Test the connection
    async fn ping(&self) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, body: &[u8]) -> Result<(), TransportError>;

    /// Publish for delivery after `delay`
    async fn deferred_publish(
        &self,
        topic: &str,
        delay: Duration,
        body: &[u8],
    ) -> Result<(), TransportError>;

    /// Release the connection; further publishes may fail
    async fn stop(&self) {}
}

/// Creates publishing handles from configured addresses
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        settings: &HashMap<String, String>,
    ) -> Result<Arc<dyn Publisher>, TransportError>;
}
