//! Application-facing view of a delivered message
//!
//! Wraps a transport message with the topic and channel it arrived on and an
//! optional application delegate for lifecycle events. The wrapper does not own
//! the message lifecycle: finish/requeue/touch act on the transport message.

use crate::delegate::{DelegateChain, MessageDelegate};
use crate::transport::{MessageId, TransportDelegate, TransportMessage};
use codec::MessageContent;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-message data shared by every clone of a `Message`
pub(crate) struct MessageMeta {
    pub(crate) topic: String,
    pub(crate) channel: String,
    pub(crate) delegate: Option<Arc<dyn MessageDelegate>>,
    forwarded: AtomicBool,
}

/// A transport message enriched with topic, channel and application delegate
///
/// Clones share the transport message and the unhandled-forwarding state.
#[derive(Clone)]
pub struct Message {
    inner: Arc<TransportMessage>,
    pub(crate) meta: Arc<MessageMeta>,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.inner.id)
            .field("topic", &self.meta.topic)
            .field("channel", &self.meta.channel)
            .field("has_delegate", &self.meta.delegate.is_some())
            .field("forwarded", &self.is_forwarded())
            .finish()
    }
}

impl Message {
    /// Wrap `inner` without touching its lifecycle delegate
    pub fn new(
        inner: Arc<TransportMessage>,
        topic: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self::build(inner, topic.into(), channel.into(), None)
    }

    /// Wrap `inner` and chain `delegate` behind the transport's own delegate
    ///
    /// After this, finish/requeue/touch on the transport message also reach
    /// `delegate`, in the order fixed by `DelegateChain`.
    pub fn with_delegate(
        inner: Arc<TransportMessage>,
        topic: impl Into<String>,
        channel: impl Into<String>,
        delegate: Arc<dyn MessageDelegate>,
    ) -> Self {
        let message = Self::build(inner, topic.into(), channel.into(), Some(delegate));
        message.install_chain();
        message
    }

    fn build(
        inner: Arc<TransportMessage>,
        topic: String,
        channel: String,
        delegate: Option<Arc<dyn MessageDelegate>>,
    ) -> Self {
        Self {
            inner,
            meta: Arc::new(MessageMeta {
                topic,
                channel,
                delegate,
                forwarded: AtomicBool::new(false),
            }),
        }
    }

    fn install_chain(&self) {
        self.inner.replace_delegate(|original| {
            Arc::new(DelegateChain::new(self, original)) as Arc<dyn TransportDelegate>
        });
    }

    pub(crate) fn from_parts(inner: Arc<TransportMessage>, meta: Arc<MessageMeta>) -> Self {
        Self { inner, meta }
    }

    pub fn id(&self) -> MessageId {
        self.inner.id
    }

    pub fn topic(&self) -> &str {
        &self.meta.topic
    }

    pub fn channel(&self) -> &str {
        &self.meta.channel
    }

    /// Raw payload bytes as delivered
    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    pub fn attempts(&self) -> u16 {
        self.inner.attempts
    }

    pub fn delegate(&self) -> Option<&Arc<dyn MessageDelegate>> {
        self.meta.delegate.as_ref()
    }

    pub fn transport(&self) -> &Arc<TransportMessage> {
        &self.inner
    }

    /// Decoded content; payloads without an envelope come back as a raw body
    pub fn content(&self) -> MessageContent {
        MessageContent::decode_or_raw(&self.inner.body)
    }

    pub fn finish(&self) {
        self.inner.finish();
    }

    pub fn requeue(&self, delay: Duration) {
        self.inner.requeue(delay);
    }

    pub fn requeue_without_backoff(&self, delay: Duration) {
        self.inner.requeue_without_backoff(delay);
    }

    pub fn touch(&self) {
        self.inner.touch();
    }

    /// Whether this message has been escalated to an unhandled-message handler
    pub fn is_forwarded(&self) -> bool {
        self.meta.forwarded.load(Ordering::Acquire)
    }

    /// Move from not-forwarded to forwarded; true for exactly one caller
    pub(crate) fn try_mark_forwarded(&self) -> bool {
        self.meta
            .forwarded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
