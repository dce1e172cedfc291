//! # Delegate Chaining
//!
//! ## Purpose
//!
//! Lets an application observe a transport message's lifecycle without the
//! transport knowing about it. `DelegateChain` replaces the transport message's
//! delegate and forwards every event to both the original transport delegate and
//! the application delegate, in a fixed order:
//!
//! | event   | first       | then        |
//! |---------|-------------|-------------|
//! | finish  | transport   | application |
//! | touch   | transport   | application |
//! | requeue | application | transport   |
//!
//! Requeue notifies the application first so it observes the delay and backoff
//! decision before the transport commits it.

use crate::message::{Message, MessageMeta};
use crate::transport::{TransportDelegate, TransportMessage};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Application-level lifecycle observer
pub trait MessageDelegate: Send + Sync {
    fn on_finish(&self, message: &Message);
    fn on_requeue(&self, message: &Message, delay: Duration, backoff: bool);
    fn on_touch(&self, message: &Message);
}

/// Transport delegate forwarding to the original delegate and the application delegate
///
/// Holds the owning transport message weakly; the transport message holds the
/// chain, so a strong reference would never be released.
pub struct DelegateChain {
    message: Weak<TransportMessage>,
    meta: Arc<MessageMeta>,
    original: Arc<dyn TransportDelegate>,
}

impl DelegateChain {
    pub fn new(message: &Message, original: Arc<dyn TransportDelegate>) -> Self {
        Self {
            message: Arc::downgrade(message.transport()),
            meta: Arc::clone(&message.meta),
            original,
        }
    }

    fn notify<F>(&self, event: F)
    where
        F: FnOnce(&dyn MessageDelegate, &Message),
    {
        let Some(delegate) = self.meta.delegate.as_deref() else {
            return;
        };
        if let Some(inner) = self.message.upgrade() {
            let message = Message::from_parts(inner, Arc::clone(&self.meta));
            event(delegate, &message);
        }
    }
}

impl TransportDelegate for DelegateChain {
    fn on_finish(&self, message: &TransportMessage) {
        self.original.on_finish(message);
        self.notify(|delegate, m| delegate.on_finish(m));
    }

    fn on_requeue(&self, message: &TransportMessage, delay: Duration, backoff: bool) {
        self.notify(|delegate, m| delegate.on_requeue(m, delay, backoff));
        self.original.on_requeue(message, delay, backoff);
    }

    fn on_touch(&self, message: &TransportMessage) {
        self.original.on_touch(message);
        self.notify(|delegate, m| delegate.on_touch(m));
    }
}
