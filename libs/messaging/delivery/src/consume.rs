//! # Consume Context - Unhandled Message Escalation
//!
//! ## Purpose
//!
//! A handler that cannot process a message may escalate it to a registered
//! fallback handler. Escalation is single-hop per message:
//!
//! ```text
//! not-forwarded --forward_unhandled_message--> forwarded
//!       |                                          |
//!  fallback(derived ctx)                 stop_recursive_forward (fatal)
//! ```
//!
//! The transition is a compare-and-swap on state shared by every clone of the
//! message, so racing forwards see exactly one winner. The fallback runs with a
//! derived context whose own fallback is the terminal handler, so forwarding
//! from inside the fallback also fails.

use crate::error::{ConsumeError, ConsumeResult};
use crate::message::Message;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Message handler signature shared by primary and fallback handlers
pub type MessageHandler =
    Arc<dyn Fn(&ConsumeContext, &Message) -> ConsumeResult<()> + Send + Sync>;

#[derive(Clone, Default)]
enum UnhandledRoute {
    /// No fallback registered; forwarding does nothing
    #[default]
    None,
    Fallback(MessageHandler),
    /// Every forward is a recursive forward
    Terminal,
}

/// Per-topic consumer context handed to message handlers
#[derive(Clone)]
pub struct ConsumeContext {
    topic: String,
    unhandled: UnhandledRoute,
}

impl fmt::Debug for ConsumeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let route = match self.unhandled {
            UnhandledRoute::None => "none",
            UnhandledRoute::Fallback(_) => "fallback",
            UnhandledRoute::Terminal => "terminal",
        };
        f.debug_struct("ConsumeContext")
            .field("topic", &self.topic)
            .field("unhandled", &route)
            .finish()
    }
}

impl ConsumeContext {
    /// Context without a fallback handler
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            unhandled: UnhandledRoute::None,
        }
    }

    /// Register the fallback handler for unhandled messages
    pub fn with_unhandled_handler(mut self, handler: MessageHandler) -> Self {
        self.unhandled = UnhandledRoute::Fallback(handler);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn has_unhandled_handler(&self) -> bool {
        matches!(self.unhandled, UnhandledRoute::Fallback(_))
    }

    /// Escalate `message` to the fallback handler
    ///
    /// The first forward of a message runs the fallback and returns its result.
    /// A second forward of the same message, or a forward from inside the
    /// fallback, returns `ConsumeError::RecursiveForward`, which callers must
    /// neither retry nor swallow.
    pub fn forward_unhandled_message(&self, message: &Message) -> ConsumeResult<()> {
        match &self.unhandled {
            UnhandledRoute::None => {
                debug!(topic = %self.topic, message_id = %message.id(), "no unhandled message handler registered");
                Ok(())
            }
            UnhandledRoute::Terminal => stop_recursive_forward(self, message),
            UnhandledRoute::Fallback(handler) => {
                if !message.try_mark_forwarded() {
                    return stop_recursive_forward(self, message);
                }
                let derived = self.derive_terminal();
                handler(&derived, message)
            }
        }
    }

    fn derive_terminal(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            unhandled: UnhandledRoute::Terminal,
        }
    }
}

/// Terminal handler for repeated or nested escalation
pub fn stop_recursive_forward(ctx: &ConsumeContext, message: &Message) -> ConsumeResult<()> {
    error!(
        topic = %ctx.topic(),
        message_id = %message.id(),
        "invalid forward; it might be recursive forward message to unhandled message handler"
    );
    Err(ConsumeError::RecursiveForward {
        topic: ctx.topic().to_string(),
        message_id: message.id().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_message;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(count: Arc<AtomicUsize>) -> MessageHandler {
        Arc::new(move |_ctx, _msg| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_forward_without_handler_is_noop() {
        let ctx = ConsumeContext::new("gotest");
        let message = test_message(b"foo");

        assert_eq!(ctx.forward_unhandled_message(&message), Ok(()));
        assert_eq!(ctx.forward_unhandled_message(&message), Ok(()));
        assert!(!message.is_forwarded());
    }

    #[test]
    fn test_second_forward_is_fatal() {
        let count = Arc::new(AtomicUsize::new(0));
        let ctx = ConsumeContext::new("gotest").with_unhandled_handler(counting_handler(count.clone()));
        let message = test_message(b"foo");

        assert_eq!(ctx.forward_unhandled_message(&message), Ok(()));
        let err = ctx.forward_unhandled_message(&message).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_forward_is_fatal() {
        let nested = Arc::new(parking_lot::Mutex::new(None));
        let observed = nested.clone();
        let handler: MessageHandler = Arc::new(move |ctx, msg| {
            assert!(!ctx.has_unhandled_handler());
            let result = ctx.forward_unhandled_message(msg);
            *observed.lock() = Some(result);
            Ok(())
        });
        let ctx = ConsumeContext::new("gotest").with_unhandled_handler(handler);
        let message = test_message(b"foo");

        assert_eq!(ctx.forward_unhandled_message(&message), Ok(()));
        let nested = nested.lock().take().unwrap();
        assert!(matches!(
            nested,
            Err(ConsumeError::RecursiveForward { ref topic, .. }) if topic == "gotest"
        ));
    }

    #[test]
    fn test_fallback_error_is_returned() {
        let handler: MessageHandler = Arc::new(|_ctx, _msg| Err(ConsumeError::handler("boom")));
        let ctx = ConsumeContext::new("gotest").with_unhandled_handler(handler);
        let message = test_message(b"foo");

        assert_eq!(
            ctx.forward_unhandled_message(&message),
            Err(ConsumeError::Handler("boom".to_string()))
        );
        assert!(message.is_forwarded());
    }

    #[test]
    fn test_clone_of_forwarded_message_cannot_forward() {
        let count = Arc::new(AtomicUsize::new(0));
        let ctx = ConsumeContext::new("gotest").with_unhandled_handler(counting_handler(count.clone()));
        let message = test_message(b"foo");
        let cloned = message.clone();

        ctx.forward_unhandled_message(&message).unwrap();
        assert!(ctx.forward_unhandled_message(&cloned).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
