//! In-memory transport and recording delegates for tests

use crate::delegate::MessageDelegate;
use crate::error::TransportError;
use crate::message::Message;
use crate::transport::{Connector, MessageId, Publisher, TransportDelegate, TransportMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fixed id used by test messages
pub fn test_message_id() -> MessageId {
    MessageId(*b"0123456789abcdef")
}

/// Message on topic "gotest" / channel "ch" with a no-op transport delegate
pub fn test_message(body: &[u8]) -> Message {
    let transport = Arc::new(TransportMessage::new(
        test_message_id(),
        body,
        Arc::new(RecordingTransportDelegate::new(EventLog::new())),
    ));
    Message::new(transport, "gotest", "ch")
}

/// Ordered log of delegate events shared between recorders
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Transport delegate logging `transport:<event>`
#[derive(Debug)]
pub struct RecordingTransportDelegate {
    log: EventLog,
}

impl RecordingTransportDelegate {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl TransportDelegate for RecordingTransportDelegate {
    fn on_finish(&self, _message: &TransportMessage) {
        self.log.record("transport:finish");
    }

    fn on_requeue(&self, _message: &TransportMessage, delay: Duration, backoff: bool) {
        self.log
            .record(format!("transport:requeue:{}:{}", delay.as_millis(), backoff));
    }

    fn on_touch(&self, _message: &TransportMessage) {
        self.log.record("transport:touch");
    }
}

/// Application delegate logging `app:<event>:<topic>` and counting calls
#[derive(Debug, Default)]
pub struct RecordingMessageDelegate {
    log: EventLog,
    finished: AtomicUsize,
    requeued: AtomicUsize,
    touched: AtomicUsize,
}

impl RecordingMessageDelegate {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn finish_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn requeue_count(&self) -> usize {
        self.requeued.load(Ordering::SeqCst)
    }

    pub fn touch_count(&self) -> usize {
        self.touched.load(Ordering::SeqCst)
    }
}

impl MessageDelegate for RecordingMessageDelegate {
    fn on_finish(&self, message: &Message) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!("app:finish:{}", message.topic()));
    }

    fn on_requeue(&self, message: &Message, delay: Duration, backoff: bool) {
        self.requeued.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!(
            "app:requeue:{}:{}:{}",
            message.topic(),
            delay.as_millis(),
            backoff
        ));
    }

    fn on_touch(&self, message: &Message) {
        self.touched.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!("app:touch:{}", message.topic()));
    }
}

/// A publish captured by `MemoryPublisher`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

/// Publisher that stores every publish in memory
#[derive(Debug)]
pub struct MemoryPublisher {
    address: String,
    published: Mutex<Vec<PublishedMessage>>,
    fail_on_publish: AtomicBool,
    fail_on_ping: AtomicBool,
    stopped: AtomicBool,
    publish_delay: Mutex<Option<Duration>>,
}

impl MemoryPublisher {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            published: Mutex::new(Vec::new()),
            fail_on_publish: AtomicBool::new(false),
            fail_on_ping: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            publish_delay: Mutex::new(None),
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    /// Configure to fail on next publish
    pub fn fail_next_publish(&self) {
        self.fail_on_publish.store(true, Ordering::SeqCst);
    }

    pub fn fail_ping(&self) {
        self.fail_on_ping.store(true, Ordering::SeqCst);
    }

    /// Make every publish sleep before completing
    pub fn set_publish_latency(&self, latency: Duration) {
        *self.publish_delay.lock() = Some(latency);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn record(&self, topic: &str, body: &[u8], delay: Option<Duration>) -> Result<(), TransportError> {
        let latency = *self.publish_delay.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.is_stopped() {
            return Err(TransportError::Closed(self.address.clone()));
        }
        if self.fail_on_publish.swap(false, Ordering::SeqCst) {
            return Err(TransportError::publish(&self.address, topic, "injected failure"));
        }
        self.published.lock().push(PublishedMessage {
            topic: topic.to_string(),
            body: body.to_vec(),
            delay,
        });
        Ok(())
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    fn address(&self) -> &str {
        &self.address
    }

    async fn ping(&self) -> Result<(), TransportError> {
        if self.fail_on_ping.load(Ordering::SeqCst) {
            return Err(TransportError::connect(&self.address, "ping failed"));
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, body: &[u8]) -> Result<(), TransportError> {
        self.record(topic, body, None).await
    }

    async fn deferred_publish(
        &self,
        topic: &str,
        delay: Duration,
        body: &[u8],
    ) -> Result<(), TransportError> {
        self.record(topic, body, Some(delay)).await
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Connector handing out `MemoryPublisher`s, kept for inspection
#[derive(Debug, Default)]
pub struct MemoryConnector {
    publishers: Mutex<HashMap<String, Arc<MemoryPublisher>>>,
    refused: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
    settings: Mutex<Option<HashMap<String, String>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `connect` for `address`
    pub fn refuse(&self, address: impl Into<String>) {
        self.refused.lock().insert(address.into());
    }

    /// Connect succeeds but ping fails for `address`
    pub fn unreachable(&self, address: impl Into<String>) {
        self.unreachable.lock().insert(address.into());
    }

    pub fn publisher(&self, address: &str) -> Option<Arc<MemoryPublisher>> {
        self.publishers.lock().get(address).cloned()
    }

    /// Transport settings passed to the last connect
    pub fn last_settings(&self) -> Option<HashMap<String, String>> {
        self.settings.lock().clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        address: &str,
        settings: &HashMap<String, String>,
    ) -> Result<Arc<dyn Publisher>, TransportError> {
        *self.settings.lock() = Some(settings.clone());
        if self.refused.lock().contains(address) {
            return Err(TransportError::connect(address, "connection refused"));
        }
        let publisher = Arc::new(MemoryPublisher::new(address));
        if self.unreachable.lock().contains(address) {
            publisher.fail_ping();
        }
        self.publishers
            .lock()
            .insert(address.to_string(), Arc::clone(&publisher));
        Ok(publisher)
    }
}
