//! Forwarder: a producer that re-publishes consumed messages

use crate::config::ProducerConfig;
use crate::error::ProducerResult;
use crate::message::Message;
use crate::producer::Producer;
use crate::transport::Connector;
use codec::{ContentOption, MessageContent};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Forwarder {
    producer: Producer,
}

impl Forwarder {
    pub async fn new(config: &ProducerConfig, connector: &dyn Connector) -> ProducerResult<Self> {
        let producer = Producer::new(config, connector).await?;
        Ok(Self { producer })
    }

    pub fn from_producer(producer: Producer) -> Self {
        Self { producer }
    }

    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    /// Re-publish the message body to `topic` byte for byte
    pub async fn forward(&self, topic: &str, message: &Message) -> ProducerResult<()> {
        self.producer.write(topic, message.body()).await
    }

    /// Decode the message, apply `options`, re-encode and publish to `topic`
    pub async fn forward_content(
        &self,
        topic: &str,
        message: &Message,
        options: &[&dyn ContentOption],
    ) -> ProducerResult<()> {
        let mut content: MessageContent = message.content();
        self.producer.write_content(topic, &mut content, options).await
    }

    pub async fn close(&self) {
        self.producer.close().await;
    }

    pub fn runner(self: &Arc<Self>) -> ForwarderRunner {
        ForwarderRunner {
            handle: Arc::clone(self),
        }
    }
}

/// Start/stop lifecycle for hosting a forwarder in a service
#[derive(Debug, Clone)]
pub struct ForwarderRunner {
    handle: Arc<Forwarder>,
}

impl ForwarderRunner {
    pub fn forwarder(&self) -> &Arc<Forwarder> {
        &self.handle
    }

    pub fn start(&self) {
        info!("Started");
    }

    pub async fn stop(&self) {
        info!("Stopping");
        self.handle.close().await;
        info!("Stopped");
    }
}
