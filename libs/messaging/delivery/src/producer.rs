//! # Producer - Envelope Publishing
//!
//! ## Purpose
//!
//! Publishes raw bodies or encoded `MessageContent` through a pool of transport
//! handles. Content options run before encoding and any failure aborts the
//! publish.
//!
//! ## Lifecycle
//!
//! Construction connects every configured address (pinging each when
//! configured), so a `Producer` value is always initialized. `close()` marks the
//! producer disposed, waits for in-flight writes and stops every handle; writes
//! after that fail with `ProducerError::Disposed`.

use crate::config::ProducerConfig;
use crate::error::{ProducerError, ProducerResult};
use crate::pool::ProducerPool;
use crate::transport::{Connector, Publisher};
use codec::{apply_options, ContentOption, MessageContent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Producer {
    pool: ProducerPool,
    /// Writes hold a read guard; close takes the write guard to drain them
    in_flight: RwLock<()>,
    disposed: AtomicBool,
}

impl Producer {
    /// Connect to every configured address
    pub async fn new(config: &ProducerConfig, connector: &dyn Connector) -> ProducerResult<Self> {
        config.validate()?;
        let config = config.normalized();

        let mut handles: Vec<Arc<dyn Publisher>> = Vec::with_capacity(config.address.len());
        for address in &config.address {
            let handle = connector
                .connect(address, &config.transport)
                .await
                .map_err(|e| {
                    warn!(address = %address, error = %e, "failed to create publisher");
                    ProducerError::Connect {
                        address: address.clone(),
                        reason: e.to_string(),
                    }
                })?;

            if config.ping_on_connect {
                handle.ping().await.map_err(|e| {
                    warn!(address = %address, error = %e, "connection test failed");
                    ProducerError::Connect {
                        address: address.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }
            handles.push(handle);
        }

        if handles.is_empty() {
            return Err(ProducerError::NoPublishers);
        }

        info!(
            addresses = ?config.address,
            replication_factor = config.replicas(),
            "producer started"
        );
        Ok(Self {
            pool: ProducerPool::new(handles, config.replicas()),
            in_flight: RwLock::new(()),
            disposed: AtomicBool::new(false),
        })
    }

    /// Handle the next publish starts at
    pub fn handle(&self) -> Option<&Arc<dyn Publisher>> {
        self.pool.current()
    }

    pub fn all_handles(&self) -> &[Arc<dyn Publisher>] {
        self.pool.handles()
    }

    pub fn is_closed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Publish `body` as is
    pub async fn write(&self, topic: &str, body: &[u8]) -> ProducerResult<()> {
        let _guard = self.in_flight.read().await;
        self.ensure_open()?;
        self.pool.publish(topic, body).await?;
        Ok(())
    }

    /// Apply `options`, encode `content`, publish
    pub async fn write_content(
        &self,
        topic: &str,
        content: &mut MessageContent,
        options: &[&dyn ContentOption],
    ) -> ProducerResult<()> {
        self.ensure_open()?;
        let payload = Self::prepare(topic, content, options)?;
        self.write(topic, &payload).await
    }

    /// Publish `body` for delivery after `delay`
    pub async fn deferred_write(
        &self,
        topic: &str,
        delay: Duration,
        body: &[u8],
    ) -> ProducerResult<()> {
        let _guard = self.in_flight.read().await;
        self.ensure_open()?;
        self.pool.deferred_publish(topic, delay, body).await?;
        Ok(())
    }

    /// `write_content` with a delivery delay
    pub async fn deferred_write_content(
        &self,
        topic: &str,
        delay: Duration,
        content: &mut MessageContent,
        options: &[&dyn ContentOption],
    ) -> ProducerResult<()> {
        self.ensure_open()?;
        let payload = Self::prepare(topic, content, options)?;
        self.deferred_write(topic, delay, &payload).await
    }

    /// Dispose the producer; idempotent
    pub async fn close(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("producer closing");
        let _drained = self.in_flight.write().await;
        self.pool.dispose().await;
        info!("producer closed");
    }

    fn ensure_open(&self) -> ProducerResult<()> {
        if self.is_closed() {
            return Err(ProducerError::Disposed);
        }
        Ok(())
    }

    fn prepare(
        topic: &str,
        content: &mut MessageContent,
        options: &[&dyn ContentOption],
    ) -> ProducerResult<Vec<u8>> {
        apply_options(topic, content, options).map_err(|e| {
            warn!(topic, error = %e, "content option aborted publish");
            e
        })?;
        let payload = content.encode()?;
        debug!(topic, bytes = payload.len(), tags = content.state.len(), "content encoded");
        Ok(payload)
    }
}
