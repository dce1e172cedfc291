//! Round-robin publishing pool with replication
//!
//! Each publish starts at the current cursor and goes to `replicas` distinct
//! handles in ring order; the cursor then advances by one. Every target is
//! attempted even after a failure, and the first failure is returned.

use crate::error::TransportError;
use crate::transport::Publisher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug)]
pub struct ProducerPool {
    handles: Vec<Arc<dyn Publisher>>,
    replicas: usize,
    cursor: AtomicUsize,
}

impl ProducerPool {
    /// Build a pool; `replication_factor` is clamped to `1..=handles.len()`
    pub fn new(handles: Vec<Arc<dyn Publisher>>, replication_factor: usize) -> Self {
        let replicas = replication_factor.clamp(1, handles.len().max(1));
        Self {
            handles,
            replicas,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn handles(&self) -> &[Arc<dyn Publisher>] {
        &self.handles
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Handle the next publish starts at
    pub fn current(&self) -> Option<&Arc<dyn Publisher>> {
        if self.handles.is_empty() {
            return None;
        }
        let index = self.cursor.load(Ordering::Relaxed) % self.handles.len();
        self.handles.get(index)
    }

    pub async fn publish(&self, topic: &str, body: &[u8]) -> Result<(), TransportError> {
        let mut first_error = None;
        for handle in self.targets() {
            if let Err(e) = handle.publish(topic, body).await {
                warn!(address = handle.address(), topic, error = %e, "publish failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn deferred_publish(
        &self,
        topic: &str,
        delay: Duration,
        body: &[u8],
    ) -> Result<(), TransportError> {
        let mut first_error = None;
        for handle in self.targets() {
            if let Err(e) = handle.deferred_publish(topic, delay, body).await {
                warn!(address = handle.address(), topic, ?delay, error = %e, "deferred publish failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every handle
    pub async fn dispose(&self) {
        for handle in &self.handles {
            handle.stop().await;
        }
    }

    fn targets(&self) -> Vec<Arc<dyn Publisher>> {
        let len = self.handles.len();
        if len == 0 {
            return Vec::new();
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
        (0..self.replicas)
            .map(|offset| Arc::clone(&self.handles[(start + offset) % len]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryPublisher;

    fn pool(count: usize, replication: usize) -> (ProducerPool, Vec<Arc<MemoryPublisher>>) {
        let publishers: Vec<Arc<MemoryPublisher>> = (0..count)
            .map(|i| Arc::new(MemoryPublisher::new(format!("node{}:4150", i))))
            .collect();
        let handles = publishers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn Publisher>)
            .collect();
        (ProducerPool::new(handles, replication), publishers)
    }

    #[tokio::test]
    async fn test_round_robin_single_replica() {
        let (pool, publishers) = pool(3, 1);
        for _ in 0..4 {
            pool.publish("t", b"x").await.unwrap();
        }
        let counts: Vec<usize> = publishers.iter().map(|p| p.published().len()).collect();
        assert_eq!(counts, vec![2, 1, 1]);
    }

    #[tokio::test]
    async fn test_replication_targets_distinct_handles() {
        let (pool, publishers) = pool(3, 2);
        pool.publish("t", b"x").await.unwrap();
        let counts: Vec<usize> = publishers.iter().map(|p| p.published().len()).collect();
        assert_eq!(counts, vec![1, 1, 0]);

        pool.publish("t", b"y").await.unwrap();
        let counts: Vec<usize> = publishers.iter().map(|p| p.published().len()).collect();
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[tokio::test]
    async fn test_replication_is_capped() {
        let (pool, publishers) = pool(2, 5);
        assert_eq!(pool.replicas(), 2);
        pool.publish("t", b"x").await.unwrap();
        assert!(publishers.iter().all(|p| p.published().len() == 1));
    }

    #[tokio::test]
    async fn test_first_error_after_all_targets() {
        let (pool, publishers) = pool(2, 2);
        publishers[0].fail_next_publish();

        let err = pool.publish("t", b"x").await.unwrap_err();
        assert!(matches!(err, TransportError::Publish { ref address, .. } if address == "node0:4150"));
        assert_eq!(publishers[0].published().len(), 0);
        assert_eq!(publishers[1].published().len(), 1);
    }
}
