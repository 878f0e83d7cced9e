//! Bounded reconnect supervisor.
//!
//! Failed remote calls request a reconnect instead of retrying in place. A
//! fixed-capacity queue feeds a small worker set; a submission while the
//! queue is full is silently dropped, and a submission while an attempt is
//! already running is a no-op. That pair of rules is the only backpressure
//! in the subsystem: callers never block on reconnect completion, they
//! degrade and move on. Advisory, not a circuit breaker.

use crate::client::MetastoreClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Serializes reconnect attempts against the metastore without queuing
/// unbounded retries.
pub struct ReconnectSupervisor {
    tx: mpsc::Sender<()>,
    active: Arc<AtomicUsize>,
}

impl ReconnectSupervisor {
    /// Spawn the worker set and return the supervisor handle.
    ///
    /// Workers run for the lifetime of the handle; dropping it closes the
    /// queue and the workers exit after draining it.
    pub fn start(
        client: Arc<dyn MetastoreClient>,
        queue_capacity: usize,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let active = Arc::new(AtomicUsize::new(0));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let active = Arc::clone(&active);
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                loop {
                    let task = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    if task.is_none() {
                        break;
                    }

                    active.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(worker, "reconnect attempt started");
                    match client.reconnect().await {
                        Ok(()) => tracing::info!("metastore connection restored"),
                        // no retry chaining: the next failed remote call
                        // will request another attempt
                        Err(e) => tracing::error!(error = %e, "reconnect to metastore failed"),
                    }
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }

        Self { tx, active }
    }

    /// Non-blocking: submit a reconnect task unless one is already running;
    /// drop the request when the queue is full.
    pub fn request_reconnect(&self) {
        if self.active.load(Ordering::SeqCst) != 0 {
            return;
        }
        match self.tx.try_send(()) {
            Ok(()) => tracing::debug!("reconnect task queued"),
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!("reconnect queue full, request dropped");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::warn!("reconnect supervisor stopped, request dropped");
            }
        }
    }

    /// Number of reconnect attempts currently running.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetastoreError, Result};
    use crate::types::TableDescriptor;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Client whose reconnect blocks until released, counting attempts.
    struct BlockingReconnectClient {
        attempts: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    impl BlockingReconnectClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicUsize::new(0),
                entered: Notify::new(),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl MetastoreClient for BlockingReconnectClient {
        async fn list_databases(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn list_tables(&self, _db: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn get_table(&self, db: &str, table: &str) -> Result<TableDescriptor> {
            Err(MetastoreError::NotFound(format!("{}.{}", db, table)))
        }

        async fn reconnect(&self) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    async fn wait_until_idle(supervisor: &ReconnectSupervisor) {
        for _ in 0..100 {
            if supervisor.active_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("reconnect worker never went idle");
    }

    #[tokio::test]
    async fn test_single_flight_while_attempt_active() {
        let client = BlockingReconnectClient::new();
        let supervisor = ReconnectSupervisor::start(client.clone(), 3, 1);

        supervisor.request_reconnect();
        client.entered.notified().await;
        assert_eq!(supervisor.active_count(), 1);

        // requests while an attempt is in flight are no-ops
        supervisor.request_reconnect();
        supervisor.request_reconnect();
        supervisor.request_reconnect();

        client.release.notify_one();
        wait_until_idle(&supervisor).await;
        assert_eq!(client.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rearm_after_completion() {
        let client = BlockingReconnectClient::new();
        let supervisor = ReconnectSupervisor::start(client.clone(), 3, 1);

        supervisor.request_reconnect();
        client.entered.notified().await;
        client.release.notify_one();
        wait_until_idle(&supervisor).await;

        // a later failure triggers exactly one new attempt
        supervisor.request_reconnect();
        client.entered.notified().await;
        client.release.notify_one();
        wait_until_idle(&supervisor).await;

        assert_eq!(client.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_overflow_is_dropped_not_blocking() {
        // no workers draining: spawn with a client, then fill the queue via
        // a supervisor whose single worker is parked inside an attempt
        let client = BlockingReconnectClient::new();
        let supervisor = ReconnectSupervisor::start(client.clone(), 1, 1);

        supervisor.request_reconnect();
        client.entered.notified().await;

        // worker is busy; active_count is 1, so these are gated no-ops and
        // return immediately rather than blocking the caller
        let start = std::time::Instant::now();
        for _ in 0..50 {
            supervisor.request_reconnect();
        }
        assert!(start.elapsed() < Duration::from_millis(100));

        client.release.notify_one();
        wait_until_idle(&supervisor).await;
        assert_eq!(client.attempts.load(Ordering::SeqCst), 1);
    }
}
