//! Connection-scoped account subscription.
//!
//! An `account.watch` call binds a `Subscription` to the session. The
//! subscription owns a background task that pushes an `accountUpdate`
//! event on a fixed cadence; dropping the subscription (rebind or
//! disconnect) aborts the task, so a client can never outlive its own
//! pushes.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use worm_snapshot::SnapshotSource;

use crate::rpc::types::RpcEvent;

/// A live watch on one account, owned by a single session.
pub struct Subscription {
    address: String,
    source: Arc<dyn SnapshotSource>,
    tx: mpsc::Sender<String>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Start watching `address`, pushing an update every `interval`.
    ///
    /// The first push happens one full interval after the watch is
    /// established, not immediately.
    pub fn spawn(
        address: String,
        source: Arc<dyn SnapshotSource>,
        tx: mpsc::Sender<String>,
        interval: Duration,
    ) -> Self {
        let task_address = address.clone();
        let task_source = source.clone();
        let task_tx = tx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the immediate first tick
            let _ = ticker.tick().await;
            loop {
                let _ = ticker.tick().await;
                match task_source.snapshot(&task_address).await {
                    Ok(snapshot) => {
                        push_event(
                            &task_tx,
                            &RpcEvent::new(
                                "accountUpdate",
                                serde_json::to_value(snapshot).ok(),
                            ),
                        );
                        counter!("account_updates_pushed_total").increment(1);
                    }
                    Err(e) => {
                        // Periodic failures are transient; keep the cadence.
                        warn!(address = %task_address, error = %e, "periodic account refresh failed");
                        counter!("account_update_failures_total").increment(1);
                    }
                }
            }
        });
        debug!(address = %address, "account watch established");
        Self {
            address,
            source,
            tx,
            task,
        }
    }

    /// The watched address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Push one update now, without touching the periodic cadence.
    ///
    /// A failed read becomes an `error` event on the connection.
    pub async fn refresh(&self) {
        match self.source.snapshot(&self.address).await {
            Ok(snapshot) => {
                push_event(
                    &self.tx,
                    &RpcEvent::new("accountUpdate", serde_json::to_value(snapshot).ok()),
                );
                counter!("account_updates_pushed_total").increment(1);
            }
            Err(e) => {
                push_event(
                    &self.tx,
                    &RpcEvent::new("error", Some(json!({ "message": e.to_string() }))),
                );
                counter!("account_update_failures_total").increment(1);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serialize and enqueue an event, dropping it if the channel is full.
pub(crate) fn push_event(tx: &mpsc::Sender<String>, event: &RpcEvent) {
    if let Some(json) = event.to_json() {
        if tx.try_send(json).is_err() {
            warn!(event_type = %event.event_type, "event dropped (channel full or closed)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use worm_core::AccountSnapshot;
    use worm_ledger::LedgerError;
    use worm_snapshot::SnapshotError;

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn snapshot(&self, address: &str) -> Result<AccountSnapshot, SnapshotError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccountSnapshot::empty("sepolia", address))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SnapshotSource for FailingSource {
        async fn snapshot(&self, _address: &str) -> Result<AccountSnapshot, SnapshotError> {
            Err(SnapshotError::Ledger(LedgerError::Rpc {
                code: -32000,
                message: "ledger unreachable".into(),
            }))
        }
    }

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test(start_paused = true)]
    async fn pushes_on_schedule_not_immediately() {
        let source = CountingSource::new();
        let (tx, mut rx) = mpsc::channel(64);
        let _sub = Subscription::spawn(
            ADDR.into(),
            source.clone(),
            tx,
            Duration::from_secs(30),
        );

        // Nothing before the first interval elapses
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(source.calls(), 0);

        // Ticks at 30s, 60s, 90s
        tokio::time::sleep(Duration::from_secs(66)).await;
        assert_eq!(source.calls(), 3);

        for _ in 0..3 {
            let msg = rx.recv().await.unwrap();
            let event: serde_json::Value = serde_json::from_str(&msg).unwrap();
            assert_eq!(event["type"], "accountUpdate");
            assert_eq!(event["data"]["address"], ADDR);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_push_task() {
        let source = CountingSource::new();
        let (tx, _rx) = mpsc::channel(64);
        let sub = Subscription::spawn(
            ADDR.into(),
            source.clone(),
            tx,
            Duration::from_secs(30),
        );

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(source.calls(), 1);

        drop(sub);
        tokio::time::sleep(Duration::from_secs(10_000)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_does_not_reset_the_schedule() {
        let source = CountingSource::new();
        let (tx, _rx) = mpsc::channel(64);
        let sub = Subscription::spawn(
            ADDR.into(),
            source.clone(),
            tx,
            Duration::from_secs(30),
        );

        tokio::time::sleep(Duration::from_secs(15)).await;
        sub.refresh().await;
        assert_eq!(source.calls(), 1);

        // The periodic tick still fires at t=30, not t=45
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_failure_becomes_error_event() {
        let (tx, mut rx) = mpsc::channel(64);
        let sub = Subscription::spawn(
            ADDR.into(),
            Arc::new(FailingSource),
            tx,
            Duration::from_secs(3600),
        );

        sub.refresh().await;
        let msg = rx.recv().await.unwrap();
        let event: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(event["type"], "error");
        assert!(
            event["data"]["message"]
                .as_str()
                .unwrap()
                .contains("ledger unreachable")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_failure_keeps_the_cadence() {
        // Failures are logged, never pushed, and never stop the loop.
        let (tx, mut rx) = mpsc::channel(64);
        let _sub = Subscription::spawn(
            ADDR.into(),
            Arc::new(FailingSource),
            tx,
            Duration::from_secs(30),
        );

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(rx.try_recv().is_err());
    }
}
