//! The ledger-backed snapshot source: windowed epoch aggregation.
//!
//! The scan covers `[head - window, head]`. Failures split two ways:
//! the epoch head and the two balances are load-bearing and abort the
//! whole aggregation, while any single epoch's reads are isolated —
//! a failed epoch becomes a skipped entry and the rest of the window
//! still aggregates.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use tracing::{debug, warn};

use worm_core::{AccountSnapshot, EpochEntry, EpochStatus, Reward};
use worm_ledger::{LedgerApi, TokenKind};

use crate::errors::SnapshotError;
use crate::source::SnapshotSource;

/// Snapshot source that reads the remote ledger directly.
pub struct EpochAggregator {
    ledger: Arc<dyn LedgerApi>,
    network: String,
    window: u64,
}

impl EpochAggregator {
    /// Build an aggregator scanning `window` completed epochs behind the head.
    pub fn new(ledger: Arc<dyn LedgerApi>, network: impl Into<String>, window: u64) -> Self {
        Self {
            ledger,
            network: network.into(),
            window,
        }
    }

    /// Scan one completed epoch.
    ///
    /// `None` means the account did not commit to it. A read failure
    /// yields a skipped entry, never an error.
    async fn scan_completed(&self, epoch: u64, address: &str) -> Option<EpochEntry> {
        let reads = future::try_join(
            self.ledger.epoch_commitment(epoch, address),
            self.ledger.epoch_total(epoch),
        )
        .await;
        let (committed, total) = match reads {
            Ok(pair) => pair,
            Err(err) => {
                warn!(epoch, error = %err, "epoch read failed, skipping");
                return Some(EpochEntry {
                    epoch,
                    status: EpochStatus::Skipped {
                        reason: err.to_string(),
                    },
                });
            }
        };
        if committed.is_zero() {
            return None;
        }

        let expected = match self.ledger.estimated_reward(epoch, 1, address).await {
            Ok(amount) => Reward::Computed {
                amount: amount.to_string(),
            },
            Err(err) => {
                warn!(epoch, error = %err, "reward estimate failed");
                Reward::Unknown
            }
        };
        Some(EpochEntry {
            epoch,
            status: EpochStatus::Ok {
                committed: committed.to_string(),
                total: total.to_string(),
                expected,
            },
        })
    }

    /// Scan the in-progress epoch. Its reward is always pending; the
    /// completed-epoch estimate is undefined for it.
    async fn scan_head(&self, epoch: u64, address: &str) -> Option<EpochEntry> {
        let reads = future::try_join(
            self.ledger.epoch_commitment(epoch, address),
            self.ledger.epoch_total(epoch),
        )
        .await;
        match reads {
            Ok((committed, total)) => {
                if committed.is_zero() {
                    return None;
                }
                Some(EpochEntry {
                    epoch,
                    status: EpochStatus::Ok {
                        committed: committed.to_string(),
                        total: total.to_string(),
                        expected: Reward::Pending,
                    },
                })
            }
            Err(err) => {
                warn!(epoch, error = %err, "current epoch read failed, skipping");
                Some(EpochEntry {
                    epoch,
                    status: EpochStatus::Skipped {
                        reason: err.to_string(),
                    },
                })
            }
        }
    }

    /// Claimable estimate over the completed epochs that aggregated
    /// cleanly. Degrades to `"0"` on failure; the window itself already
    /// stands.
    async fn claimable(&self, epochs: &[EpochEntry], head: u64, address: &str) -> String {
        let completed: Vec<u64> = epochs
            .iter()
            .filter(|e| e.epoch < head && matches!(e.status, EpochStatus::Ok { .. }))
            .map(|e| e.epoch)
            .collect();
        let Some(&first) = completed.first() else {
            return "0".to_string();
        };
        match self
            .ledger
            .estimated_reward(first, completed.len() as u64, address)
            .await
        {
            Ok(amount) => amount.to_string(),
            Err(err) => {
                warn!(first, error = %err, "claimable estimate failed, reporting zero");
                "0".to_string()
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for EpochAggregator {
    async fn snapshot(&self, address: &str) -> Result<AccountSnapshot, SnapshotError> {
        let head = self.ledger.current_epoch().await?;
        let (beth, worm) = future::try_join(
            self.ledger.balance_of(TokenKind::Beth, address),
            self.ledger.balance_of(TokenKind::Worm, address),
        )
        .await?;

        let start = head.saturating_sub(self.window);
        debug!(head, start, address, "scanning epoch window");

        let scans = (start..head).map(|e| self.scan_completed(e, address));
        let mut epochs: Vec<EpochEntry> = future::join_all(scans)
            .await
            .into_iter()
            .flatten()
            .collect();

        if let Some(entry) = self.scan_head(head, address).await {
            epochs.push(entry);
        }
        epochs.sort_unstable_by_key(|e| e.epoch);

        let claimable_worm = self.claimable(&epochs, head, address).await;

        Ok(AccountSnapshot {
            network: self.network.clone(),
            address: address.to_string(),
            current_epoch: head,
            beth_balance: beth.to_string(),
            worm_balance: worm.to_string(),
            claimable_worm,
            epochs,
            coins: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLedger, amt, rpc_err};
    use assert_matches::assert_matches;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn with_balances(mock: &mut MockLedger) {
        let _ = mock
            .expect_balance_of()
            .returning(|token, _| match token {
                TokenKind::Beth => Ok(amt("2.5")),
                TokenKind::Worm => Ok(amt("0.125")),
            });
    }

    fn aggregator(mock: MockLedger, window: u64) -> EpochAggregator {
        EpochAggregator::new(Arc::new(mock), "sepolia", window)
    }

    #[tokio::test]
    async fn aggregates_committed_epochs_in_order() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(7));
        with_balances(&mut mock);
        // Committed to epochs 3, 5, and the head (7).
        let _ = mock.expect_epoch_commitment().returning(|epoch, _| {
            Ok(if matches!(epoch, 3 | 5 | 7) {
                amt("1")
            } else {
                amt("0")
            })
        });
        let _ = mock.expect_epoch_total().returning(|_| Ok(amt("4")));
        let _ = mock
            .expect_estimated_reward()
            .withf(|_, count, _| *count == 1)
            .returning(|_, _, _| Ok(amt("0.1")));
        let _ = mock
            .expect_estimated_reward()
            .withf(|start, count, _| *start == 3 && *count == 2)
            .returning(|_, _, _| Ok(amt("0.25")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();

        assert_eq!(snap.current_epoch, 7);
        assert_eq!(snap.beth_balance, "2.5");
        assert_eq!(snap.worm_balance, "0.125");
        assert_eq!(snap.claimable_worm, "0.25");
        let numbers: Vec<u64> = snap.epochs.iter().map(|e| e.epoch).collect();
        assert_eq!(numbers, vec![3, 5, 7]);
        assert_matches!(
            snap.epochs[0].status,
            EpochStatus::Ok { expected: Reward::Computed { ref amount }, .. } if amount == "0.1"
        );
        assert_matches!(
            snap.epochs[2].status,
            EpochStatus::Ok {
                expected: Reward::Pending,
                ..
            }
        );
        assert!(snap.coins.is_empty());
    }

    #[tokio::test]
    async fn window_clamps_at_epoch_zero() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(2));
        with_balances(&mut mock);
        // Completed scan must touch exactly epochs 0 and 1 (plus head 2).
        let _ = mock
            .expect_epoch_commitment()
            .withf(|epoch, _| *epoch <= 2)
            .times(3)
            .returning(|_, _| Ok(amt("0")));
        let _ = mock
            .expect_epoch_total()
            .withf(|epoch| *epoch <= 2)
            .times(3)
            .returning(|_| Ok(amt("4")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();
        assert!(snap.epochs.is_empty());
        assert_eq!(snap.claimable_worm, "0");
    }

    #[tokio::test]
    async fn head_failure_is_fatal() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Err(rpc_err("down")));

        let err = aggregator(mock, 5).snapshot(ADDR).await.unwrap_err();
        assert_matches!(err, SnapshotError::Ledger(_));
    }

    #[tokio::test]
    async fn balance_failure_is_fatal() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(7));
        let _ = mock
            .expect_balance_of()
            .returning(|_, _| Err(rpc_err("down")));

        let err = aggregator(mock, 5).snapshot(ADDR).await.unwrap_err();
        assert_matches!(err, SnapshotError::Ledger(_));
    }

    #[tokio::test]
    async fn failed_epoch_is_skipped_without_poisoning_the_window() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(6));
        with_balances(&mut mock);
        let _ = mock.expect_epoch_commitment().returning(|epoch, _| {
            if epoch == 4 {
                Err(rpc_err("flaky"))
            } else {
                Ok(if epoch == 5 { amt("1") } else { amt("0") })
            }
        });
        let _ = mock.expect_epoch_total().returning(|_| Ok(amt("4")));
        let _ = mock
            .expect_estimated_reward()
            .returning(|_, _, _| Ok(amt("0.1")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();
        let numbers: Vec<u64> = snap.epochs.iter().map(|e| e.epoch).collect();
        assert_eq!(numbers, vec![4, 5]);
        assert_matches!(
            snap.epochs[0].status,
            EpochStatus::Skipped { ref reason } if reason.contains("flaky")
        );
        assert_matches!(snap.epochs[1].status, EpochStatus::Ok { .. });
    }

    #[tokio::test]
    async fn head_reward_is_never_estimated() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(3));
        with_balances(&mut mock);
        // Only the head is committed; any estimated_reward call would
        // have no matching expectation and fail the test.
        let _ = mock
            .expect_epoch_commitment()
            .returning(|epoch, _| Ok(if epoch == 3 { amt("1") } else { amt("0") }));
        let _ = mock.expect_epoch_total().returning(|_| Ok(amt("4")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();
        assert_eq!(snap.epochs.len(), 1);
        assert_matches!(
            snap.epochs[0].status,
            EpochStatus::Ok {
                expected: Reward::Pending,
                ..
            }
        );
        assert_eq!(snap.claimable_worm, "0");
    }

    #[tokio::test]
    async fn reward_and_claimable_failures_degrade() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(5));
        with_balances(&mut mock);
        let _ = mock
            .expect_epoch_commitment()
            .returning(|epoch, _| Ok(if epoch == 3 { amt("1") } else { amt("0") }));
        let _ = mock.expect_epoch_total().returning(|_| Ok(amt("4")));
        let _ = mock
            .expect_estimated_reward()
            .returning(|_, _, _| Err(rpc_err("estimator down")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();
        assert_matches!(
            snap.epochs[0].status,
            EpochStatus::Ok {
                expected: Reward::Unknown,
                ..
            }
        );
        assert_eq!(snap.claimable_worm, "0");
    }

    #[tokio::test]
    async fn epoch_zero_head_scans_nothing_behind() {
        let mut mock = MockLedger::new();
        let _ = mock.expect_current_epoch().returning(|| Ok(0));
        with_balances(&mut mock);
        let _ = mock
            .expect_epoch_commitment()
            .withf(|epoch, _| *epoch == 0)
            .times(1)
            .returning(|_, _| Ok(amt("1")));
        let _ = mock
            .expect_epoch_total()
            .times(1)
            .returning(|_| Ok(amt("1")));

        let snap = aggregator(mock, 5).snapshot(ADDR).await.unwrap();
        assert_eq!(snap.epochs.len(), 1);
        assert_eq!(snap.epochs[0].epoch, 0);
        assert_eq!(snap.claimable_worm, "0");
    }
}
