//! The account snapshot schema — the one record every snapshot source
//! produces and every consumer receives, serialized camelCase on the wire.
//!
//! Monetary fields stay decimal strings end to end; parsing them into
//! [`crate::Amount`] is the caller's business.

use serde::{Deserialize, Serialize};

/// A point-in-time view of one account's participation state.
///
/// Built fresh on every aggregation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    /// Network the snapshot was taken against.
    pub network: String,
    /// The account address.
    pub address: String,
    /// The in-progress epoch at snapshot time.
    pub current_epoch: u64,
    /// BETH balance, decimal string.
    pub beth_balance: String,
    /// WORM balance, decimal string.
    pub worm_balance: String,
    /// Estimated claimable WORM over completed window epochs, decimal string.
    pub claimable_worm: String,
    /// Window epochs the account touched, ascending by epoch number.
    pub epochs: Vec<EpochEntry>,
    /// Owned coins (tool-backed deployments only).
    pub coins: Vec<Coin>,
}

impl AccountSnapshot {
    /// A snapshot with documented defaults: epoch 0, zero balances,
    /// empty epoch and coin lists.
    pub fn empty(network: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
            current_epoch: 0,
            beth_balance: "0".into(),
            worm_balance: "0".into(),
            claimable_worm: "0".into(),
            epochs: Vec::new(),
            coins: Vec::new(),
        }
    }
}

/// One window position in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochEntry {
    /// Epoch number.
    pub epoch: u64,
    /// What is known about the account's stake in this epoch.
    #[serde(flatten)]
    pub status: EpochStatus,
}

/// Per-epoch outcome. `Skipped` keeps a failed read distinguishable from
/// an epoch the account simply did not commit to (which is absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EpochStatus {
    /// Reads succeeded and the account committed to this epoch.
    Ok {
        /// The account's commitment, decimal string.
        committed: String,
        /// Everyone's commitment, decimal string.
        total: String,
        /// Expected reward for this epoch.
        expected: Reward,
    },
    /// Reads failed; nothing is known about this epoch.
    Skipped {
        /// Why the epoch was skipped.
        reason: String,
    },
}

/// Expected reward for an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Reward {
    /// Completed epoch with an on-ledger estimate.
    Computed {
        /// The estimate, decimal string.
        amount: String,
    },
    /// The epoch has not completed; no estimate exists yet.
    Pending,
    /// The estimate read failed.
    Unknown,
}

/// An owned coin, as reported by the external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    /// Coin identifier, decimal string.
    pub id: String,
    /// Coin amount, decimal string.
    pub amount: String,
}
