//! Value-moving operations: participation, claiming, and the tool-only
//! coin operations.
//!
//! Both backends validate nothing; parameter checks happen at the RPC
//! boundary before any of this runs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use worm_core::Amount;
use worm_ledger::LedgerApi;

use crate::errors::OpsError;
use crate::tool::ToolRunner;

/// Participation and claiming. Present in every deployment.
#[async_trait]
pub trait ParticipationOps: Send + Sync {
    /// Commit `amount_per_epoch` to each of the next `num_epochs` epochs.
    ///
    /// Returns a human-readable outcome (transaction hash or tool output).
    async fn participate(
        &self,
        amount_per_epoch: Amount,
        num_epochs: u64,
    ) -> Result<String, OpsError>;

    /// Claim rewards for `num_epochs` epochs starting at `start_epoch`.
    async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<String, OpsError>;
}

/// Coin lifecycle operations. Only the tool deployment has these; the
/// ledger deployment carries no implementation and the server reports
/// the operations as unsupported.
#[async_trait]
pub trait CoinOps: Send + Sync {
    /// Burn into a new coin.
    async fn burn(&self, amount: &str, spend: &str, fee: &str) -> Result<String, OpsError>;

    /// Spend from a coin, optionally to a different receiver.
    async fn spend(
        &self,
        coin_id: &str,
        amount: &str,
        fee: &str,
        receiver: Option<&str>,
    ) -> Result<String, OpsError>;

    /// Recover a failed burn.
    async fn recover(
        &self,
        method: &str,
        id_or_key: &str,
        spend: Option<&str>,
        fee: Option<&str>,
    ) -> Result<String, OpsError>;
}

/// Ledger-backed participation with the two-step allowance protocol.
pub struct LedgerParticipation {
    ledger: Arc<dyn LedgerApi>,
    account: String,
}

impl LedgerParticipation {
    /// Build over `ledger`, submitting on behalf of `account`.
    pub fn new(ledger: Arc<dyn LedgerApi>, account: impl Into<String>) -> Self {
        Self {
            ledger,
            account: account.into(),
        }
    }
}

#[async_trait]
impl ParticipationOps for LedgerParticipation {
    /// If the current allowance does not cover `amount_per_epoch * num_epochs`,
    /// an allowance increase is submitted and awaited to finality before
    /// the participation itself goes out.
    #[instrument(skip(self), fields(account = %self.account))]
    async fn participate(
        &self,
        amount_per_epoch: Amount,
        num_epochs: u64,
    ) -> Result<String, OpsError> {
        let needed = amount_per_epoch.checked_mul(num_epochs)?;
        let current = self.ledger.allowance(&self.account).await?;

        if current < needed {
            info!(%needed, %current, "raising allowance before participation");
            let tx = self.ledger.approve(needed).await?;
            self.ledger.wait_for_receipt(&tx).await?;

            let after = self.ledger.allowance(&self.account).await?;
            if after < needed {
                return Err(OpsError::InsufficientAllowance {
                    needed: needed.to_string(),
                    current: after.to_string(),
                });
            }
        }

        let tx = self.ledger.participate(amount_per_epoch, num_epochs).await?;
        info!(tx = %tx.0, "participation submitted");
        Ok(tx.0)
    }

    #[instrument(skip(self), fields(account = %self.account))]
    async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<String, OpsError> {
        let tx = self.ledger.claim(start_epoch, num_epochs).await?;
        info!(tx = %tx.0, "claim submitted");
        Ok(tx.0)
    }
}

/// Tool-backed participation: one script per operation.
pub struct ToolParticipation {
    runner: Arc<dyn ToolRunner>,
}

impl ToolParticipation {
    /// Build over `runner`.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ParticipationOps for ToolParticipation {
    async fn participate(
        &self,
        amount_per_epoch: Amount,
        num_epochs: u64,
    ) -> Result<String, OpsError> {
        let args = vec![amount_per_epoch.to_string(), num_epochs.to_string()];
        Ok(self.runner.run("participate.sh", &args).await?)
    }

    async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<String, OpsError> {
        let args = vec![start_epoch.to_string(), num_epochs.to_string()];
        Ok(self.runner.run("claim.sh", &args).await?)
    }
}

/// Tool-backed coin operations.
pub struct ToolCoinOps {
    runner: Arc<dyn ToolRunner>,
}

impl ToolCoinOps {
    /// Build over `runner`.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl CoinOps for ToolCoinOps {
    async fn burn(&self, amount: &str, spend: &str, fee: &str) -> Result<String, OpsError> {
        let args = vec![amount.to_string(), spend.to_string(), fee.to_string()];
        Ok(self.runner.run("burn.sh", &args).await?)
    }

    async fn spend(
        &self,
        coin_id: &str,
        amount: &str,
        fee: &str,
        receiver: Option<&str>,
    ) -> Result<String, OpsError> {
        let mut args = vec![coin_id.to_string(), amount.to_string(), fee.to_string()];
        if let Some(receiver) = receiver {
            args.push(receiver.to_string());
        }
        Ok(self.runner.run("spend.sh", &args).await?)
    }

    async fn recover(
        &self,
        method: &str,
        id_or_key: &str,
        spend: Option<&str>,
        fee: Option<&str>,
    ) -> Result<String, OpsError> {
        let mut args = vec![method.to_string(), id_or_key.to_string()];
        if let Some(spend) = spend {
            args.push(spend.to_string());
        }
        if let Some(fee) = fee {
            args.push(fee.to_string());
        }
        Ok(self.runner.run("recover.sh", &args).await?)
    }
}
