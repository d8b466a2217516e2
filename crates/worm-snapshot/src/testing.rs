//! Shared test doubles and helpers.

use async_trait::async_trait;
use mockall::mock;

use worm_core::Amount;
use worm_ledger::{LedgerApi, LedgerError, TokenKind, TxHandle};

mock! {
    pub Ledger {}

    #[async_trait]
    impl LedgerApi for Ledger {
        async fn current_epoch(&self) -> Result<u64, LedgerError>;
        async fn balance_of(&self, token: TokenKind, address: &str) -> Result<Amount, LedgerError>;
        async fn epoch_commitment(&self, epoch: u64, address: &str) -> Result<Amount, LedgerError>;
        async fn epoch_total(&self, epoch: u64) -> Result<Amount, LedgerError>;
        async fn estimated_reward(
            &self,
            start_epoch: u64,
            count: u64,
            address: &str,
        ) -> Result<Amount, LedgerError>;
        async fn allowance(&self, owner: &str) -> Result<Amount, LedgerError>;
        async fn approve(&self, amount: Amount) -> Result<TxHandle, LedgerError>;
        async fn participate(
            &self,
            amount_per_epoch: Amount,
            num_epochs: u64,
        ) -> Result<TxHandle, LedgerError>;
        async fn claim(&self, start_epoch: u64, num_epochs: u64) -> Result<TxHandle, LedgerError>;
        async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<(), LedgerError>;
    }
}

pub fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

pub fn rpc_err(message: &str) -> LedgerError {
    LedgerError::Rpc {
        code: -32000,
        message: message.into(),
    }
}
