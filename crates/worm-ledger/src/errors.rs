//! Ledger client error types.

use thiserror::Error;
use worm_core::AmountError;

/// Errors from talking to the remote ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request never produced a JSON-RPC reply.
    #[error("ledger transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The ledger answered with a JSON-RPC error.
    #[error("ledger error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// The reply did not have the expected shape.
    #[error("unexpected ledger reply: {message}")]
    Decode {
        /// What was wrong with the reply.
        message: String,
    },
    /// An amount field could not be parsed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}
