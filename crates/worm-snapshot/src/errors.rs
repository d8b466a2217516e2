//! Error types for snapshot production and the write paths.

use thiserror::Error;
use worm_core::AmountError;
use worm_ledger::LedgerError;

/// A failed external tool invocation.
///
/// Carries the tool's stderr verbatim; invocations are never retried.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecError {
    /// What went wrong (spawn failure, non-zero exit, timeout).
    pub message: String,
    /// The tool's stderr, unmodified.
    pub stderr: String,
}

/// A snapshot could not be produced at all.
///
/// Per-epoch read failures never surface here; they are absorbed into
/// the snapshot as skipped entries.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A fatal ledger read (epoch head or a balance) failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The external tool invocation failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// A value-moving operation failed.
#[derive(Debug, Error)]
pub enum OpsError {
    /// The allowance is too small and could not be raised.
    #[error("insufficient allowance: needed {needed}, current {current}")]
    InsufficientAllowance {
        /// Total the operation requires, decimal string.
        needed: String,
        /// Allowance actually granted, decimal string.
        current: String,
    },
    /// A ledger call failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The external tool invocation failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
    /// An amount overflowed during allowance math.
    #[error(transparent)]
    Amount(#[from] AmountError),
}
