//! # worm-snapshot
//!
//! Snapshot production and the write paths behind it:
//!
//! - **`SnapshotSource`** — the one capability trait both deployment
//!   modes implement
//! - **`EpochAggregator`** — the ledger-backed source: windowed epoch
//!   scan with per-epoch failure isolation
//! - **`SnapshotParser`** — tolerant parser for the external tool's text
//!   output
//! - **`ScriptRunner`** — bounded-timeout external tool execution
//! - **`ParticipationOps` / `CoinOps`** — the value-moving operations,
//!   with a ledger backend (two-step allowance protocol) and a tool
//!   backend (script invocation)
//! - **`Deployment`** — the mode-selected bundle the server is wired with

#![deny(unsafe_code)]

pub mod aggregator;
pub mod deployment;
pub mod errors;
pub mod ops;
pub mod parser;
pub mod source;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::EpochAggregator;
pub use deployment::Deployment;
pub use errors::{ExecError, OpsError, SnapshotError};
pub use ops::{CoinOps, LedgerParticipation, ParticipationOps, ToolCoinOps, ToolParticipation};
pub use parser::SnapshotParser;
pub use source::{SnapshotSource, ToolSnapshotSource};
pub use tool::{ScriptRunner, ToolRunner};
