//! # worm-ledger
//!
//! The [`LedgerApi`] trait — every read and write the aggregation and
//! participation paths need from the remote ledger — and its HTTP
//! JSON-RPC implementation, [`HttpLedgerClient`].
//!
//! Amounts cross the wire as base-unit integer strings and are converted
//! to [`worm_core::Amount`] at the boundary. The client never retries;
//! callers decide what a failure means.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;

pub use client::{HttpLedgerClient, LedgerApi, TokenKind, TxHandle};
pub use errors::LedgerError;
