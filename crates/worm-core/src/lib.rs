//! # worm-core
//!
//! Foundation types shared by every wormgate crate:
//!
//! - **Amounts**: `Amount`, an 18-decimal fixed-point value over `u128`
//!   that round-trips decimal strings without ever touching floats
//! - **Snapshots**: `AccountSnapshot` and its epoch/coin sub-records,
//!   the single wire schema every snapshot source produces

#![deny(unsafe_code)]

pub mod amount;
pub mod snapshot;

pub use amount::{Amount, AmountError, DECIMALS};
pub use snapshot::{AccountSnapshot, Coin, EpochEntry, EpochStatus, Reward};
