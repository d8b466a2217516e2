//! Fixed-point monetary amounts with 18 fractional decimal digits.
//!
//! All balances, commitments, and rewards in the system are multiples of
//! `10^-18` of a whole token. `Amount` stores base units in a `u128` and
//! converts to and from human decimal strings losslessly. Binary floating
//! point is never involved.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fractional digits carried by every amount.
pub const DECIMALS: u32 = 18;

const SCALE: u128 = 10u128.pow(DECIMALS);

/// Errors from parsing or arithmetic on amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Input was not a non-negative decimal number.
    #[error("invalid amount: {input:?}")]
    Invalid {
        /// The rejected input.
        input: String,
    },
    /// More than [`DECIMALS`] fractional digits.
    #[error("amount {input:?} has more than {DECIMALS} fractional digits")]
    TooPrecise {
        /// The rejected input.
        input: String,
    },
    /// Value exceeds the representable range.
    #[error("amount overflow")]
    Overflow,
}

/// A non-negative token amount in base units (`10^-18` of a whole token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    /// Zero tokens.
    pub const ZERO: Self = Self(0);

    /// Construct from raw base units.
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Raw base units.
    pub const fn base_units(self) -> u128 {
        self.0
    }

    /// Whether this is exactly zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a base-unit integer string (the ledger wire form).
    pub fn from_base_str(s: &str) -> Result<Self, AmountError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Invalid { input: s.into() });
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::Overflow)
    }

    /// Base-unit integer string (the ledger wire form).
    pub fn to_base_str(self) -> String {
        self.0.to_string()
    }

    /// Multiply by an epoch count, failing on overflow.
    pub fn checked_mul(self, count: u64) -> Result<Self, AmountError> {
        self.0
            .checked_mul(u128::from(count))
            .map(Self)
            .ok_or(AmountError::Overflow)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a human decimal string such as `"1.5"` or `"0.003000"`.
    ///
    /// Rejects signs, exponents, empty parts, and more than 18 fractional
    /// digits. `"1.50"` and `"1.5"` parse to the same value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::Invalid { input: s.into() };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() > DECIMALS as usize {
            return Err(AmountError::TooPrecise { input: s.into() });
        }

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| AmountError::Overflow)?
        };
        let mut frac: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| AmountError::Overflow)?
        };
        frac *= 10u128.pow(DECIMALS - frac_part.len() as u32);

        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or(AmountError::Overflow)
    }
}

impl fmt::Display for Amount {
    /// Render as a decimal string with trailing fractional zeros trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:018}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
