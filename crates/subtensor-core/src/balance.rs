//! Ledger balances held in the base unit (rao).
//!
//! All arithmetic happens on the integer rao count. Conversion to the display
//! unit (tao) only happens at presentation boundaries, through
//! [`rust_decimal::Decimal`] so that no binary floating point is involved.
//! Amounts that need finer precision than one rao are rejected, never rounded.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of rao in one tao.
pub const RAO_PER_TAO: u64 = 1_000_000_000;

/// Fractional digits of the display unit.
pub const TAO_DECIMALS: u32 = 9;

/// Display symbol of the tao unit.
pub const TAO_SYMBOL: char = '\u{03C4}';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("Invalid amount: {0} is negative")]
    Negative(String),

    #[error("Invalid amount: {0} is finer than one rao")]
    TooPrecise(String),

    #[error("Invalid amount: {0} exceeds the representable range")]
    Overflow(String),

    #[error("Invalid amount: {0}")]
    Malformed(String),
}

/// A non-negative amount counted in rao.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(u64);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub const fn from_rao(rao: u64) -> Self {
        Balance(rao)
    }

    pub const fn rao(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert a display amount into rao.
    pub fn from_tao(tao: Decimal) -> Result<Self, BalanceError> {
        if tao.is_zero() {
            return Ok(Balance::ZERO);
        }
        if tao.is_sign_negative() {
            return Err(BalanceError::Negative(tao.to_string()));
        }
        let rao = tao
            .checked_mul(Decimal::from(RAO_PER_TAO))
            .ok_or_else(|| BalanceError::Overflow(tao.to_string()))?;
        if !rao.fract().is_zero() {
            return Err(BalanceError::TooPrecise(tao.to_string()));
        }
        rao.to_u64()
            .map(Balance)
            .ok_or_else(|| BalanceError::Overflow(tao.to_string()))
    }

    /// Display amount, exact to the rao.
    pub fn to_tao(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), TAO_DECIMALS)
    }

    pub fn checked_add(self, other: Balance) -> Option<Balance> {
        self.0.checked_add(other.0).map(Balance)
    }

    pub fn checked_sub(self, other: Balance) -> Option<Balance> {
        self.0.checked_sub(other.0).map(Balance)
    }

    pub fn saturating_sub(self, other: Balance) -> Balance {
        Balance(self.0.saturating_sub(other.0))
    }

    /// Sum a sequence of balances, failing on overflow instead of wrapping.
    pub fn checked_sum<I>(balances: I) -> Option<Balance>
    where
        I: IntoIterator<Item = Balance>,
    {
        balances
            .into_iter()
            .try_fold(Balance::ZERO, |acc, b| acc.checked_add(b))
    }
}

impl From<u64> for Balance {
    fn from(rao: u64) -> Self {
        Balance(rao)
    }
}

impl TryFrom<i128> for Balance {
    type Error = BalanceError;

    fn try_from(rao: i128) -> Result<Self, Self::Error> {
        if rao < 0 {
            return Err(BalanceError::Negative(rao.to_string()));
        }
        u64::try_from(rao)
            .map(Balance)
            .map_err(|_| BalanceError::Overflow(rao.to_string()))
    }
}

impl TryFrom<u128> for Balance {
    type Error = BalanceError;

    fn try_from(rao: u128) -> Result<Self, Self::Error> {
        u64::try_from(rao)
            .map(Balance)
            .map_err(|_| BalanceError::Overflow(rao.to_string()))
    }
}

impl FromStr for Balance {
    type Err = BalanceError;

    /// Parses a tao amount such as `"1.5"` or `"τ0.000000001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(TAO_SYMBOL).unwrap_or(trimmed).trim();
        let tao = Decimal::from_str_exact(digits)
            .map_err(|e| BalanceError::Malformed(format!("{s}: {e}")))?;
        Balance::from_tao(tao)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TAO_SYMBOL, self.to_tao())
    }
}
