//! Human-readable currency amount parsing and fee math.
//!
//! Amounts cross the API boundary as decimal strings ("10", "9.95") and cross
//! the wire to chains as integer minor units ("10000000" for 10 USDC). This
//! module owns both representations, the protocol's business bounds, and the
//! fee schedule applied once at intent creation.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced when parsing or converting amounts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AmountError {
    /// The string could not be parsed as a decimal number.
    #[error("Can not parse amount: {0}")]
    Unparseable(String),
    /// The amount is outside the documented business limits.
    #[error("Amount {0} is outside the allowed range [{min}, {max}]", min = Amount::MIN, max = Amount::MAX)]
    OutOfRange(Decimal),
    /// The amount has more fractional digits than the token supports.
    #[error("Amount {0} has more than {1} fractional digits")]
    TooPrecise(Decimal, u32),
    /// The amount does not fit in the token's u64 minor-unit space.
    #[error("Amount {0} overflows minor units")]
    Overflow(Decimal),
}

/// A validated, human-denominated payment amount.
///
/// Construction enforces the documented business limits: a minimum of 0.01
/// and a maximum of 1,000,000. Amounts outside this range are rejected before
/// an intent is ever persisted.
///
/// # Serialization
///
/// Serializes as a decimal string to avoid floating-point representation on
/// the wire: `"9.95"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// The minimum accepted payment amount, as a raw string.
    pub const MIN: &'static str = "0.01";
    /// The maximum accepted payment amount, as a raw string.
    pub const MAX: &'static str = "1000000";

    fn min_decimal() -> Decimal {
        Decimal::new(1, 2)
    }

    fn max_decimal() -> Decimal {
        Decimal::new(1_000_000, 0)
    }

    /// Creates an amount from a decimal value, enforcing the business bounds.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if the value is below 0.01 or
    /// above 1,000,000.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Self::min_decimal() || value > Self::max_decimal() {
            return Err(AmountError::OutOfRange(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Creates an amount from integer minor units and the token's decimals.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if the resulting value is outside
    /// the business bounds.
    pub fn from_minor_units(minor: u64, decimals: u32) -> Result<Self, AmountError> {
        let value = Decimal::new(
            i64::try_from(minor).map_err(|_| AmountError::Overflow(Decimal::from(minor)))?,
            decimals,
        );
        Self::new(value)
    }

    /// Returns the inner decimal value.
    #[must_use]
    pub const fn inner(&self) -> Decimal {
        self.0
    }

    /// Converts the amount to integer minor units for the given token decimals.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::TooPrecise`] if the amount carries more
    /// fractional digits than the token supports, or
    /// [`AmountError::Overflow`] if it does not fit in a `u64`.
    pub fn to_minor_units(&self, decimals: u32) -> Result<u64, AmountError> {
        let scaled = self
            .0
            .checked_mul(Decimal::from(10u64.pow(decimals)))
            .ok_or(AmountError::Overflow(self.0))?;
        if scaled != scaled.trunc() {
            return Err(AmountError::TooPrecise(self.0, decimals));
        }
        scaled.to_u64().ok_or(AmountError::Overflow(self.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| AmountError::Unparseable(s.to_owned()))?;
        Self::new(value)
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
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The fee schedule frozen into an intent at creation.
///
/// Fees are computed once, at intent creation, and never recomputed: the
/// receiving amount is always `sending - fee` exactly as quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee in basis points of the sending amount (50 = 0.50%).
    pub basis_points: u32,
    /// Floor applied after the percentage, in the payment currency.
    pub minimum: Decimal,
}

impl FeeSchedule {
    /// Creates a fee schedule with the given basis points and no minimum.
    #[must_use]
    pub fn from_basis_points(basis_points: u32) -> Self {
        Self {
            basis_points,
            minimum: Decimal::ZERO,
        }
    }

    /// Computes the estimated fee for a sending amount, rounded to the
    /// token's decimal precision.
    #[must_use]
    pub fn fee_for(&self, sending: &Amount, decimals: u32) -> Decimal {
        let pct = sending.inner() * Decimal::new(i64::from(self.basis_points), 4);
        let fee = pct.round_dp(decimals);
        fee.max(self.minimum)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::from_basis_points(50)
    }
}
