//! Amount type for handling non-negative monetary values.
//!
//! User input may or may not include a dollar sign and thousands separators. The value is stored
//! and synced as a plain JSON number.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a non-negative monetary amount. Whether it counts for or against a project's balance
/// is decided by the transaction type, never by a sign.
///
/// # Examples
///
/// ```
/// # use fintrack::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,234.50").unwrap();
/// assert_eq!(amount.to_string(), "1,234.50");
/// assert!(Amount::from_str("-5").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an `Amount`, rejecting negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The shortest plain representation, e.g. `12.5` rather than `12.50`.
    pub fn plain(&self) -> String {
        self.0.normalize().to_string()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub enum AmountError {
    Parse(rust_decimal::Error),
    Negative(Decimal),
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => write!(f, "Invalid amount: {e}"),
            AmountError::Negative(v) => write!(f, "Amounts cannot be negative, got {v}"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            AmountError::Negative(_) => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let without_dollar = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError::Parse)?;
        Amount::new(value)
    }
}

impl Display for Amount {
    /// Two decimal places with thousands separators, e.g. `1,234.50`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            format_num::format_num!(",.2", self.0.to_f64().unwrap_or_default())
        )
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
