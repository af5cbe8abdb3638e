//! Amount type for the money a client is owed.
//!
//! `Amount` wraps a non-negative `Decimal`. Its plain rendering, which text filters match against,
//! depends only on the value: `47427`, `47427.0` and `47427.00` all render as `47427.0`. The grid
//! renders it as currency.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents how amounts should be written for display.
///
/// # Examples
///  - `AmountFormat::new(true, true)` -> `$60,000.00`
///  - `AmountFormat::new(false, true)` -> `60,000.00`
///  - `AmountFormat::new(true, false)` -> `$60000.00`
///  - `AmountFormat::new(false, false)` -> `60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountFormat {
    /// Whether a dollar sign is written.
    #[serde(default = "yes")]
    dollar: bool,
    /// Whether commas are written as thousands separators.
    #[serde(default = "yes")]
    commas: bool,
}

fn yes() -> bool {
    true
}

impl Default for AmountFormat {
    fn default() -> Self {
        CURRENCY
    }
}

/// US currency formatting, e.g. `$47,427.00`.
pub const CURRENCY: AmountFormat = AmountFormat {
    dollar: true,
    commas: true,
};

impl AmountFormat {
    pub const fn new(dollar: bool, commas: bool) -> Self {
        Self { dollar, commas }
    }

    pub fn dollar(&self) -> bool {
        self.dollar
    }

    pub fn commas(&self) -> bool {
        self.commas
    }
}

/// A non-negative monetary amount.
///
/// Equality and ordering are numeric, so `47427.0` and `47427.00` are equal.
///
/// ```
/// # use client_grid::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("47427.0").unwrap();
/// assert_eq!(amount.to_string(), "47427.0");
/// assert_eq!(amount.currency(), "$47,427.00");
/// assert!(Amount::from_str("-5").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, failing if `value` is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Writes the amount using `format`, rounded to two places.
    pub fn formatted(&self, format: AmountFormat) -> String {
        let dol = if format.dollar { "$" } else { "" };
        if format.commas {
            format!(
                "{dol}{}",
                format_num::format_num!(",.2", self.0.to_f64().unwrap_or_default())
            )
        } else {
            format!("{dol}{:.2}", self.0)
        }
    }

    /// Writes the amount as US currency.
    pub fn currency(&self) -> String {
        self.formatted(CURRENCY)
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub enum AmountError {
    Empty,
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
            AmountError::Empty => write!(f, "an amount is required"),
            AmountError::Parse(e) => write!(f, "not a decimal number: {e}"),
            AmountError::Negative(v) => write!(f, "the amount {v} is negative"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses plain decimals. A leading `$` and thousands separators are accepted so that a value
    /// copied out of the grid can be pasted back in.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        let without_dollar = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError::Parse)?;
        Amount::new(value)
    }
}

/// The plain rendering: no currency symbol, no separators, no trailing zeros beyond `.0`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0.normalize();
        if value.scale() == 0 {
            write!(f, "{value}.0")
        } else {
            Display::fmt(&value, f)
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
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
