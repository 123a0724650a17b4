//! Money and card value types.
//!
//! # Design
//! Amounts travel as integer minor units (cents) so the wire never carries a
//! float. Card numbers and CVVs have masking `Debug` impls; they end up inside
//! request structs that are routinely logged with `?`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A positive monetary amount in minor currency units. Deserialization goes
/// through `from_cents`, so a zero or negative wire value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Result<Self, ApiError> {
        if cents <= 0 {
            return Err(ApiError::InvalidRequest(format!(
                "amount must be positive, got {cents} cents"
            )));
        }
        Ok(Self(cents))
    }

    /// Convert a decimal amount in major units, rounding half away from zero
    /// to whole cents.
    pub fn from_decimal(value: Decimal) -> Result<Self, ApiError> {
        let cents = value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.to_i64())
            .ok_or_else(|| ApiError::InvalidRequest(format!("amount {value} is out of range")))?;
        Self::from_cents(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl TryFrom<i64> for Amount {
    type Error = ApiError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// A primary account number. Spaces and dashes are stripped on construction;
/// validity is left to the gateway.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn new(number: impl Into<String>) -> Self {
        let number: String = number.into();
        Self(number.chars().filter(|c| !matches!(c, ' ' | '-')).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn last_four(&self) -> &str {
        let start = self.0.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
        &self.0[start..]
    }

    /// The number with every character but the last four replaced by `X`.
    pub fn masked(&self) -> String {
        let len = self.0.chars().count();
        "X".repeat(len.saturating_sub(4)) + self.last_four()
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CardNumber").field(&self.masked()).finish()
    }
}

impl From<&str> for CardNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CardNumber {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Card expiry month and year, written `MM/YYYY` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardExpiry {
    month: u8,
    year: u16,
}

impl CardExpiry {
    pub fn new(month: u8, year: u16) -> Result<Self, ApiError> {
        if !(1..=12).contains(&month) {
            return Err(ApiError::InvalidRequest(format!("expiry month {month} is not 1-12")));
        }
        if !(1000..=9999).contains(&year) {
            return Err(ApiError::InvalidRequest(format!("expiry year {year} is not four digits")));
        }
        Ok(Self { month, year })
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }
}

impl FromStr for CardExpiry {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidRequest(format!("card expiry {s:?} is not MM/YYYY"));
        let (month, year) = s.trim().split_once('/').ok_or_else(invalid)?;
        if month.is_empty() || month.len() > 2 || year.len() != 4 {
            return Err(invalid());
        }
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let year: u16 = year.parse().map_err(|_| invalid())?;
        Self::new(month, year)
    }
}

impl TryFrom<String> for CardExpiry {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardExpiry> for String {
    fn from(value: CardExpiry) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Card verification value. Accepts string or numeric input.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cvv(String);

impl Cvv {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Cvv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cvv(***)")
    }
}

impl From<&str> for Cvv {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<String> for Cvv {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<u16> for Cvv {
    fn from(value: u16) -> Self {
        Self(value.to_string())
    }
}

impl From<u32> for Cvv {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}
