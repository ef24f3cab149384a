//! Arbitrary-precision decimal amounts carried as strings.
//!
//! Stake and yield figures can exceed `u128` once multiplied out in wei,
//! so they travel as canonical decimal strings and are stored as
//! PostgreSQL `NUMERIC`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Non-negative decimal string, e.g. `"1000000"` or `"12.5"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "1000000")]
pub struct TokenAmount(String);

/// Why an amount string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Empty input.
    #[error("amount is empty")]
    Empty,
    /// Not a plain non-negative decimal.
    #[error("amount {0:?} is not a non-negative decimal")]
    Malformed(String),
    /// Fractional part where an integer is required.
    #[error("amount {0:?} must be an integer")]
    NotInteger(String),
}

impl TokenAmount {
    /// Parses a non-negative decimal with an optional fractional part.
    ///
    /// Leading zeros in the integer part and trailing zeros in the
    /// fractional part are stripped so equal amounts compare equal.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] on empty or malformed input.
    pub fn parse_decimal(raw: &str) -> Result<Self, AmountError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };
        let digits_only = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(int_part) || frac_part.is_some_and(|f| !digits_only(f)) {
            return Err(AmountError::Malformed(s.to_string()));
        }

        let int_norm = int_part.trim_start_matches('0');
        let int_norm = if int_norm.is_empty() { "0" } else { int_norm };
        let frac_norm = frac_part.map(|f| f.trim_end_matches('0')).unwrap_or("");

        if frac_norm.is_empty() {
            Ok(Self(int_norm.to_string()))
        } else {
            Ok(Self(format!("{int_norm}.{frac_norm}")))
        }
    }

    /// Parses a non-negative integer amount (base units, no decimals).
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::NotInteger`] if the value has a fractional part.
    pub fn parse_integer(raw: &str) -> Result<Self, AmountError> {
        let amount = Self::parse_decimal(raw)?;
        if amount.0.contains('.') {
            return Err(AmountError::NotInteger(raw.trim().to_string()));
        }
        Ok(amount)
    }

    /// Canonical decimal string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for any representation of zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Indexers send either JSON strings or bare numbers. Numbers keep
        // their source digits, so integers past u64 survive; exponent
        // notation is rejected.
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected decimal string, got {other}"
                )));
            }
        };
        Self::parse_decimal(&raw).map_err(serde::de::Error::custom)
    }
}
