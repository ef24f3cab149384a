//! Hex-encoded Ethereum identifiers: account addresses and transaction hashes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Why a hex identifier failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexIdError {
    /// Missing the `0x` prefix.
    #[error("missing 0x prefix")]
    MissingPrefix,
    /// Wrong number of hex digits after the prefix.
    #[error("expected {expected} hex digits, got {actual}")]
    Length {
        /// Required digit count.
        expected: usize,
        /// Digit count found.
        actual: usize,
    },
    /// A non-hex character was found.
    #[error("non-hex character in identifier")]
    NonHex,
}

fn parse_hex_id(raw: &str, digits: usize) -> Result<String, HexIdError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or(HexIdError::MissingPrefix)?;
    if body.len() != digits {
        return Err(HexIdError::Length {
            expected: digits,
            actual: body.len(),
        });
    }
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexIdError::NonHex);
    }
    Ok(format!("0x{}", body.to_ascii_lowercase()))
}

/// A 20-byte Ethereum account or contract address.
///
/// Always stored lowercase so that checksummed and plain spellings of the
/// same wallet compare equal in SQL lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "0x036cbd53842c5426634e7929541ec2318f3dcf7e")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes an address.
    ///
    /// # Errors
    ///
    /// Returns [`HexIdError`] if the input is not `0x` followed by 40 hex digits.
    pub fn parse(raw: &str) -> Result<Self, HexIdError> {
        parse_hex_id(raw, 40).map(Self)
    }

    /// Lowercase `0x`-prefixed representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw 20 address bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated at construction, decode cannot fail.
        let _ = hex::decode_to_slice(self.0.trim_start_matches("0x"), &mut out);
        out
    }

    /// Case-insensitive comparison against an unvalidated string.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct TxHash(String);

impl TxHash {
    /// Parses and normalizes a transaction hash.
    ///
    /// # Errors
    ///
    /// Returns [`HexIdError`] if the input is not `0x` followed by 64 hex digits.
    pub fn parse(raw: &str) -> Result<Self, HexIdError> {
        parse_hex_id(raw, 64).map(Self)
    }

    /// Lowercase `0x`-prefixed representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

    #[test]
    fn address_is_lowercased() {
        let Ok(addr) = WalletAddress::parse(USDC) else {
            panic!("valid address");
        };
        assert_eq!(addr.as_str(), USDC.to_ascii_lowercase());
        assert!(addr.matches(USDC));
    }

    #[test]
    fn address_rejects_bad_input() {
        assert_eq!(
            WalletAddress::parse("036cbd53842c5426634e7929541ec2318f3dcf7e"),
            Err(HexIdError::MissingPrefix)
        );
        assert!(matches!(
            WalletAddress::parse("0x1234"),
            Err(HexIdError::Length { expected: 40, actual: 4 })
        ));
        assert_eq!(
            WalletAddress::parse("0xzz6cbd53842c5426634e7929541ec2318f3dcf7e"),
            Err(HexIdError::NonHex)
        );
    }

    #[test]
    fn address_bytes_round_to_twenty() {
        let Ok(addr) = WalletAddress::parse(USDC) else {
            panic!("valid address");
        };
        let bytes = addr.to_bytes();
        assert_eq!(bytes.first(), Some(&0x03));
        assert_eq!(bytes.last(), Some(&0x7e));
    }

    #[test]
    fn tx_hash_requires_64_digits() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(TxHash::parse(&hash).is_ok());
        assert!(TxHash::parse("0xabc").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<WalletAddress, _> = serde_json::from_str(&format!("\"{USDC}\""));
        assert!(ok.is_ok());
        let bad: Result<WalletAddress, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
