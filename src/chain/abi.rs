//! Minimal ABI helpers for single-word contract views.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

use super::ChainError;

/// First four bytes of `keccak256(signature)`.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    if let Some(head) = hash.get(..4) {
        out.copy_from_slice(head);
    }
    out
}

/// Left-pads a 20-byte address into a 32-byte ABI word.
#[must_use]
pub fn encode_address(address: [u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    if let Some(tail) = word.get_mut(12..) {
        tail.copy_from_slice(&address);
    }
    word
}

/// Builds `0x`-prefixed calldata from a selector and argument words.
#[must_use]
pub fn calldata(selector: [u8; 4], args: &[[u8; 32]]) -> String {
    let mut bytes = Vec::with_capacity(4 + args.len() * 32);
    bytes.extend_from_slice(&selector);
    for word in args {
        bytes.extend_from_slice(word);
    }
    format!("0x{}", hex::encode(bytes))
}

/// Decodes the first return word as a `uint256`.
///
/// # Errors
///
/// Returns [`ChainError::Decode`] for non-hex data or fewer than 32 bytes.
pub fn decode_u256(data: &str) -> Result<U256, ChainError> {
    let body = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(body).map_err(|e| ChainError::Decode(e.to_string()))?;
    let word = bytes
        .get(..32)
        .ok_or_else(|| ChainError::Decode(format!("expected 32 bytes, got {}", bytes.len())))?;
    Ok(U256::from_big_endian(word))
}

/// Renders a base-unit amount with `decimals` places, trimming trailing
/// zeros: `1_500_000` with 6 decimals is `"1.5"`.
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }
    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };
    let split = padded.len() - decimals;
    let (int_part, frac_part) = padded.split_at(split);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}
