//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{TokenAmount, TxHash, WalletAddress};
use crate::error::GatewayError;

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20. `limit` is accepted as an alias.
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Builds the metadata for `total` items.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page.max(1)))
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wraps a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

// ── Request field parsing ──────────────────────────────────────────────

/// Parses a wallet field, naming it in the error.
///
/// # Errors
///
/// [`GatewayError::InvalidRequest`] if the value is not an address.
pub fn parse_wallet(field: &str, raw: &str) -> Result<WalletAddress, GatewayError> {
    WalletAddress::parse(raw)
        .map_err(|e| GatewayError::InvalidRequest(format!("{field}: {e}")))
}

/// Parses a transaction hash field.
///
/// # Errors
///
/// [`GatewayError::InvalidRequest`] if the value is not a 32-byte hash.
pub fn parse_tx_hash(field: &str, raw: &str) -> Result<TxHash, GatewayError> {
    TxHash::parse(raw).map_err(|e| GatewayError::InvalidRequest(format!("{field}: {e}")))
}

/// Parses a decimal token amount field.
///
/// # Errors
///
/// [`GatewayError::InvalidRequest`] if the value is not a non-negative decimal.
pub fn parse_amount(field: &str, raw: &str) -> Result<TokenAmount, GatewayError> {
    TokenAmount::parse_decimal(raw)
        .map_err(|e| GatewayError::InvalidRequest(format!("{field}: {e}")))
}

/// Trims an optional text field, treating blank as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_counts_pages() {
        let params = PaginationParams {
            page: 0,
            per_page: 500,
        }
        .clamped();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);

        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 20, 41).total_pages, 3);
    }

    #[test]
    fn limit_is_an_alias_for_per_page() {
        let params: Result<PaginationParams, _> =
            serde_json::from_value(serde_json::json!({"limit": 5}));
        assert!(matches!(params, Ok(ref p) if p.per_page == 5 && p.page == 1));
    }

    #[test]
    fn field_errors_name_the_field() {
        let err = parse_wallet("user_address", "0x12");
        assert!(matches!(
            err,
            Err(GatewayError::InvalidRequest(ref m)) if m.starts_with("user_address")
        ));
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" a ".to_string())).as_deref(), Some("a"));
    }
}
