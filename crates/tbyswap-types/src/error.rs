//! Error types for the tbyswap engine.
//!
//! All errors use the `TBY_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Oracle errors
//! - 2xx: Order errors
//! - 3xx: Batch errors
//! - 4xx: Swap / redemption errors
//! - 8xx: Access errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::TbyId;

/// Central error enum for all tbyswap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TbyError {
    // =================================================================
    // Oracle Errors (1xx)
    // =================================================================
    /// The feed reported a non-positive price.
    #[error("TBY_ERR_100: Invalid price feed: price must be positive")]
    InvalidPriceFeed,

    /// The feed reading is stale: never updated, or carried over from a
    /// prior round.
    #[error("TBY_ERR_101: Price feed out of date")]
    OutOfDate,

    // =================================================================
    // Order Errors (2xx)
    // =================================================================
    /// An amount parameter was zero where a positive amount is required.
    #[error("TBY_ERR_200: Amount must be greater than zero")]
    ZeroAmount,

    /// Not enough open or matched depth for the requested amount.
    #[error("TBY_ERR_201: Insufficient depth: need {needed}, have {available}")]
    InsufficientDepth { needed: u128, available: u128 },

    // =================================================================
    // Batch Errors (3xx)
    // =================================================================
    /// No batch was ever opened under this id.
    #[error("TBY_ERR_300: Invalid TBY id: {0}")]
    InvalidTby(TbyId),

    /// The batch has not reached its maturity period yet.
    #[error("TBY_ERR_301: TBY {0} has not matured")]
    TbyNotMatured(TbyId),

    /// The batch still holds RWA collateral.
    #[error("TBY_ERR_302: TBY {0} is not redeemable")]
    TbyNotRedeemable(TbyId),

    /// The batch is already fully unwound; collateral is frozen.
    #[error("TBY_ERR_303: TBY {0} is already redeemable")]
    TbyAlreadyRedeemable(TbyId),

    /// The batch has matured and accepts no further swap-ins.
    #[error("TBY_ERR_304: TBY {0} has matured")]
    TbyMatured(TbyId),

    // =================================================================
    // Swap / Redemption Errors (4xx)
    // =================================================================
    /// Swap-out requested more RWA than the batch holds.
    #[error("TBY_ERR_400: Insufficient collateral: need {needed}, have {available}")]
    InsufficientCollateral { needed: u128, available: u128 },

    /// Lender redemption requested more shares than the holder owns.
    #[error("TBY_ERR_401: Insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: u128, available: u128 },

    /// The borrower has no principal left in the batch.
    #[error("TBY_ERR_402: Nothing to redeem")]
    NothingToRedeem,

    // =================================================================
    // Access Errors (8xx)
    // =================================================================
    /// The caller lacks the whitelist role the operation requires.
    #[error("TBY_ERR_800: KYC check failed")]
    KycFailed,

    /// An owner-only operation was invoked by someone else.
    #[error("TBY_ERR_801: Caller is not the owner")]
    Unauthorized,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Fixed-point overflow or division by zero.
    #[error("TBY_ERR_900: Math overflow")]
    MathOverflow,

    /// Configuration error (invalid parameters, bad decimal strings, etc.).
    #[error("TBY_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("TBY_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TbyError>;

impl From<serde_json::Error> for TbyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = TbyError::InvalidTby(TbyId(7));
        let msg = format!("{err}");
        assert!(msg.starts_with("TBY_ERR_300"), "Got: {msg}");
        assert!(msg.contains("tby:7"));
    }

    #[test]
    fn insufficient_depth_display() {
        let err = TbyError::InsufficientDepth {
            needed: 100,
            available: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TBY_ERR_201"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_tby_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(TbyError::InvalidPriceFeed),
            Box::new(TbyError::OutOfDate),
            Box::new(TbyError::ZeroAmount),
            Box::new(TbyError::TbyNotMatured(TbyId(0))),
            Box::new(TbyError::TbyMatured(TbyId(0))),
            Box::new(TbyError::KycFailed),
            Box::new(TbyError::Unauthorized),
            Box::new(TbyError::Configuration("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TBY_ERR_"),
                "Error missing TBY_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn serde_json_error_converts() {
        let err: TbyError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TbyError::Serialization(_)));
    }
}
