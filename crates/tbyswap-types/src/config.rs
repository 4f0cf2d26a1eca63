//! Configuration types for a tbyswap pool.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{TbyError, Wad, constants, error::Result};

/// An asset the pool handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Ticker (e.g., "USDC", "ib01").
    pub symbol: String,
    /// Token decimals.
    pub decimals: u8,
}

impl AssetConfig {
    #[must_use]
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Which price a swap-out settles at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// Every swap-out re-reads the oracle.
    #[default]
    LiveOracle,
    /// The first swap-out after maturity freezes the price; later partial
    /// swap-outs of the same batch reuse it.
    FixedAtFirstSwapOut,
}

/// Static parameters of one pool. Fixed for the pool's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Stable asset lenders and borrowers deposit.
    pub stable_asset: AssetConfig,
    /// RWA token the market maker swaps into.
    pub rwa_asset: AssetConfig,
    /// Lender capital per unit of borrower capital (e.g., "50").
    pub leverage: Decimal,
    /// Share of price appreciation passed to the batch (e.g., "0.995").
    pub spread: Decimal,
    /// Seconds after a batch opens before it may be swapped out.
    pub maturity_secs: i64,
    /// Maximum idle gap, in seconds, for a swap-in to extend the latest batch.
    pub batch_window_secs: i64,
    #[serde(default)]
    pub settlement_policy: SettlementPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            stable_asset: AssetConfig::new("USDC", constants::DEFAULT_STABLE_DECIMALS),
            rwa_asset: AssetConfig::new("ib01", constants::DEFAULT_RWA_DECIMALS),
            leverage: Decimal::from(constants::DEFAULT_LEVERAGE),
            spread: Decimal::new(i64::from(constants::DEFAULT_SPREAD_BPS), 4),
            maturity_secs: constants::DEFAULT_MATURITY_SECS,
            batch_window_secs: constants::DEFAULT_BATCH_WINDOW_SECS,
            settlement_policy: SettlementPolicy::LiveOracle,
        }
    }
}

impl PoolConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters the engine cannot operate with.
    ///
    /// # Errors
    /// Returns [`TbyError::Configuration`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.spread <= Decimal::ZERO || self.spread > Decimal::ONE {
            return Err(TbyError::Configuration(format!(
                "spread must be in (0, 1], got {}",
                self.spread
            )));
        }
        if self.leverage < Decimal::ONE {
            return Err(TbyError::Configuration(format!(
                "leverage must be at least 1, got {}",
                self.leverage
            )));
        }
        if self.maturity_secs <= 0 {
            return Err(TbyError::Configuration(
                "maturity period must be positive".to_string(),
            ));
        }
        if self.batch_window_secs <= 0 {
            return Err(TbyError::Configuration(
                "batch window must be positive".to_string(),
            ));
        }
        self.maturity()?;
        self.batch_window()?;
        for asset in [&self.stable_asset, &self.rwa_asset] {
            if asset.decimals > constants::MAX_DECIMALS {
                return Err(TbyError::Configuration(format!(
                    "{} decimals {} exceed {}",
                    asset.symbol,
                    asset.decimals,
                    constants::MAX_DECIMALS
                )));
            }
        }
        Ok(())
    }

    pub fn leverage_wad(&self) -> Result<Wad> {
        Wad::from_decimal(self.leverage)
    }

    pub fn spread_wad(&self) -> Result<Wad> {
        Wad::from_decimal(self.spread)
    }

    /// Maturity period as a [`Duration`].
    ///
    /// # Errors
    /// `Configuration` if the seconds do not fit a `Duration`.
    pub fn maturity(&self) -> Result<Duration> {
        seconds("maturity period", self.maturity_secs)
    }

    /// Batch window as a [`Duration`].
    ///
    /// # Errors
    /// `Configuration` if the seconds do not fit a `Duration`.
    pub fn batch_window(&self) -> Result<Duration> {
        seconds("batch window", self.batch_window_secs)
    }
}

fn seconds(what: &str, secs: i64) -> Result<Duration> {
    Duration::try_seconds(secs)
        .ok_or_else(|| TbyError::Configuration(format!("{what} of {secs}s is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WAD;

    #[test]
    fn default_config_is_valid() {
        let cfg = PoolConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.leverage_wad().unwrap(), Wad(50 * WAD));
        assert_eq!(cfg.spread_wad().unwrap(), Wad(995_000_000_000_000_000));
        assert_eq!(cfg.maturity().unwrap(), Duration::days(180));
        assert_eq!(cfg.batch_window().unwrap(), Duration::days(1));
        assert_eq!(cfg.settlement_policy, SettlementPolicy::LiveOracle);
    }

    #[test]
    fn spread_above_one_rejected() {
        let cfg = PoolConfig {
            spread: Decimal::new(1001, 3),
            ..PoolConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TbyError::Configuration(_))));
    }

    #[test]
    fn zero_spread_rejected() {
        let cfg = PoolConfig {
            spread: Decimal::ZERO,
            ..PoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fractional_leverage_rejected() {
        let cfg = PoolConfig {
            leverage: Decimal::new(5, 1),
            ..PoolConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TbyError::Configuration(_))));
    }

    #[test]
    fn non_positive_durations_rejected() {
        let cfg = PoolConfig {
            batch_window_secs: 0,
            ..PoolConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = PoolConfig {
            maturity_secs: -1,
            ..PoolConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_durations_rejected() {
        let json = r#"{
            "stable_asset": { "symbol": "USDC", "decimals": 6 },
            "rwa_asset": { "symbol": "ib01", "decimals": 18 },
            "leverage": "50",
            "spread": "0.995",
            "maturity_secs": 9223372036854775807,
            "batch_window_secs": 86400
        }"#;
        let err = PoolConfig::from_json(json).unwrap_err();
        assert!(matches!(err, TbyError::Configuration(_)), "Got: {err}");

        let cfg = PoolConfig {
            batch_window_secs: i64::MAX,
            ..PoolConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TbyError::Configuration(_))));
        assert!(cfg.batch_window().is_err());
    }

    #[test]
    fn from_json_parses_decimal_strings() {
        let json = r#"{
            "stable_asset": { "symbol": "USDC", "decimals": 6 },
            "rwa_asset": { "symbol": "ib01", "decimals": 18 },
            "leverage": "50",
            "spread": "0.995",
            "maturity_secs": 15552000,
            "batch_window_secs": 86400
        }"#;
        let cfg = PoolConfig::from_json(json).unwrap();
        assert_eq!(cfg, PoolConfig::default());
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = PoolConfig::from_json("{").unwrap_err();
        assert!(matches!(err, TbyError::Serialization(_)));
    }

    #[test]
    fn settlement_policy_serde() {
        let json = serde_json::to_string(&SettlementPolicy::FixedAtFirstSwapOut).unwrap();
        assert_eq!(json, "\"fixed_at_first_swap_out\"");
    }
}
