//! Protocol-wide constants and defaults for the tbyswap engine.

/// Decimal places of the WAD fixed-point scale.
pub const WAD_DECIMALS: u8 = 18;

/// Largest asset / oracle decimal count the rescaling helpers accept.
pub const MAX_DECIMALS: u8 = 36;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Default maturity period: 180 days.
pub const DEFAULT_MATURITY_SECS: i64 = 180 * SECONDS_PER_DAY;

/// Default batch-continuation window: swap-ins separated by at most this
/// gap from the latest batch's last activity extend that batch.
pub const DEFAULT_BATCH_WINDOW_SECS: i64 = SECONDS_PER_DAY;

/// Default leverage (50x).
pub const DEFAULT_LEVERAGE: u32 = 50;

/// Default spread in basis points (9950 = 0.995, a 50 bps haircut on upside).
pub const DEFAULT_SPREAD_BPS: u32 = 9_950;

/// Default decimals of the stable asset (USDC-style).
pub const DEFAULT_STABLE_DECIMALS: u8 = 6;

/// Default decimals of the RWA token.
pub const DEFAULT_RWA_DECIMALS: u8 = 18;

/// Decimals reported by Chainlink-style USD feeds.
pub const DEFAULT_ORACLE_DECIMALS: u8 = 8;

/// Domain separator for the event journal hash chain.
pub const JOURNAL_DOMAIN: &[u8] = b"tbyswap:journal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "tbyswap";
