//! # tbyswap-oracle
//!
//! **Price oracle gateway**: the only path by which a price enters the engine.
//!
//! - **Zero caching**: every call fetches and validates a fresh round
//! - **Fail-closed**: a non-positive or stale reading is an error, never a default
//! - **Scale-normalising**: validated prices leave as WAD, whatever the feed's decimals
//!
//! ```text
//! PriceFeed.latest_round_data() -> validate() -> rescale to WAD -> caller
//! ```

pub mod feed;
pub mod gateway;

#[cfg(any(test, feature = "test-helpers"))]
pub use feed::MockPriceFeed;
pub use feed::PriceFeed;
pub use gateway::{current_price, validate};
