//! # tbyswap-types
//!
//! Shared types, errors, and configuration for the **tbyswap** engine.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`TbyId`]
//! - **Fixed-point math**: [`Wad`], [`Rounding`], [`fixed::mul_div`], [`fixed::rescale`]
//! - **Oracle model**: [`PriceSnapshot`]
//! - **Order model**: [`LendOrder`], [`MatchedOrder`], [`BorrowFill`], [`MatchedContribution`], [`MatchRefund`]
//! - **Batch model**: [`TbyBatch`], [`TbyCollateral`], [`MaturityState`], [`BatchSettlement`]
//! - **Configuration**: [`PoolConfig`], [`AssetConfig`], [`SettlementPolicy`]
//! - **Errors**: [`TbyError`] with `TBY_ERR_` prefix codes
//! - **Constants**: protocol defaults

pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod fixed;
pub mod ids;
pub mod order;
pub mod price;

// Re-export all primary types at crate root for ergonomic imports:
//   use tbyswap_types::{TbyId, TbyBatch, Wad, TbyError, ...};

pub use batch::*;
pub use config::*;
pub use error::*;
pub use fixed::{Rounding, WAD, Wad};
pub use ids::*;
pub use order::*;
pub use price::*;

// Constants are accessed via `tbyswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
