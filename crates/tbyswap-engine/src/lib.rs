//! # tbyswap-engine
//!
//! **Settlement plane** of a TBY pool: batch lifecycle, rate, collateral
//! swaps, share accounting, redemption and the audit journal, tied together
//! behind [`TbyPool`].
//!
//! ## Flow
//!
//! 1. Lenders post lend orders; whitelisted borrowers fill them with
//!    leveraged capital ([`tbyswap_orders::OrderMatcher`])
//! 2. The market maker swaps matched stable into RWA; the lifecycle
//!    manager opens or continues a batch and lenders receive shares
//! 3. Once the batch matures the market maker swaps RWA back at the
//!    batch rate
//! 4. An empty batch is redeemable; lenders and borrowers collect their
//!    split of the stable proceeds
//!
//! Every mutating call is all-or-nothing.

pub mod journal;
pub mod lifecycle;
pub mod pool;
pub mod rate;
pub mod redemption;
pub mod share_ledger;
pub mod swap;

pub use journal::{EventJournal, JournalEntry, PoolEvent};
pub use lifecycle::{BatchLifecycleManager, BatchResolution};
pub use pool::TbyPool;
pub use rate::RateEngine;
pub use share_ledger::ShareLedger;
pub use swap::{CollateralSwapEngine, SwapInReceipt, SwapOutReceipt};
