//! # tbyswap-orders
//!
//! **Matching stage**: lend orders, borrower fills, and the role gate that
//! guards them.
//!
//! ## Architecture
//!
//! 1. **AccessGate**: yes/no whitelist check per (role, account); consumed, not owned
//! 2. **OrderMatcher**: open lend depth per lender, matched (lender + borrower)
//!    collateral waiting for swap-in
//!
//! ## Order Flow
//!
//! ```text
//! lend_order() → open depth ─ fill_order() → matched depth ─ take_matched() → swap-in
//!                    │                             │
//!            kill_open_order()            kill_match_order()
//! ```

pub mod access_gate;
pub mod order_matcher;

pub use access_gate::{AccessGate, Role, Whitelist, require_role};
pub use order_matcher::OrderMatcher;
