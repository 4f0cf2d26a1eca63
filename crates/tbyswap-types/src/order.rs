//! Order types for the lend / fill matching stage.
//!
//! A lender's [`LendOrder`] is open depth waiting for a borrower. A fill
//! moves part of it into a [`MatchedOrder`], which pairs the lender's
//! principal with the borrower's leveraged contribution. Matched orders are
//! what swap-in consumes.

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Open (unmatched) lend depth for one lender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendOrder {
    pub lender: AccountId,
    /// Total stable amount ever lent into this order.
    pub amount: u128,
    /// Stable amount not yet matched by a borrower.
    pub remaining: u128,
}

impl LendOrder {
    #[must_use]
    pub fn new(lender: AccountId, amount: u128) -> Self {
        Self {
            lender,
            amount,
            remaining: amount,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn matched(&self) -> u128 {
        self.amount - self.remaining
    }
}

/// Lender principal paired with a borrower's leveraged contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedOrder {
    pub borrower: AccountId,
    pub lender_amount: u128,
    pub borrower_amount: u128,
}

impl MatchedOrder {
    /// Stable collateral this match contributes to a swap-in.
    #[must_use]
    pub fn total(&self) -> u128 {
        self.lender_amount + self.borrower_amount
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lender_amount == 0 && self.borrower_amount == 0
    }
}

/// Result of a borrower fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowFill {
    pub lender: AccountId,
    pub borrower: AccountId,
    /// Lender principal matched by this fill.
    pub filled: u128,
    /// Stable amount pulled from the borrower (`filled / leverage`, rounded up).
    pub borrow_amount: u128,
}

/// A slice of matched collateral consumed by one swap-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedContribution {
    pub lender: AccountId,
    pub borrower: AccountId,
    pub lender_amount: u128,
    pub borrower_amount: u128,
}

impl MatchedContribution {
    #[must_use]
    pub fn total(&self) -> u128 {
        self.lender_amount + self.borrower_amount
    }
}

/// Funds released when a matched order is unwound before swap-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRefund {
    pub lender: AccountId,
    pub borrower: AccountId,
    pub lender_refund: u128,
    pub borrower_refund: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lend_order_tracks_matched_amount() {
        let mut order = LendOrder::new(AccountId::new(), 1_000);
        assert_eq!(order.matched(), 0);
        order.remaining = 400;
        assert_eq!(order.matched(), 600);
        assert!(!order.is_exhausted());
        order.remaining = 0;
        assert!(order.is_exhausted());
    }

    #[test]
    fn matched_order_total() {
        let m = MatchedOrder {
            borrower: AccountId::new(),
            lender_amount: 100,
            borrower_amount: 2,
        };
        assert_eq!(m.total(), 102);
        assert!(!m.is_empty());
    }
}
