//! # TBY batches: the collateral state machine
//!
//! A batch is a cohort of swap-ins sharing one start price and one TBY id.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐ maturity elapses ┌─────────┐  rwa_amount → 0  ┌────────────┐
//!   │ ACTIVE ├─────────────────▶│ MATURED ├─────────────────▶│ REDEEMABLE │
//!   └───┬────┘                  └───┬─────┘                  └────────────┘
//!       │ swap-in                   │ partial swap-out
//!       └──▶ ACTIVE                 └──▶ MATURED
//! ```
//!
//! Transitions are monotonic. Redeemable is terminal for collateral
//! mutation; only redemption happens afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, TbyError, TbyId, Wad, error::Result};

/// Lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaturityState {
    /// Accepting swap-ins while within the batch window; not yet swappable out.
    Active,
    /// Maturity period elapsed. RWA may be swapped back to stable.
    Matured,
    /// All RWA converted to stable. Shares can be redeemed.
    Redeemable,
}

impl MaturityState {
    /// Can the batch move from `self` to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Matured) | (Self::Matured, Self::Redeemable)
        )
    }
}

impl std::fmt::Display for MaturityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Matured => write!(f, "MATURED"),
            Self::Redeemable => write!(f, "REDEEMABLE"),
        }
    }
}

/// Collateral held by a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbyCollateral {
    /// RWA token units still held.
    pub rwa_amount: u128,
    /// Stable units received from swap-outs.
    pub asset_amount: u128,
}

/// Split of a redeemable batch's stable collateral between lenders and
/// borrowers, plus how much of each side has been paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettlement {
    /// Rate the lender side settled at.
    pub final_rate: Wad,
    pub lender_return: u128,
    pub borrower_return: u128,
    pub lender_redeemed: u128,
    pub borrower_redeemed: u128,
}

impl BatchSettlement {
    /// Total stable paid out so far.
    #[must_use]
    pub fn total_redeemed(&self) -> u128 {
        self.lender_redeemed + self.borrower_redeemed
    }
}

/// One TBY batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbyBatch {
    pub id: TbyId,
    /// Validated oracle price (WAD) observed when the batch opened.
    pub start_price: Wad,
    pub start_timestamp: DateTime<Utc>,
    pub last_activity_timestamp: DateTime<Utc>,
    pub collateral: TbyCollateral,
    pub maturity_state: MaturityState,
    /// Sum of lender principal swapped in; equals total shares minted.
    pub lender_principal: u128,
    /// Borrower principal swapped in, per borrower.
    pub borrower_principal: BTreeMap<AccountId, u128>,
    /// Lender principal already unwound by swap-outs.
    pub lender_unwound: u128,
    /// Stable owed to lenders for the principal unwound so far, each slice
    /// valued at the rate of the swap-out that unwound it.
    pub lender_entitlement: u128,
    /// Price the batch settles at once it stops tracking the oracle.
    pub final_price: Option<Wad>,
    /// Present once the batch is redeemable.
    pub settlement: Option<BatchSettlement>,
}

impl TbyBatch {
    /// A fresh, empty batch opened at `start_price`.
    #[must_use]
    pub fn open(id: TbyId, start_price: Wad, now: DateTime<Utc>) -> Self {
        Self {
            id,
            start_price,
            start_timestamp: now,
            last_activity_timestamp: now,
            collateral: TbyCollateral::default(),
            maturity_state: MaturityState::Active,
            lender_principal: 0,
            borrower_principal: BTreeMap::new(),
            lender_unwound: 0,
            lender_entitlement: 0,
            final_price: None,
            settlement: None,
        }
    }

    /// Time elapsed since the batch opened. Never negative.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_timestamp).max(Duration::zero())
    }

    /// Time elapsed since the last swap-in. Never negative.
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity_timestamp).max(Duration::zero())
    }

    #[must_use]
    pub fn total_borrower_principal(&self) -> u128 {
        self.borrower_principal.values().sum()
    }

    #[must_use]
    pub fn is_redeemable(&self) -> bool {
        self.maturity_state == MaturityState::Redeemable
    }

    /// Move to `target`, rejecting any non-monotonic transition.
    ///
    /// # Errors
    /// `TbyNotMatured` when leaving `Active` for anything but `Matured`,
    /// `TbyAlreadyRedeemable` when leaving `Redeemable`, `TbyNotMatured`
    /// otherwise.
    pub fn transition(&mut self, target: MaturityState) -> Result<()> {
        if !self.maturity_state.can_transition_to(target) {
            return Err(match self.maturity_state {
                MaturityState::Redeemable => TbyError::TbyAlreadyRedeemable(self.id),
                MaturityState::Active | MaturityState::Matured => TbyError::TbyNotMatured(self.id),
            });
        }
        self.maturity_state = target;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl TbyBatch {
    /// A batch with `rwa_amount` of collateral opened at `start_price`.
    pub fn dummy(id: TbyId, start_price: Wad, rwa_amount: u128, now: DateTime<Utc>) -> Self {
        let mut batch = Self::open(id, start_price, now);
        batch.collateral.rwa_amount = rwa_amount;
        batch
    }
}
