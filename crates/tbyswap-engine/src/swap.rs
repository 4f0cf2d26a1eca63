//! Collateral swap engine: stable ⇄ RWA at batch boundaries.
//!
//! ## Swap-in
//! ```text
//!   stable (stable decimals) ─▶ WAD ─▶ rwa = ceil(stable * WAD / price) ─▶ RWA decimals (up)
//! ```
//! The caller must be a whitelisted market maker. The stable leg is drawn
//! from the listed lenders' matched orders; the RWA lands in the batch the
//! lifecycle manager resolves for `now`. Lenders receive shares 1:1 with the
//! principal consumed.
//!
//! ## Swap-out
//! ```text
//!   stable_out = rwa * start_price * rate      (WAD math, round down)
//! ```
//! Allowed once the batch has matured. Each swap-out also unwinds the
//! matching slice of lender principal and credits lenders with that slice
//! at the same rate. When its RWA reaches zero the batch turns redeemable,
//! its price is frozen and the lender / borrower split is fixed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tbyswap_oracle::{PriceFeed, current_price};
use tbyswap_orders::{AccessGate, Role, require_role};
use tbyswap_types::{
    AccountId, AssetConfig, MatchedContribution, MaturityState, Result, Rounding,
    SettlementPolicy, TbyError, TbyId, WAD, Wad, constants, fixed,
};

use crate::journal::PoolEvent;
use crate::pool::PoolState;
use crate::rate::RateEngine;
use crate::redemption;

/// Outcome of a swap-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInReceipt {
    pub id: TbyId,
    /// Whether this swap-in opened the batch.
    pub opened: bool,
    pub price: Wad,
    pub stable_amount: u128,
    pub rwa_amount: u128,
    pub contributions: Vec<MatchedContribution>,
}

/// Outcome of a swap-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutReceipt {
    pub id: TbyId,
    pub rwa_amount: u128,
    pub stable_amount: u128,
    pub rate: Wad,
    /// Whether this swap-out emptied the batch.
    pub redeemable: bool,
}

#[derive(Debug, Clone)]
pub struct CollateralSwapEngine {
    stable_decimals: u8,
    rwa_decimals: u8,
    rate: RateEngine,
    policy: SettlementPolicy,
}

impl CollateralSwapEngine {
    #[must_use]
    pub fn new(
        stable: &AssetConfig,
        rwa: &AssetConfig,
        rate: RateEngine,
        policy: SettlementPolicy,
    ) -> Self {
        Self {
            stable_decimals: stable.decimals,
            rwa_decimals: rwa.decimals,
            rate,
            policy,
        }
    }

    #[must_use]
    pub fn rate(&self) -> &RateEngine {
        &self.rate
    }

    #[must_use]
    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// RWA bought by `stable_amount` at `price`, rounded up.
    pub fn quote_rwa(&self, stable_amount: u128, price: Wad) -> Result<u128> {
        let stable_wad = fixed::rescale(
            stable_amount,
            self.stable_decimals,
            constants::WAD_DECIMALS,
            Rounding::Down,
        )?;
        let rwa_wad = fixed::mul_div(stable_wad, WAD, price.raw(), Rounding::Up)?;
        fixed::rescale(rwa_wad, constants::WAD_DECIMALS, self.rwa_decimals, Rounding::Up)
    }

    /// Stable returned for `rwa_amount` of a batch opened at `start_price`
    /// and settling at `rate`, rounded down.
    pub fn quote_stable(&self, rwa_amount: u128, start_price: Wad, rate: Wad) -> Result<u128> {
        let rwa_wad = fixed::rescale(
            rwa_amount,
            self.rwa_decimals,
            constants::WAD_DECIMALS,
            Rounding::Down,
        )?;
        let at_start = Wad(rwa_wad).mul_amount(start_price.raw(), Rounding::Down)?;
        let settled = rate.mul_amount(at_start, Rounding::Down)?;
        fixed::rescale(settled, constants::WAD_DECIMALS, self.stable_decimals, Rounding::Down)
    }

    /// Convert `stable_amount` of the listed lenders' matched collateral
    /// into RWA and record it against the resolved batch.
    ///
    /// # Errors
    /// In check order: `KycFailed`, `ZeroAmount`, feed errors,
    /// `InsufficientDepth`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn swap_in(
        &self,
        state: &mut PoolState,
        feed: &dyn PriceFeed,
        gate: &dyn AccessGate,
        caller: AccountId,
        lenders: &[AccountId],
        stable_amount: u128,
        now: DateTime<Utc>,
    ) -> Result<SwapInReceipt> {
        require_role(gate, Role::MarketMaker, &caller)?;
        if stable_amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let price = current_price(feed)?;
        let contributions = state.matcher.take_matched(lenders, stable_amount)?;
        let rwa_amount = self.quote_rwa(stable_amount, price)?;
        if rwa_amount == 0 {
            return Err(TbyError::ZeroAmount);
        }

        let resolution = state.lifecycle.resolve_batch_id(now);
        let id = if resolution.is_new() {
            let id = state.lifecycle.open_batch(price, now);
            state.journal.append(PoolEvent::BatchOpened {
                id,
                start_price: price,
                at: now,
            })?;
            id
        } else {
            tracing::debug!(id = %resolution.id(), "Continuing batch");
            resolution.id()
        };

        let mut lender_principal: BTreeMap<AccountId, u128> = BTreeMap::new();
        let mut borrower_principal: BTreeMap<AccountId, u128> = BTreeMap::new();
        for c in &contributions {
            *lender_principal.entry(c.lender).or_default() += c.lender_amount;
            *borrower_principal.entry(c.borrower).or_default() += c.borrower_amount;
        }
        borrower_principal.retain(|_, amount| *amount > 0);
        let lender_total: u128 = lender_principal.values().sum();

        state
            .lifecycle
            .record_swap_in(id, rwa_amount, lender_total, &borrower_principal, now)?;
        for (lender, amount) in lender_principal {
            if amount > 0 {
                state.shares.mint(lender, id, amount)?;
            }
        }
        state.journal.append(PoolEvent::SwappedIn {
            id,
            stable_amount,
            rwa_amount,
            at: now,
        })?;

        tracing::info!(
            %id,
            price = %price,
            stable_amount,
            rwa_amount,
            opened = resolution.is_new(),
            "Swapped in"
        );

        Ok(SwapInReceipt {
            id,
            opened: resolution.is_new(),
            price,
            stable_amount,
            rwa_amount,
            contributions,
        })
    }

    /// Convert `rwa_amount` of batch `id` back into stable.
    ///
    /// # Errors
    /// In check order: `KycFailed`, `ZeroAmount`, `InvalidTby`,
    /// `TbyNotMatured`, `TbyAlreadyRedeemable`, `InsufficientCollateral`,
    /// feed errors.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn swap_out(
        &self,
        state: &mut PoolState,
        feed: &dyn PriceFeed,
        gate: &dyn AccessGate,
        caller: AccountId,
        id: TbyId,
        rwa_amount: u128,
        now: DateTime<Utc>,
    ) -> Result<SwapOutReceipt> {
        require_role(gate, Role::MarketMaker, &caller)?;
        if rwa_amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        match state.lifecycle.mark_matured(id, now)? {
            MaturityState::Active => return Err(TbyError::TbyNotMatured(id)),
            MaturityState::Redeemable => return Err(TbyError::TbyAlreadyRedeemable(id)),
            MaturityState::Matured => {}
        }

        let batch = state.lifecycle.batch_mut(id)?;
        let available = batch.collateral.rwa_amount;
        if rwa_amount > available {
            return Err(TbyError::InsufficientCollateral {
                needed: rwa_amount,
                available,
            });
        }

        let price = match batch.final_price {
            Some(frozen) => frozen,
            None => current_price(feed)?,
        };
        if self.policy == SettlementPolicy::FixedAtFirstSwapOut {
            batch.final_price = Some(price);
        }
        let rate = self.rate.rate_at(batch, price, now)?;
        let stable_amount = self.quote_stable(rwa_amount, batch.start_price, rate)?;

        // Lender principal unwound by this slice, pro rata against what is
        // still outstanding, valued at this swap-out's rate.
        let outstanding = batch.lender_principal - batch.lender_unwound;
        let unwound = fixed::mul_div(outstanding, rwa_amount, available, Rounding::Down)?;
        let owed = rate.mul_amount(unwound, Rounding::Down)?;

        batch.collateral.rwa_amount -= rwa_amount;
        batch.collateral.asset_amount = batch
            .collateral
            .asset_amount
            .checked_add(stable_amount)
            .ok_or(TbyError::MathOverflow)?;
        batch.lender_unwound += unwound;
        batch.lender_entitlement = batch
            .lender_entitlement
            .checked_add(owed)
            .ok_or(TbyError::MathOverflow)?;
        let emptied = batch.collateral.rwa_amount == 0;
        if emptied {
            batch.final_price = Some(price);
        }

        state.journal.append(PoolEvent::SwappedOut {
            id,
            rwa_amount,
            stable_amount,
            rate,
            at: now,
        })?;
        tracing::info!(%id, rwa_amount, stable_amount, rate = %rate, "Swapped out");

        if emptied {
            state.lifecycle.mark_redeemable(id)?;
            let settlement = redemption::settle(state.lifecycle.batch_mut(id)?, rate);
            state.journal.append(PoolEvent::BatchRedeemable {
                id,
                lender_return: settlement.lender_return,
                borrower_return: settlement.borrower_return,
            })?;
        }

        Ok(SwapOutReceipt {
            id,
            rwa_amount,
            stable_amount,
            rate,
            redeemable: emptied,
        })
    }
}
