//! Redemption of a redeemable batch's stable collateral.
//!
//! Every swap-out credits lenders with the principal it unwound, valued at
//! that swap-out's rate. When a batch turns redeemable its stable
//! collateral is split once:
//!
//! ```text
//!   lender_return   = min(lender_entitlement, asset_amount)
//!   borrower_return = asset_amount - lender_return
//! ```
//!
//! Each side is then paid out pro rata against what is still outstanding
//! on that side, so the last redeemer collects any rounding dust and the
//! total paid never exceeds `asset_amount`.

use tbyswap_types::{
    AccountId, BatchSettlement, MaturityState, Result, Rounding, TbyBatch, TbyError, TbyId, Wad,
    fixed,
};

use crate::journal::PoolEvent;
use crate::pool::PoolState;

/// Fix the lender / borrower split of `batch`. `final_rate` is the rate of
/// the swap-out that emptied it.
pub fn settle(batch: &mut TbyBatch, final_rate: Wad) -> BatchSettlement {
    let asset = batch.collateral.asset_amount;
    let lender_return = batch.lender_entitlement.min(asset);
    let settlement = BatchSettlement {
        final_rate,
        lender_return,
        borrower_return: asset - lender_return,
        lender_redeemed: 0,
        borrower_redeemed: 0,
    };
    batch.settlement = Some(settlement);
    tracing::debug!(
        id = %batch.id,
        final_rate = %final_rate,
        lender_return,
        borrower_return = settlement.borrower_return,
        "Batch settled"
    );
    settlement
}

fn redeemable_settlement(batch: &TbyBatch) -> Result<BatchSettlement> {
    match (batch.maturity_state, batch.settlement) {
        (MaturityState::Redeemable, Some(settlement)) => Ok(settlement),
        _ => Err(TbyError::TbyNotRedeemable(batch.id)),
    }
}

/// Burn `shares` of `holder` in batch `id` and pay their part of the
/// lender return.
///
/// # Errors
/// `ZeroAmount`, `InvalidTby`, `TbyNotRedeemable`, `InsufficientShares`.
pub(crate) fn redeem_lender(
    state: &mut PoolState,
    holder: AccountId,
    id: TbyId,
    shares: u128,
) -> Result<u128> {
    if shares == 0 {
        return Err(TbyError::ZeroAmount);
    }
    let settlement = redeemable_settlement(state.lifecycle.batch(id)?)?;
    let outstanding = state.shares.supply_of(id);
    let remaining = settlement.lender_return - settlement.lender_redeemed;
    state.shares.burn(holder, id, shares)?;
    let payout = fixed::mul_div(shares, remaining, outstanding, Rounding::Down)?;

    if let Some(s) = state.lifecycle.batch_mut(id)?.settlement.as_mut() {
        s.lender_redeemed += payout;
    }
    state.journal.append(PoolEvent::LenderRedeemed {
        holder,
        id,
        shares,
        payout,
    })?;
    tracing::info!(%id, holder = %holder.short(), shares, payout, "Lender redeemed");
    Ok(payout)
}

/// Pay `borrower` their part of the borrower return of batch `id`.
///
/// # Errors
/// `InvalidTby`, `TbyNotRedeemable`, `NothingToRedeem` when the borrower
/// has no principal or their part of the unpaid return is zero. The
/// principal then stays on the batch.
pub(crate) fn redeem_borrower(state: &mut PoolState, borrower: AccountId, id: TbyId) -> Result<u128> {
    let batch = state.lifecycle.batch_mut(id)?;
    let settlement = redeemable_settlement(batch)?;
    let principal = batch
        .borrower_principal
        .get(&borrower)
        .copied()
        .filter(|p| *p > 0)
        .ok_or(TbyError::NothingToRedeem)?;
    let outstanding = batch.total_borrower_principal();
    let remaining = settlement.borrower_return - settlement.borrower_redeemed;
    let payout = fixed::mul_div(principal, remaining, outstanding, Rounding::Down)?;
    if payout == 0 {
        tracing::warn!(
            %id,
            borrower = %borrower.short(),
            principal,
            "Borrower share rounds to zero"
        );
        return Err(TbyError::NothingToRedeem);
    }

    batch.borrower_principal.remove(&borrower);
    if let Some(s) = batch.settlement.as_mut() {
        s.borrower_redeemed += payout;
    }
    state.journal.append(PoolEvent::BorrowerRedeemed {
        borrower,
        id,
        payout,
    })?;
    tracing::info!(%id, borrower = %borrower.short(), payout, "Borrower redeemed");
    Ok(payout)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tbyswap_orders::OrderMatcher;
    use tbyswap_types::WAD;

    use super::*;
    use crate::journal::EventJournal;
    use crate::lifecycle::BatchLifecycleManager;
    use crate::share_ledger::ShareLedger;

    fn emptied_batch(lender_entitlement: u128, asset_amount: u128) -> TbyBatch {
        let mut batch = TbyBatch::dummy(TbyId(0), Wad(110 * WAD), 0, Utc::now());
        batch.lender_principal = 1_000;
        batch.lender_unwound = 1_000;
        batch.lender_entitlement = lender_entitlement;
        batch.collateral.asset_amount = asset_amount;
        batch
    }

    /// Pool state holding one redeemable batch with a single borrower.
    fn redeemable_state(borrower: AccountId, lender_entitlement: u128, asset: u128) -> PoolState {
        let now = Utc::now();
        let mut lifecycle = BatchLifecycleManager::new(Duration::days(1), Duration::days(1));
        let id = lifecycle.open_batch(Wad(110 * WAD), now);
        let batch = lifecycle.batch_mut(id).unwrap();
        *batch = emptied_batch(lender_entitlement, asset);
        batch.borrower_principal.insert(borrower, 20);
        batch.maturity_state = MaturityState::Redeemable;
        settle(batch, Wad::ONE);
        PoolState {
            matcher: OrderMatcher::new(Wad(50 * WAD)),
            lifecycle,
            shares: ShareLedger::new(),
            journal: EventJournal::new(),
        }
    }

    #[test]
    fn settle_pays_lenders_their_entitlement() {
        let mut batch = emptied_batch(1_040, 1_100);
        let s = settle(&mut batch, Wad(1_040_000_000_000_000_000));
        assert_eq!(s.lender_return, 1_040);
        assert_eq!(s.borrower_return, 60);
        assert_eq!(batch.settlement, Some(s));
    }

    #[test]
    fn settle_caps_lender_return() {
        let mut batch = emptied_batch(1_000, 900);
        let s = settle(&mut batch, Wad::ONE);
        assert_eq!(s.lender_return, 900);
        assert_eq!(s.borrower_return, 0);
    }

    #[test]
    fn borrower_with_zero_return_gets_error_and_keeps_principal() {
        let borrower = AccountId::new();
        let mut state = redeemable_state(borrower, 1_000, 900);
        assert_eq!(
            redeem_borrower(&mut state, borrower, TbyId(0)),
            Err(TbyError::NothingToRedeem)
        );
        let batch = state.lifecycle.batch(TbyId(0)).unwrap();
        assert_eq!(batch.borrower_principal[&borrower], 20);
        assert!(state.journal.is_empty());
    }

    #[test]
    fn borrower_with_positive_return_is_paid() {
        let borrower = AccountId::new();
        let mut state = redeemable_state(borrower, 1_040, 1_100);
        assert_eq!(redeem_borrower(&mut state, borrower, TbyId(0)), Ok(60));
        assert!(state.lifecycle.batch(TbyId(0)).unwrap().borrower_principal.is_empty());
        assert_eq!(state.journal.len(), 1);
    }

    #[test]
    fn unsettled_batch_not_redeemable() {
        let batch = emptied_batch(1, 1);
        assert_eq!(
            redeemable_settlement(&batch),
            Err(TbyError::TbyNotRedeemable(TbyId(0)))
        );
    }
}
