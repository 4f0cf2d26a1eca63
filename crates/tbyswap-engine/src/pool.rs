//! `TbyPool`: the single entry point a host drives.
//!
//! ## Transaction boundary
//!
//! Every mutating call clones [`PoolState`], runs against the clone and
//! swaps it in only on `Ok`. A failed call leaves the pool exactly as it
//! was. `&mut self` makes each call exclusive; hosts that share a pool
//! across threads wrap it in their own lock.
//!
//! ## Roles
//!
//! | call | who |
//! |---|---|
//! | `set_price_feed`, `whitelist_*` | owner |
//! | `lend_order`, `kill_*_order` | any lender |
//! | `fill_order`, `redeem_borrower` | whitelisted borrower / any borrower with principal |
//! | `swap_in`, `swap_out` | whitelisted market maker |
//! | `redeem_lender` | any share holder |

use chrono::{DateTime, Utc};
use tbyswap_oracle::{PriceFeed, current_price};
use tbyswap_orders::{AccessGate, OrderMatcher, Role};
use tbyswap_types::{
    AccountId, BorrowFill, LendOrder, MatchRefund, PoolConfig, Result, TbyBatch, TbyCollateral,
    TbyError, TbyId, Wad,
};

use crate::journal::{EventJournal, JournalEntry, PoolEvent};
use crate::lifecycle::BatchLifecycleManager;
use crate::rate::RateEngine;
use crate::redemption;
use crate::share_ledger::ShareLedger;
use crate::swap::{CollateralSwapEngine, SwapInReceipt, SwapOutReceipt};

/// Everything a pool call may mutate.
#[derive(Debug, Clone)]
pub(crate) struct PoolState {
    pub(crate) matcher: OrderMatcher,
    pub(crate) lifecycle: BatchLifecycleManager,
    pub(crate) shares: ShareLedger,
    pub(crate) journal: EventJournal,
}

/// A collateral-swap pool for one stable / RWA pair.
pub struct TbyPool {
    config: PoolConfig,
    owner: AccountId,
    feed: Box<dyn PriceFeed>,
    gate: Box<dyn AccessGate>,
    swap: CollateralSwapEngine,
    state: PoolState,
}

impl TbyPool {
    /// Build a pool.
    ///
    /// # Errors
    /// `Configuration` for invalid parameters, feed errors if `feed` does
    /// not currently yield a valid price.
    pub fn new(
        config: PoolConfig,
        owner: AccountId,
        feed: Box<dyn PriceFeed>,
        gate: Box<dyn AccessGate>,
    ) -> Result<Self> {
        config.validate()?;
        let leverage = config.leverage_wad()?;
        let spread = config.spread_wad()?;
        let price = current_price(feed.as_ref())?;

        let swap = CollateralSwapEngine::new(
            &config.stable_asset,
            &config.rwa_asset,
            RateEngine::new(spread),
            config.settlement_policy,
        );
        let state = PoolState {
            matcher: OrderMatcher::new(leverage),
            lifecycle: BatchLifecycleManager::new(config.maturity()?, config.batch_window()?),
            shares: ShareLedger::new(),
            journal: EventJournal::new(),
        };

        tracing::info!(
            stable = %config.stable_asset.symbol,
            rwa = %config.rwa_asset.symbol,
            leverage = %config.leverage,
            spread = %config.spread,
            price = %price,
            owner = %owner.short(),
            "Pool created"
        );

        Ok(Self {
            config,
            owner,
            feed,
            gate,
            swap,
            state,
        })
    }

    /// Run `op` against a staged copy of the state; commit only on success.
    fn commit<T>(state: &mut PoolState, op: impl FnOnce(&mut PoolState) -> Result<T>) -> Result<T> {
        let mut staged = state.clone();
        let out = op(&mut staged)?;
        *state = staged;
        Ok(out)
    }

    fn require_owner(&self, caller: &AccountId) -> Result<()> {
        if *caller == self.owner {
            Ok(())
        } else {
            tracing::warn!(caller = %caller.short(), "Owner-only call rejected");
            Err(TbyError::Unauthorized)
        }
    }

    // -----------------------------------------------------------------
    // Owner operations
    // -----------------------------------------------------------------

    /// Replace the price feed. The new feed must yield a valid price now.
    pub fn set_price_feed(&mut self, caller: AccountId, feed: Box<dyn PriceFeed>) -> Result<()> {
        self.require_owner(&caller)?;
        let price = current_price(feed.as_ref())?;
        let round_id = feed.latest_round_data().round_id;
        let decimals = feed.decimals();
        Self::commit(&mut self.state, |s| {
            s.journal
                .append(PoolEvent::PriceFeedSet { decimals, round_id })
                .map(|_| ())
        })?;
        self.feed = feed;
        tracing::info!(decimals, round_id, price = %price, "Price feed set");
        Ok(())
    }

    pub fn whitelist_borrower(
        &mut self,
        caller: AccountId,
        account: AccountId,
        allowed: bool,
    ) -> Result<()> {
        self.set_role(caller, Role::Borrower, account, allowed)
    }

    pub fn whitelist_market_maker(
        &mut self,
        caller: AccountId,
        account: AccountId,
        allowed: bool,
    ) -> Result<()> {
        self.set_role(caller, Role::MarketMaker, account, allowed)
    }

    fn set_role(&mut self, caller: AccountId, role: Role, account: AccountId, allowed: bool) -> Result<()> {
        self.require_owner(&caller)?;
        Self::commit(&mut self.state, |s| {
            s.journal
                .append(PoolEvent::WhitelistUpdated {
                    role,
                    account,
                    allowed,
                })
                .map(|_| ())
        })?;
        self.gate.set_whitelisted(role, account, allowed);
        tracing::info!(%role, account = %account.short(), allowed, "Whitelist updated");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Order operations
    // -----------------------------------------------------------------

    /// Open or increase `lender`'s lend order.
    pub fn lend_order(&mut self, lender: AccountId, amount: u128) -> Result<LendOrder> {
        Self::commit(&mut self.state, |s| {
            let order = s.matcher.lend_order(lender, amount)?.clone();
            s.journal.append(PoolEvent::OrderCreated { lender, amount })?;
            Ok(order)
        })
    }

    /// Match `amount` of `lender`'s open order with `borrower`'s capital.
    pub fn fill_order(
        &mut self,
        borrower: AccountId,
        lender: AccountId,
        amount: u128,
    ) -> Result<BorrowFill> {
        let gate = self.gate.as_ref();
        Self::commit(&mut self.state, |s| {
            let fill = s.matcher.fill_order(gate, borrower, lender, amount)?;
            s.journal.append(PoolEvent::OrderFilled {
                lender,
                borrower,
                filled: fill.filled,
                borrow_amount: fill.borrow_amount,
            })?;
            Ok(fill)
        })
    }

    pub fn kill_open_order(&mut self, lender: AccountId, amount: u128) -> Result<u128> {
        Self::commit(&mut self.state, |s| {
            let killed = s.matcher.kill_open_order(lender, amount)?;
            s.journal.append(PoolEvent::OpenOrderKilled { lender, amount })?;
            Ok(killed)
        })
    }

    pub fn kill_match_order(&mut self, lender: AccountId, amount: u128) -> Result<Vec<MatchRefund>> {
        Self::commit(&mut self.state, |s| {
            let refunds = s.matcher.kill_match_order(lender, amount)?;
            s.journal.append(PoolEvent::MatchOrderKilled {
                lender,
                refunds: refunds.clone(),
            })?;
            Ok(refunds)
        })
    }

    // -----------------------------------------------------------------
    // Swaps and redemption
    // -----------------------------------------------------------------

    pub fn swap_in(
        &mut self,
        caller: AccountId,
        lenders: &[AccountId],
        stable_amount: u128,
        now: DateTime<Utc>,
    ) -> Result<SwapInReceipt> {
        let (swap, feed, gate) = (&self.swap, self.feed.as_ref(), self.gate.as_ref());
        Self::commit(&mut self.state, |s| {
            swap.swap_in(s, feed, gate, caller, lenders, stable_amount, now)
        })
    }

    pub fn swap_out(
        &mut self,
        caller: AccountId,
        id: TbyId,
        rwa_amount: u128,
        now: DateTime<Utc>,
    ) -> Result<SwapOutReceipt> {
        let (swap, feed, gate) = (&self.swap, self.feed.as_ref(), self.gate.as_ref());
        Self::commit(&mut self.state, |s| {
            swap.swap_out(s, feed, gate, caller, id, rwa_amount, now)
        })
    }

    pub fn redeem_lender(&mut self, holder: AccountId, id: TbyId, shares: u128) -> Result<u128> {
        Self::commit(&mut self.state, |s| {
            redemption::redeem_lender(s, holder, id, shares)
        })
    }

    pub fn redeem_borrower(&mut self, borrower: AccountId, id: TbyId) -> Result<u128> {
        Self::commit(&mut self.state, |s| {
            redemption::redeem_borrower(s, borrower, id)
        })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Rate of batch `id` at `now`.
    pub fn get_rate(&self, id: TbyId, now: DateTime<Utc>) -> Result<Wad> {
        let batch = self.state.lifecycle.batch(id)?;
        self.swap.rate().get_rate(batch, self.feed.as_ref(), now)
    }

    pub fn tby_collateral(&self, id: TbyId) -> Result<TbyCollateral> {
        Ok(self.state.lifecycle.batch(id)?.collateral)
    }

    pub fn is_tby_redeemable(&self, id: TbyId) -> Result<bool> {
        Ok(self.state.lifecycle.batch(id)?.is_redeemable())
    }

    #[must_use]
    pub fn last_minted_id(&self) -> Option<TbyId> {
        self.state.lifecycle.last_minted_id()
    }

    #[must_use]
    pub fn share_balance(&self, holder: &AccountId, id: TbyId) -> u128 {
        self.state.shares.balance_of(holder, id)
    }

    #[must_use]
    pub fn share_supply(&self, id: TbyId) -> u128 {
        self.state.shares.supply_of(id)
    }

    pub fn batch(&self, id: TbyId) -> Result<&TbyBatch> {
        self.state.lifecycle.batch(id)
    }

    #[must_use]
    pub fn open_order(&self, lender: &AccountId) -> Option<&LendOrder> {
        self.state.matcher.open_order(lender)
    }

    #[must_use]
    pub fn matched_amount(&self, lender: &AccountId) -> u128 {
        self.state.matcher.matched_amount(lender)
    }

    #[must_use]
    pub fn open_depth(&self) -> u128 {
        self.state.matcher.open_depth()
    }

    #[must_use]
    pub fn matched_depth(&self) -> u128 {
        self.state.matcher.matched_depth()
    }

    #[must_use]
    pub fn is_whitelisted(&self, role: Role, account: &AccountId) -> bool {
        self.gate.is_whitelisted(role, account)
    }

    #[must_use]
    pub fn events(&self) -> &[JournalEntry] {
        self.state.journal.entries()
    }

    #[must_use]
    pub fn journal_digest(&self) -> String {
        self.state.journal.digest()
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.owner
    }
}

impl std::fmt::Debug for TbyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TbyPool")
            .field("config", &self.config)
            .field("owner", &self.owner)
            .field("last_minted_id", &self.last_minted_id())
            .field("events", &self.state.journal.len())
            .finish_non_exhaustive()
    }
}
