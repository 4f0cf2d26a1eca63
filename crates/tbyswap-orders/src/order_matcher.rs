//! Order matcher: lend depth, borrower fills and matched collateral.
//!
//! Tracks per-lender open orders and the matched (lender + borrower) stable
//! collateral that swap-in draws on. Every mutation validates first and
//! only then writes, so a failed call leaves the matcher unchanged.

use std::collections::{HashMap, HashSet, VecDeque};

use tbyswap_types::{
    AccountId, BorrowFill, LendOrder, MatchRefund, MatchedContribution, MatchedOrder, Result,
    Rounding, TbyError, Wad, fixed,
};

use crate::access_gate::{AccessGate, Role, require_role};

/// Owns every lend order and every matched order of one pool.
#[derive(Debug, Clone)]
pub struct OrderMatcher {
    /// Lender capital per unit of borrower capital. Fixed at construction.
    leverage: Wad,
    /// Open (unmatched) depth per lender.
    open_orders: HashMap<AccountId, LendOrder>,
    /// Matched orders per lender, oldest first.
    matched: HashMap<AccountId, VecDeque<MatchedOrder>>,
    /// Sum of all open `remaining`.
    open_depth: u128,
    /// Sum of lender principal across all matched orders.
    matched_depth: u128,
}

impl OrderMatcher {
    /// Create an empty matcher with a fixed leverage.
    #[must_use]
    pub fn new(leverage: Wad) -> Self {
        Self {
            leverage,
            open_orders: HashMap::new(),
            matched: HashMap::new(),
            open_depth: 0,
            matched_depth: 0,
        }
    }

    /// Create or increase the lender's open order.
    ///
    /// # Errors
    /// `ZeroAmount` if `amount` is zero.
    pub fn lend_order(&mut self, lender: AccountId, amount: u128) -> Result<&LendOrder> {
        if amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let open_depth = self
            .open_depth
            .checked_add(amount)
            .ok_or(TbyError::MathOverflow)?;
        let order = self
            .open_orders
            .entry(lender)
            .or_insert_with(|| LendOrder::new(lender, 0));
        order.amount = order
            .amount
            .checked_add(amount)
            .ok_or(TbyError::MathOverflow)?;
        order.remaining += amount;
        self.open_depth = open_depth;
        Ok(order)
    }

    /// Match `amount` of `lender`'s open order with capital from `borrower`.
    ///
    /// The borrower contributes `amount / leverage`, rounded up.
    ///
    /// # Errors
    /// - `KycFailed` if `borrower` is not a whitelisted borrower
    /// - `ZeroAmount` if `amount` is zero
    /// - `InsufficientDepth` if the lender has no order or less than `amount` open
    pub fn fill_order(
        &mut self,
        gate: &dyn AccessGate,
        borrower: AccountId,
        lender: AccountId,
        amount: u128,
    ) -> Result<BorrowFill> {
        require_role(gate, Role::Borrower, &borrower)?;
        if amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let available = self.open_orders.get(&lender).map_or(0, |o| o.remaining);
        if available < amount {
            return Err(TbyError::InsufficientDepth {
                needed: amount,
                available,
            });
        }
        let borrow_amount = self.leverage.div_amount(amount, Rounding::Up)?;

        if let Some(order) = self.open_orders.get_mut(&lender) {
            order.remaining -= amount;
            if order.is_exhausted() {
                self.open_orders.remove(&lender);
            }
        }
        self.open_depth -= amount;
        self.matched_depth += amount;
        self.matched.entry(lender).or_default().push_back(MatchedOrder {
            borrower,
            lender_amount: amount,
            borrower_amount: borrow_amount,
        });

        tracing::debug!(
            lender = %lender.short(),
            borrower = %borrower.short(),
            filled = amount,
            borrow_amount,
            "Order filled"
        );

        Ok(BorrowFill {
            lender,
            borrower,
            filled: amount,
            borrow_amount,
        })
    }

    /// Cancel `amount` of the lender's open (unmatched) depth.
    ///
    /// # Errors
    /// `ZeroAmount`, or `InsufficientDepth` if less than `amount` is open.
    pub fn kill_open_order(&mut self, lender: AccountId, amount: u128) -> Result<u128> {
        if amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let available = self.open_orders.get(&lender).map_or(0, |o| o.remaining);
        if available < amount {
            return Err(TbyError::InsufficientDepth {
                needed: amount,
                available,
            });
        }
        if let Some(order) = self.open_orders.get_mut(&lender) {
            order.remaining -= amount;
            order.amount -= amount;
            if order.is_exhausted() {
                self.open_orders.remove(&lender);
            }
        }
        self.open_depth -= amount;
        Ok(amount)
    }

    /// Unwind `amount` of the lender's matched principal, newest match
    /// first, releasing the borrowers' share pro rata (rounded up).
    ///
    /// # Errors
    /// `ZeroAmount`, or `InsufficientDepth` if less than `amount` is matched.
    pub fn kill_match_order(&mut self, lender: AccountId, amount: u128) -> Result<Vec<MatchRefund>> {
        if amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let available = self.matched_amount(&lender);
        if available < amount {
            return Err(TbyError::InsufficientDepth {
                needed: amount,
                available,
            });
        }

        // Compute every refund before touching state.
        let mut refunds = Vec::new();
        let mut remaining = amount;
        if let Some(queue) = self.matched.get(&lender) {
            for m in queue.iter().rev() {
                if remaining == 0 {
                    break;
                }
                let (lender_refund, borrower_refund) = if remaining >= m.lender_amount {
                    (m.lender_amount, m.borrower_amount)
                } else {
                    let share =
                        fixed::mul_div(remaining, m.borrower_amount, m.lender_amount, Rounding::Up)?;
                    (remaining, share.min(m.borrower_amount))
                };
                remaining -= lender_refund;
                refunds.push(MatchRefund {
                    lender,
                    borrower: m.borrower,
                    lender_refund,
                    borrower_refund,
                });
            }
        }

        if let Some(queue) = self.matched.get_mut(&lender) {
            for refund in &refunds {
                if let Some(last) = queue.back_mut() {
                    last.lender_amount -= refund.lender_refund;
                    last.borrower_amount -= refund.borrower_refund;
                    if last.lender_amount == 0 {
                        queue.pop_back();
                    }
                }
            }
            if queue.is_empty() {
                self.matched.remove(&lender);
            }
        }
        self.matched_depth -= amount;
        Ok(refunds)
    }

    /// Consume exactly `stable_amount` of matched collateral from `lenders`,
    /// in the order given, oldest match first.
    ///
    /// Each match contributes its lender and borrower amounts together. A
    /// partially consumed match splits pro rata, lender side rounded down.
    /// Repeated lenders are counted once.
    ///
    /// # Errors
    /// `ZeroAmount`, or `InsufficientDepth` if the listed lenders' matched
    /// pool is empty or smaller than `stable_amount`.
    pub fn take_matched(
        &mut self,
        lenders: &[AccountId],
        stable_amount: u128,
    ) -> Result<Vec<MatchedContribution>> {
        if stable_amount == 0 {
            return Err(TbyError::ZeroAmount);
        }
        let mut seen = HashSet::new();
        let unique: Vec<AccountId> = lenders.iter().copied().filter(|l| seen.insert(*l)).collect();

        let available: u128 = unique.iter().map(|l| self.matched_total(l)).sum();
        if available < stable_amount {
            return Err(TbyError::InsufficientDepth {
                needed: stable_amount,
                available,
            });
        }

        let mut contributions = Vec::new();
        let mut remaining = stable_amount;
        for lender in unique {
            if remaining == 0 {
                break;
            }
            let Some(queue) = self.matched.get_mut(&lender) else {
                continue;
            };
            while remaining > 0 {
                let Some(front) = queue.front_mut() else {
                    break;
                };
                let total = front.total();
                let (lender_part, borrower_part) = if remaining >= total {
                    (front.lender_amount, front.borrower_amount)
                } else {
                    let lender_part =
                        fixed::mul_div(remaining, front.lender_amount, total, Rounding::Down)?;
                    (lender_part, remaining - lender_part)
                };
                front.lender_amount -= lender_part;
                front.borrower_amount -= borrower_part;
                let borrower = front.borrower;
                if front.is_empty() {
                    queue.pop_front();
                }
                remaining -= lender_part + borrower_part;
                self.matched_depth -= lender_part;
                contributions.push(MatchedContribution {
                    lender,
                    borrower,
                    lender_amount: lender_part,
                    borrower_amount: borrower_part,
                });
            }
            if queue.is_empty() {
                self.matched.remove(&lender);
            }
        }
        Ok(contributions)
    }

    /// The lender's open order, if any.
    #[must_use]
    pub fn open_order(&self, lender: &AccountId) -> Option<&LendOrder> {
        self.open_orders.get(lender)
    }

    /// The lender's matched orders, oldest first.
    pub fn matched_orders(&self, lender: &AccountId) -> impl Iterator<Item = &MatchedOrder> {
        self.matched.get(lender).into_iter().flatten()
    }

    /// Lender principal currently matched for `lender`.
    #[must_use]
    pub fn matched_amount(&self, lender: &AccountId) -> u128 {
        self.matched_orders(lender).map(|m| m.lender_amount).sum()
    }

    /// Lender plus borrower collateral currently matched for `lender`.
    #[must_use]
    pub fn matched_total(&self, lender: &AccountId) -> u128 {
        self.matched_orders(lender).map(MatchedOrder::total).sum()
    }

    #[must_use]
    pub fn open_depth(&self) -> u128 {
        self.open_depth
    }

    #[must_use]
    pub fn matched_depth(&self) -> u128 {
        self.matched_depth
    }

    #[must_use]
    pub fn leverage(&self) -> Wad {
        self.leverage
    }
}
