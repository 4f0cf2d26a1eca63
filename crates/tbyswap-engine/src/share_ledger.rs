//! TBY share ledger.
//!
//! Per-(holder, batch) balances. Shares are minted 1:1 with the lender
//! principal a swap-in consumes and burned on lender redemption, so the
//! supply of a batch always equals its unredeemed lender principal.

use std::collections::HashMap;

use tbyswap_types::{AccountId, Result, TbyError, TbyId};

#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    balances: HashMap<(AccountId, TbyId), u128>,
    supply: HashMap<TbyId, u128>,
}

impl ShareLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` shares of batch `id` to `holder`.
    pub fn mint(&mut self, holder: AccountId, id: TbyId, amount: u128) -> Result<()> {
        let supply = self
            .supply_of(id)
            .checked_add(amount)
            .ok_or(TbyError::MathOverflow)?;
        let balance = self
            .balance_of(&holder, id)
            .checked_add(amount)
            .ok_or(TbyError::MathOverflow)?;
        self.balances.insert((holder, id), balance);
        self.supply.insert(id, supply);
        Ok(())
    }

    /// Destroy `amount` of `holder`'s shares of batch `id`.
    ///
    /// # Errors
    /// Returns `InsufficientShares` if the balance is below `amount`.
    pub fn burn(&mut self, holder: AccountId, id: TbyId, amount: u128) -> Result<()> {
        let available = self.balance_of(&holder, id);
        if available < amount {
            return Err(TbyError::InsufficientShares {
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(&(holder, id));
        } else {
            self.balances.insert((holder, id), remaining);
        }
        if let Some(supply) = self.supply.get_mut(&id) {
            *supply -= amount;
        }
        Ok(())
    }

    #[must_use]
    pub fn balance_of(&self, holder: &AccountId, id: TbyId) -> u128 {
        self.balances.get(&(*holder, id)).copied().unwrap_or(0)
    }

    /// Outstanding shares of batch `id`.
    #[must_use]
    pub fn supply_of(&self, id: TbyId) -> u128 {
        self.supply.get(&id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_credits_holder_and_supply() {
        let mut ledger = ShareLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.mint(alice, TbyId(0), 100).unwrap();
        ledger.mint(bob, TbyId(0), 50).unwrap();
        ledger.mint(alice, TbyId(1), 7).unwrap();
        assert_eq!(ledger.balance_of(&alice, TbyId(0)), 100);
        assert_eq!(ledger.balance_of(&alice, TbyId(1)), 7);
        assert_eq!(ledger.supply_of(TbyId(0)), 150);
        assert_eq!(ledger.supply_of(TbyId(2)), 0);
    }

    #[test]
    fn burn_reduces_supply() {
        let mut ledger = ShareLedger::new();
        let alice = AccountId::new();
        ledger.mint(alice, TbyId(0), 100).unwrap();
        ledger.burn(alice, TbyId(0), 40).unwrap();
        assert_eq!(ledger.balance_of(&alice, TbyId(0)), 60);
        assert_eq!(ledger.supply_of(TbyId(0)), 60);
        ledger.burn(alice, TbyId(0), 60).unwrap();
        assert_eq!(ledger.balance_of(&alice, TbyId(0)), 0);
    }

    #[test]
    fn overburn_rejected() {
        let mut ledger = ShareLedger::new();
        let alice = AccountId::new();
        ledger.mint(alice, TbyId(0), 10).unwrap();
        let err = ledger.burn(alice, TbyId(0), 11).unwrap_err();
        assert!(matches!(
            err,
            TbyError::InsufficientShares { needed: 11, available: 10 }
        ));
        assert_eq!(ledger.supply_of(TbyId(0)), 10);
    }
}
