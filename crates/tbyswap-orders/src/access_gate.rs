//! Role gate: whitelist checks for borrowers and market makers.
//!
//! The engine consumes a yes/no answer per (role, account); who maintains
//! the list is outside its concern. Every failed check surfaces as
//! `KycFailed`, whichever role was missing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tbyswap_types::{AccountId, Result, TbyError};

/// A whitelisted capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    Borrower,
    MarketMaker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Borrower => write!(f, "BORROWER"),
            Self::MarketMaker => write!(f, "MARKET_MAKER"),
        }
    }
}

/// Capability check injected into the engine.
pub trait AccessGate: Send + Sync {
    fn is_whitelisted(&self, role: Role, account: &AccountId) -> bool;

    fn set_whitelisted(&mut self, role: Role, account: AccountId, allowed: bool);
}

/// Fail with `KycFailed` unless `account` holds `role`.
pub fn require_role(gate: &dyn AccessGate, role: Role, account: &AccountId) -> Result<()> {
    if gate.is_whitelisted(role, account) {
        Ok(())
    } else {
        tracing::warn!(%role, account = %account.short(), "KYC check failed");
        Err(TbyError::KycFailed)
    }
}

/// In-memory whitelist registry.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: HashSet<(Role, AccountId)>,
}

impl Whitelist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant, handy when wiring a pool.
    #[must_use]
    pub fn with(mut self, role: Role, account: AccountId) -> Self {
        self.entries.insert((role, account));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AccessGate for Whitelist {
    fn is_whitelisted(&self, role: Role, account: &AccountId) -> bool {
        self.entries.contains(&(role, *account))
    }

    fn set_whitelisted(&mut self, role: Role, account: AccountId, allowed: bool) {
        if allowed {
            self.entries.insert((role, account));
        } else {
            self.entries.remove(&(role, account));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_whitelist_denies() {
        let gate = Whitelist::new();
        assert!(!gate.is_whitelisted(Role::Borrower, &AccountId::new()));
        assert!(gate.is_empty());
    }

    #[test]
    fn roles_are_independent() {
        let account = AccountId::new();
        let gate = Whitelist::new().with(Role::Borrower, account);
        assert!(gate.is_whitelisted(Role::Borrower, &account));
        assert!(!gate.is_whitelisted(Role::MarketMaker, &account));
    }

    #[test]
    fn toggle_on_and_off() {
        let account = AccountId::new();
        let mut gate = Whitelist::new();
        gate.set_whitelisted(Role::MarketMaker, account, true);
        assert!(gate.is_whitelisted(Role::MarketMaker, &account));
        gate.set_whitelisted(Role::MarketMaker, account, false);
        assert!(!gate.is_whitelisted(Role::MarketMaker, &account));
        assert_eq!(gate.len(), 0);
    }

    #[test]
    fn require_role_maps_to_kyc_failed() {
        let account = AccountId::new();
        let gate = Whitelist::new().with(Role::Borrower, account);
        assert!(require_role(&gate, Role::Borrower, &account).is_ok());
        assert_eq!(
            require_role(&gate, Role::MarketMaker, &account),
            Err(TbyError::KycFailed)
        );
    }

    #[test]
    fn role_display() {
        assert_eq!(format!("{}", Role::Borrower), "BORROWER");
        assert_eq!(format!("{}", Role::MarketMaker), "MARKET_MAKER");
    }
}
