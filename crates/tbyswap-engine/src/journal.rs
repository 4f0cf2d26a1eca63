//! Event journal: append-only, hash-chained record of committed pool
//! events.
//!
//! ```text
//!   hash[n] = SHA-256( DOMAIN || hash[n-1] || n (le) || json(event[n]) )
//!   hash[-1] = [0; 32]
//! ```
//!
//! Two pools driven by the same calls at the same instants end with the
//! same [`EventJournal::digest`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tbyswap_orders::Role;
use tbyswap_types::{AccountId, MatchRefund, Result, TbyError, TbyId, Wad, constants};

/// Something observable the pool did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    OrderCreated {
        lender: AccountId,
        amount: u128,
    },
    OrderFilled {
        lender: AccountId,
        borrower: AccountId,
        filled: u128,
        borrow_amount: u128,
    },
    OpenOrderKilled {
        lender: AccountId,
        amount: u128,
    },
    MatchOrderKilled {
        lender: AccountId,
        refunds: Vec<MatchRefund>,
    },
    BatchOpened {
        id: TbyId,
        start_price: Wad,
        at: DateTime<Utc>,
    },
    SwappedIn {
        id: TbyId,
        stable_amount: u128,
        rwa_amount: u128,
        at: DateTime<Utc>,
    },
    SwappedOut {
        id: TbyId,
        rwa_amount: u128,
        stable_amount: u128,
        rate: Wad,
        at: DateTime<Utc>,
    },
    BatchRedeemable {
        id: TbyId,
        lender_return: u128,
        borrower_return: u128,
    },
    LenderRedeemed {
        holder: AccountId,
        id: TbyId,
        shares: u128,
        payout: u128,
    },
    BorrowerRedeemed {
        borrower: AccountId,
        id: TbyId,
        payout: u128,
    },
    PriceFeedSet {
        decimals: u8,
        round_id: u128,
    },
    WhitelistUpdated {
        role: Role,
        account: AccountId,
        allowed: bool,
    },
}

/// One committed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub event: PoolEvent,
    /// Chain hash up to and including this entry.
    pub hash: [u8; 32],
}

#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event`, extending the hash chain.
    ///
    /// # Errors
    /// `Serialization` if the event cannot be encoded, `MathOverflow` if
    /// the sequence number no longer fits a `u64`.
    pub fn append(&mut self, event: PoolEvent) -> Result<&JournalEntry> {
        let sequence =
            u64::try_from(self.entries.len()).map_err(|_| TbyError::MathOverflow)?;
        let hash = Self::chain_hash(&self.head(), sequence, &event)?;
        self.entries.push(JournalEntry {
            sequence,
            event,
            hash,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Hash of the latest entry, all zeros when empty.
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.entries.last().map_or([0u8; 32], |e| e.hash)
    }

    /// Hex encoding of [`Self::head`].
    #[must_use]
    pub fn digest(&self) -> String {
        hex::encode(self.head())
    }

    /// Recompute the whole chain and compare against the stored hashes.
    #[must_use]
    pub fn verify(&self) -> bool {
        let mut prev = [0u8; 32];
        for entry in &self.entries {
            match Self::chain_hash(&prev, entry.sequence, &entry.event) {
                Ok(hash) if hash == entry.hash => prev = hash,
                _ => return false,
            }
        }
        true
    }

    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn chain_hash(prev: &[u8; 32], sequence: u64, event: &PoolEvent) -> Result<[u8; 32]> {
        let encoded = serde_json::to_vec(event)?;
        let mut hasher = Sha256::new();
        hasher.update(constants::JOURNAL_DOMAIN);
        hasher.update(prev);
        hasher.update(sequence.to_le_bytes());
        hasher.update(&encoded);

        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(amount: u128) -> PoolEvent {
        PoolEvent::OrderCreated {
            lender: AccountId::from_bytes([7u8; 16]),
            amount,
        }
    }

    #[test]
    fn empty_journal_has_zero_head() {
        let journal = EventJournal::new();
        assert_eq!(journal.head(), [0u8; 32]);
        assert_eq!(journal.digest(), "0".repeat(64));
        assert!(journal.verify());
    }

    #[test]
    fn append_assigns_sequence_and_chains() {
        let mut journal = EventJournal::new();
        let first = journal.append(created(1)).unwrap().hash;
        let second = journal.append(created(2)).unwrap().clone();
        assert_eq!(second.sequence, 1);
        assert_ne!(first, second.hash);
        assert_eq!(journal.len(), 2);
        assert!(journal.verify());
    }

    #[test]
    fn same_events_same_digest() {
        let mut a = EventJournal::new();
        let mut b = EventJournal::new();
        for amount in [10, 20, 30] {
            a.append(created(amount)).unwrap();
            b.append(created(amount)).unwrap();
        }
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn order_matters() {
        let mut a = EventJournal::new();
        let mut b = EventJournal::new();
        a.append(created(1)).unwrap();
        a.append(created(2)).unwrap();
        b.append(created(2)).unwrap();
        b.append(created(1)).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn tampering_detected() {
        let mut journal = EventJournal::new();
        journal.append(created(1)).unwrap();
        journal.append(created(2)).unwrap();
        journal.entries[0].event = created(99);
        assert!(!journal.verify());
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_string(&PoolEvent::PriceFeedSet {
            decimals: 8,
            round_id: 3,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"price_feed_set\""));
    }
}
