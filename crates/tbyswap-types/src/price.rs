//! Oracle price readings.
//!
//! A [`PriceSnapshot`] mirrors the `latestRoundData()` tuple of a
//! Chainlink-style aggregator. Snapshots are ephemeral: they are fetched,
//! validated and consumed within one call and never stored.

use serde::{Deserialize, Serialize};

/// One reading of a round-based price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// The round this reading belongs to.
    pub round_id: u128,
    /// Price in the feed's native decimals. May be zero or negative on a
    /// broken feed.
    pub answer: i128,
    /// Unix seconds when the round started.
    pub started_at: u64,
    /// Unix seconds of the last update. Zero means never updated.
    pub updated_at: u64,
    /// The round in which `answer` was computed.
    pub answered_in_round: u128,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PriceSnapshot {
    /// A well-formed reading for `round_id`, answered in the same round.
    #[must_use]
    pub fn fresh(round_id: u128, answer: i128, updated_at: u64) -> Self {
        Self {
            round_id,
            answer,
            started_at: updated_at,
            updated_at,
            answered_in_round: round_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_snapshot_answers_its_own_round() {
        let snap = PriceSnapshot::fresh(3, 110_0000_0000, 1_700_000_000);
        assert_eq!(snap.round_id, snap.answered_in_round);
        assert_eq!(snap.started_at, snap.updated_at);
    }

    #[test]
    fn serde_roundtrip() {
        let snap = PriceSnapshot::fresh(1, 115_0000_0000, 42);
        let json = serde_json::to_string(&snap).unwrap();
        let back: PriceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
