//! The price-feed surface this engine consumes.
//!
//! The engine is a consumer, not an implementer, of the feed contract: it
//! only ever calls [`PriceFeed::latest_round_data`] and
//! [`PriceFeed::decimals`].

use tbyswap_types::PriceSnapshot;

/// Minimal Chainlink-style aggregator interface.
pub trait PriceFeed: Send + Sync {
    /// Most recent round reading. Not validated.
    fn latest_round_data(&self) -> PriceSnapshot;

    /// Decimals of `answer`.
    fn decimals(&self) -> u8;
}

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::sync::{Arc, Mutex, PoisonError};

    use tbyswap_types::{PriceSnapshot, constants};

    use super::PriceFeed;

    /// In-memory feed for tests. **Never use in production.**
    ///
    /// Clones share state, so a test can keep one handle and move the other
    /// into a pool, then move the price underneath it.
    #[derive(Debug, Clone)]
    pub struct MockPriceFeed {
        state: Arc<Mutex<PriceSnapshot>>,
        decimals: u8,
    }

    impl MockPriceFeed {
        /// An 8-decimal feed answering `answer` in round 1.
        #[must_use]
        pub fn new(answer: i128) -> Self {
            Self::with_decimals(answer, constants::DEFAULT_ORACLE_DECIMALS)
        }

        #[must_use]
        pub fn with_decimals(answer: i128, decimals: u8) -> Self {
            Self {
                state: Arc::new(Mutex::new(PriceSnapshot::fresh(1, answer, 1))),
                decimals,
            }
        }

        /// Publish `answer` in a new, freshly answered round.
        pub fn set_price(&self, answer: i128) {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let round = state.round_id + 1;
            *state = PriceSnapshot::fresh(round, answer, state.updated_at + 1);
        }

        /// Replace the raw round data verbatim.
        pub fn set_round_data(&self, snapshot: PriceSnapshot) {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
        }
    }

    impl PriceFeed for MockPriceFeed {
        fn latest_round_data(&self) -> PriceSnapshot {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn decimals(&self) -> u8 {
            self.decimals
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockPriceFeed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clones_share_state() {
        let feed = MockPriceFeed::new(110_0000_0000);
        let handle = feed.clone();
        handle.set_price(115_0000_0000);
        let snap = feed.latest_round_data();
        assert_eq!(snap.answer, 115_0000_0000);
        assert_eq!(snap.round_id, 2);
        assert_eq!(snap.answered_in_round, 2);
    }

    #[test]
    fn mock_reports_decimals() {
        assert_eq!(MockPriceFeed::new(1).decimals(), 8);
        assert_eq!(MockPriceFeed::with_decimals(1, 18).decimals(), 18);
    }
}
