//! Rate engine.
//!
//! ```text
//!   rate = WAD                             if now <= start_timestamp
//!   rate = price * spread / start_price    afterwards (WAD scale, round down)
//! ```
//!
//! `price` is the batch's frozen final price when it has one, else a fresh
//! validated oracle reading. For a given `now` the rate never decreases as
//! the price rises.

use chrono::{DateTime, Utc};
use tbyswap_oracle::{PriceFeed, current_price};
use tbyswap_types::{Result, Rounding, TbyBatch, Wad};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEngine {
    spread: Wad,
}

impl RateEngine {
    #[must_use]
    pub fn new(spread: Wad) -> Self {
        Self { spread }
    }

    #[must_use]
    pub fn spread(&self) -> Wad {
        self.spread
    }

    /// Rate of `batch` at an already-validated `price`, observed at `now`.
    pub fn rate_at(&self, batch: &TbyBatch, price: Wad, now: DateTime<Utc>) -> Result<Wad> {
        if now <= batch.start_timestamp {
            return Ok(Wad::ONE);
        }
        price.mul_div(self.spread, batch.start_price, Rounding::Down)
    }

    /// Rate of `batch` at `now`.
    ///
    /// # Errors
    /// Feed validation errors propagate unchanged, also at the opening
    /// instant.
    pub fn get_rate(
        &self,
        batch: &TbyBatch,
        feed: &dyn PriceFeed,
        now: DateTime<Utc>,
    ) -> Result<Wad> {
        let price = match batch.final_price {
            Some(frozen) => frozen,
            None => current_price(feed)?,
        };
        let rate = self.rate_at(batch, price, now)?;
        tracing::debug!(id = %batch.id, price = %price, rate = %rate, "Rate computed");
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tbyswap_oracle::MockPriceFeed;
    use tbyswap_types::{TbyError, TbyId, WAD};

    use super::*;

    fn engine() -> RateEngine {
        RateEngine::new(Wad(995 * WAD / 1_000))
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_225_600, 0).unwrap()
    }

    fn later() -> DateTime<Utc> {
        t0() + Duration::hours(1)
    }

    fn batch_at(price: u128) -> TbyBatch {
        TbyBatch::dummy(TbyId(0), Wad(price), 1, t0())
    }

    #[test]
    fn unity_at_open() {
        let feed = MockPriceFeed::new(110_0000_0000);
        let batch = batch_at(110 * WAD);
        assert_eq!(engine().get_rate(&batch, &feed, t0()).unwrap(), Wad::ONE);
        // Clock skew before the open still reads unity.
        let before = t0() - Duration::seconds(5);
        assert_eq!(engine().get_rate(&batch, &feed, before).unwrap(), Wad::ONE);
    }

    #[test]
    fn unchanged_price_after_open_applies_spread() {
        let feed = MockPriceFeed::new(110_0000_0000);
        let batch = batch_at(110 * WAD);
        assert_eq!(
            engine().get_rate(&batch, &feed, later()).unwrap(),
            Wad(995 * WAD / 1_000)
        );
    }

    #[test]
    fn appreciation_passes_spread() {
        let feed = MockPriceFeed::new(115_0000_0000);
        let batch = batch_at(110 * WAD);
        assert_eq!(
            engine().get_rate(&batch, &feed, later()).unwrap(),
            Wad(1_040_227_272_727_272_727)
        );
    }

    #[test]
    fn depreciation_lowers_rate() {
        let feed = MockPriceFeed::new(100_0000_0000);
        let batch = batch_at(110 * WAD);
        let rate = engine().get_rate(&batch, &feed, later()).unwrap();
        assert!(rate < Wad::ONE);
        assert_eq!(rate, Wad(904_545_454_545_454_545));
    }

    #[test]
    fn rate_never_falls_as_price_rises() {
        let batch = batch_at(110 * WAD);
        let start = 110 * WAD;
        let step = 10_000_000_000;
        let prices = [start - step, start - 1, start, start + 1, start + step];
        for now in [t0(), later()] {
            let rates: Vec<Wad> = prices
                .iter()
                .map(|p| engine().rate_at(&batch, Wad(*p), now).unwrap())
                .collect();
            assert!(rates.windows(2).all(|w| w[0] <= w[1]), "{rates:?}");
        }
    }

    #[test]
    fn frozen_price_ignores_feed() {
        let feed = MockPriceFeed::new(0);
        let mut batch = batch_at(110 * WAD);
        batch.final_price = Some(Wad(115 * WAD));
        assert_eq!(
            engine().get_rate(&batch, &feed, later()).unwrap(),
            Wad(1_040_227_272_727_272_727)
        );
    }

    #[test]
    fn feed_errors_propagate() {
        let feed = MockPriceFeed::new(0);
        let batch = batch_at(110 * WAD);
        assert_eq!(
            engine().get_rate(&batch, &feed, t0()),
            Err(TbyError::InvalidPriceFeed)
        );
    }
}
