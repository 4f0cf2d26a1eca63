//! Price validation.
//!
//! A reading is trusted only if its answer is positive and it was freshly
//! answered: `updated_at != 0` and `round_id == answered_in_round`. Both
//! staleness conditions map to `OutOfDate`; callers cannot tell "never
//! updated" from "carried over from an earlier round".

use tbyswap_types::{PriceSnapshot, Result, Rounding, TbyError, Wad};

use crate::PriceFeed;

/// Validate a raw reading and return its answer as an unsigned price in
/// feed decimals.
///
/// # Errors
/// - `InvalidPriceFeed` if `answer <= 0` (checked first)
/// - `OutOfDate` if `updated_at == 0` or `round_id != answered_in_round`
pub fn validate(snapshot: &PriceSnapshot) -> Result<u128> {
    if snapshot.answer <= 0 {
        tracing::warn!(
            round = snapshot.round_id,
            answer = snapshot.answer,
            "Rejected price reading: non-positive answer"
        );
        return Err(TbyError::InvalidPriceFeed);
    }
    if snapshot.updated_at == 0 || snapshot.round_id != snapshot.answered_in_round {
        tracing::warn!(
            round = snapshot.round_id,
            answered_in_round = snapshot.answered_in_round,
            updated_at = snapshot.updated_at,
            "Rejected price reading: stale round"
        );
        return Err(TbyError::OutOfDate);
    }
    // answer > 0 here, so the conversion cannot fail.
    u128::try_from(snapshot.answer).map_err(|_| TbyError::InvalidPriceFeed)
}

/// Fetch a fresh reading from `feed`, validate it, and rescale it to WAD.
pub fn current_price(feed: &dyn PriceFeed) -> Result<Wad> {
    let snapshot = feed.latest_round_data();
    let price = validate(&snapshot)?;
    let wad = Wad::from_scaled(price, feed.decimals(), Rounding::Down)?;
    if wad.is_zero() {
        // A feed with more than 18 decimals can truncate a tiny answer to 0.
        return Err(TbyError::InvalidPriceFeed);
    }
    tracing::debug!(round = snapshot.round_id, price = %wad, "Validated oracle price");
    Ok(wad)
}

#[cfg(test)]
mod tests {
    use tbyswap_types::WAD;

    use super::*;
    use crate::MockPriceFeed;

    #[test]
    fn fresh_positive_reading_passes() {
        let snap = PriceSnapshot::fresh(5, 110_0000_0000, 1_700_000_000);
        assert_eq!(validate(&snap).unwrap(), 110_0000_0000);
    }

    #[test]
    fn zero_price_rejected() {
        let snap = PriceSnapshot::fresh(1, 0, 1);
        assert_eq!(validate(&snap), Err(TbyError::InvalidPriceFeed));
    }

    #[test]
    fn negative_price_rejected() {
        let snap = PriceSnapshot::fresh(1, -5, 1);
        assert_eq!(validate(&snap), Err(TbyError::InvalidPriceFeed));
    }

    #[test]
    fn never_updated_is_out_of_date() {
        let mut snap = PriceSnapshot::fresh(1, 110_0000_0000, 1);
        snap.updated_at = 0;
        assert_eq!(validate(&snap), Err(TbyError::OutOfDate));
    }

    #[test]
    fn round_mismatch_is_out_of_date() {
        let mut snap = PriceSnapshot::fresh(7, 110_0000_0000, 1);
        snap.answered_in_round = 6;
        assert_eq!(validate(&snap), Err(TbyError::OutOfDate));
    }

    #[test]
    fn price_check_precedes_staleness_check() {
        let snap = PriceSnapshot {
            round_id: 2,
            answer: 0,
            started_at: 0,
            updated_at: 0,
            answered_in_round: 1,
        };
        assert_eq!(validate(&snap), Err(TbyError::InvalidPriceFeed));
    }

    #[test]
    fn current_price_rescales_to_wad() {
        let feed = MockPriceFeed::new(110_0000_0000);
        assert_eq!(current_price(&feed).unwrap(), Wad(110 * WAD));
    }

    #[test]
    fn current_price_handles_wide_feeds() {
        let feed = MockPriceFeed::with_decimals(110 * 10i128.pow(20), 20);
        assert_eq!(current_price(&feed).unwrap(), Wad(110 * WAD));
    }

    #[test]
    fn current_price_truncated_to_zero_is_invalid() {
        let feed = MockPriceFeed::with_decimals(1, 20);
        assert_eq!(current_price(&feed), Err(TbyError::InvalidPriceFeed));
    }

    #[test]
    fn current_price_reads_every_time() {
        let feed = MockPriceFeed::new(110_0000_0000);
        assert_eq!(current_price(&feed).unwrap(), Wad(110 * WAD));
        feed.set_price(115_0000_0000);
        assert_eq!(current_price(&feed).unwrap(), Wad(115 * WAD));
        feed.set_round_data(PriceSnapshot {
            answered_in_round: 1,
            ..PriceSnapshot::fresh(3, 115_0000_0000, 9)
        });
        assert_eq!(current_price(&feed), Err(TbyError::OutOfDate));
    }
}
