//! Fixed-point arithmetic shared by every component.
//!
//! Three scales meet in this engine: oracle decimals (typically 8), WAD
//! (1e18) for prices and rates, and each asset's own token decimals. All
//! conversion between them goes through [`rescale`] and [`mul_div`]; no
//! formula elsewhere multiplies or divides raw values of different scales.
//!
//! Products are computed in 256 bits so `a * b / denom` never overflows
//! before the division. Every call site names its [`Rounding`].

use std::fmt;

use ethnum::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{TbyError, constants, error::Result};

/// 1.0 at WAD scale.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Rounding direction for a single division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Toward zero.
    Down,
    /// Away from zero whenever a remainder is left.
    Up,
}

/// `a * b / denom` with a 256-bit intermediate product.
///
/// # Errors
/// `MathOverflow` if `denom` is zero or the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denom: u128, rounding: Rounding) -> Result<u128> {
    if denom == 0 {
        return Err(TbyError::MathOverflow);
    }
    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(denom);
    let mut quotient = product / denom;
    if rounding == Rounding::Up && product % denom != U256::ZERO {
        quotient += U256::ONE;
    }
    let (high, low) = quotient.into_words();
    if high != 0 {
        return Err(TbyError::MathOverflow);
    }
    Ok(low)
}

/// `10^exp` as `u128`.
///
/// # Errors
/// `MathOverflow` if `exp` exceeds [`constants::MAX_DECIMALS`].
pub fn pow10(exp: u8) -> Result<u128> {
    if exp > constants::MAX_DECIMALS {
        return Err(TbyError::MathOverflow);
    }
    10u128
        .checked_pow(u32::from(exp))
        .ok_or(TbyError::MathOverflow)
}

/// Convert `amount` expressed with `from_decimals` into `to_decimals`.
///
/// Scaling up is exact; scaling down rounds per `rounding`.
pub fn rescale(amount: u128, from_decimals: u8, to_decimals: u8, rounding: Rounding) -> Result<u128> {
    match from_decimals.cmp(&to_decimals) {
        std::cmp::Ordering::Equal => Ok(amount),
        std::cmp::Ordering::Less => amount
            .checked_mul(pow10(to_decimals - from_decimals)?)
            .ok_or(TbyError::MathOverflow),
        std::cmp::Ordering::Greater => {
            mul_div(amount, 1, pow10(from_decimals - to_decimals)?, rounding)
        }
    }
}

// ---------------------------------------------------------------------------
// Wad
// ---------------------------------------------------------------------------

/// A non-negative fixed-point number with 18 decimal places.
///
/// Used for prices (after rescaling from oracle decimals), rates, leverage
/// and spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Wad(pub u128);

impl Wad {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(WAD);

    #[must_use]
    pub fn raw(self) -> u128 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `amount * self` at the amount's own scale.
    pub fn mul_amount(self, amount: u128, rounding: Rounding) -> Result<u128> {
        mul_div(amount, self.0, WAD, rounding)
    }

    /// `amount / self` at the amount's own scale.
    pub fn div_amount(self, amount: u128, rounding: Rounding) -> Result<u128> {
        mul_div(amount, WAD, self.0, rounding)
    }

    /// `self * other / denom`, all at WAD scale.
    pub fn mul_div(self, other: Self, denom: Self, rounding: Rounding) -> Result<Self> {
        mul_div(self.0, other.0, denom.0, rounding).map(Self)
    }

    /// Lift an integer quantity with `decimals` places into WAD.
    pub fn from_scaled(value: u128, decimals: u8, rounding: Rounding) -> Result<Self> {
        rescale(value, decimals, constants::WAD_DECIMALS, rounding).map(Self)
    }

    /// Convert a human-readable decimal (e.g. `0.995`) into WAD, truncating
    /// anything beyond 18 places.
    ///
    /// # Errors
    /// `Configuration` for negative values, `MathOverflow` if out of range.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() {
            return Err(TbyError::Configuration(format!(
                "fixed-point value must be non-negative, got {value}"
            )));
        }
        let mantissa = u128::try_from(value.mantissa()).map_err(|_| TbyError::MathOverflow)?;
        // Decimal scale is at most 28, so it always fits in u8.
        let scale = u8::try_from(value.scale()).map_err(|_| TbyError::MathOverflow)?;
        rescale(mantissa, scale, constants::WAD_DECIMALS, Rounding::Down).map(Self)
    }

    /// Best-effort conversion to `Decimal` for display and reporting.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        let signed = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(signed, u32::from(constants::WAD_DECIMALS))
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WAD;
        let frac = self.0 % WAD;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}
