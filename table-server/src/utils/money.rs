//! Money helpers
//!
//! Monetary values are stored and serialized as `f64` but every amount that
//! leaves this server goes through [`round_money`], computed via `Decimal` so
//! repeated additions cannot accumulate binary-float drift.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounding precision for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount to 2 decimal places, half away from zero
pub fn round_money(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| {
            d.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
                .unwrap_or(value)
        })
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places_away_from_zero() {
        assert_eq!(round_money(10.006), 10.01);
        assert_eq!(round_money(10.004), 10.0);
        assert_eq!(round_money(-10.006), -10.01);
        assert_eq!(round_money(99.999), 100.0);
    }

    #[test]
    fn float_accumulation_is_flattened() {
        // 0.1 + 0.2 famously != 0.3 in f64
        assert_eq!(round_money(0.1 + 0.2), 0.3);
    }
}
