//! Strike selection from the index spot price.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// The four strikes of a hedged strangle, derived from one spot print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeLadder {
    /// Spot rounded to the nearest 100.
    pub base: i64,
    pub short_call: i64,
    pub short_put: i64,
    pub hedge_call: i64,
    pub hedge_put: i64,
}

impl StrikeLadder {
    /// Builds the ladder: shorts sit `short_otm` points out from the base
    /// on each side, hedges a further `hedge` points beyond the shorts.
    #[must_use]
    pub fn compute(spot: Decimal, short_otm: i64, hedge: i64) -> Self {
        let base = round_to_hundred(spot);
        let short_call = base + short_otm;
        let short_put = base - short_otm;
        Self {
            base,
            short_call,
            short_put,
            hedge_call: short_call + hedge,
            hedge_put: short_put - hedge,
        }
    }
}

/// Rounds to the nearest multiple of 100, ties to even.
fn round_to_hundred(spot: Decimal) -> i64 {
    let hundreds = (spot / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    (hundreds * Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ladder_from_round_spot() {
        let ladder = StrikeLadder::compute(dec!(48000), 300, 500);
        assert_eq!(ladder.base, 48000);
        assert_eq!(ladder.short_call, 48300);
        assert_eq!(ladder.short_put, 47700);
        assert_eq!(ladder.hedge_call, 48800);
        assert_eq!(ladder.hedge_put, 47200);
    }

    #[test]
    fn base_rounds_to_nearest_hundred() {
        assert_eq!(StrikeLadder::compute(dec!(48149.65), 300, 500).base, 48100);
        assert_eq!(StrikeLadder::compute(dec!(48151.10), 300, 500).base, 48200);
    }

    #[test]
    fn midpoint_rounds_to_even_hundred() {
        // 48250 is midway between 48200 and 48300; even hundreds win.
        assert_eq!(StrikeLadder::compute(dec!(48250), 300, 500).base, 48200);
        assert_eq!(StrikeLadder::compute(dec!(48350), 300, 500).base, 48400);
    }

    #[test]
    fn ladder_ordering_holds() {
        let ladder = StrikeLadder::compute(dec!(51234.55), 300, 500);
        assert!(ladder.hedge_put < ladder.short_put);
        assert!(ladder.short_put < ladder.base);
        assert!(ladder.base < ladder.short_call);
        assert!(ladder.short_call < ladder.hedge_call);
    }
}
