//! Stop-loss arithmetic for short legs.

use rust_decimal::{Decimal, RoundingStrategy};

/// Stop price for a short leg: entry premium plus the configured
/// percentage, rounded to one decimal (ties to even).
#[must_use]
pub fn stop_loss_price(entry_price: Decimal, sl_percentage: Decimal) -> Decimal {
    let stop = entry_price * (Decimal::ONE + sl_percentage / Decimal::ONE_HUNDRED);
    stop.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
}

/// A short leg stops out as soon as the premium trades at or above its stop.
#[must_use]
pub fn breaches_stop(current: Decimal, stop: Decimal) -> bool {
    current >= stop
}
