//! The four-leg position model and per-leg lifecycle.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use strangle_core::{OptionRight, OrderSide, SecurityId};

use crate::stops;

/// Role of a leg within the strangle.
///
/// The declaration order is the canonical order used for the leg array,
/// logs, and trade log columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegRole {
    ShortCall,
    HedgeCall,
    ShortPut,
    HedgePut,
}

impl LegRole {
    /// All four roles in canonical order.
    pub const ALL: [Self; 4] = [
        Self::ShortCall,
        Self::HedgeCall,
        Self::ShortPut,
        Self::HedgePut,
    ];

    #[must_use]
    pub const fn right(self) -> OptionRight {
        match self {
            Self::ShortCall | Self::HedgeCall => OptionRight::Call,
            Self::ShortPut | Self::HedgePut => OptionRight::Put,
        }
    }

    #[must_use]
    pub const fn side(self) -> OrderSide {
        match self {
            Self::ShortCall | Self::ShortPut => OrderSide::Sell,
            Self::HedgeCall | Self::HedgePut => OrderSide::Buy,
        }
    }

    /// Short legs carry the stop loss and are polled by the monitor.
    #[must_use]
    pub const fn is_short(self) -> bool {
        matches!(self, Self::ShortCall | Self::ShortPut)
    }

    /// Label used in logs and report columns.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortCall => "Short CE",
            Self::HedgeCall => "Hedge CE",
            Self::ShortPut => "Short PE",
            Self::HedgePut => "Hedge PE",
        }
    }

    /// Index of this role in `Position::legs`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ShortCall => 0,
            Self::HedgeCall => 1,
            Self::ShortPut => 2,
            Self::HedgePut => 3,
        }
    }
}

impl std::fmt::Display for LegRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of a single leg.
///
/// `Pending -> Open -> ClosedBySl | ClosedEod`; there are no other
/// transitions, and a settled position holds only closed legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegStatus {
    /// Resolved but not yet priced in.
    Pending,
    /// Entry premium recorded; exposed to the market.
    Open,
    /// Short leg bought back by the stop-loss rule.
    ClosedBySl,
    /// Squared off when monitoring ended.
    ClosedEod,
}

impl LegStatus {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::ClosedBySl | Self::ClosedEod)
    }
}

/// One of the four option legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub role: LegRole,
    pub strike: i64,
    pub symbol: String,
    pub security_id: SecurityId,
    pub status: LegStatus,
    /// Premium at entry. Zero before entry, and zero stays recorded when
    /// the entry quote was unavailable.
    pub entry_price: Decimal,
    /// Stop price, armed for short legs at entry.
    pub stop_loss: Option<Decimal>,
    /// Premium at exit; zero until closed.
    pub exit_price: Decimal,
    pub exit_at: Option<NaiveDateTime>,
    /// Signed P/L, set at settlement.
    pub realized_pnl: Decimal,
}

impl Leg {
    #[must_use]
    pub fn new(role: LegRole, strike: i64, symbol: String, security_id: SecurityId) -> Self {
        Self {
            role,
            strike,
            symbol,
            security_id,
            status: LegStatus::Pending,
            entry_price: Decimal::ZERO,
            stop_loss: None,
            exit_price: Decimal::ZERO,
            exit_at: None,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Records the entry premium and, for short legs, arms the stop.
    pub fn open(&mut self, entry_price: Decimal, sl_percentage: Decimal) {
        self.entry_price = entry_price;
        if self.role.is_short() {
            self.stop_loss = Some(stops::stop_loss_price(entry_price, sl_percentage));
        }
        self.status = LegStatus::Open;
    }

    /// Buys the leg back at `exit_price` because its stop was breached.
    pub fn close_by_stop(&mut self, exit_price: Decimal, at: NaiveDateTime) {
        self.exit_price = exit_price;
        self.exit_at = Some(at);
        self.status = LegStatus::ClosedBySl;
    }

    /// Squares the leg off at `exit_price` when monitoring ends.
    pub fn close_eod(&mut self, exit_price: Decimal, at: NaiveDateTime) {
        self.exit_price = exit_price;
        self.exit_at = Some(at);
        self.status = LegStatus::ClosedEod;
    }

    /// Realized P/L for a closed leg, rounded to 2 decimals: sellers gain
    /// when the premium decays, buyers when it expands.
    pub fn settle(&mut self, lot_size: u32) -> Decimal {
        let lot = Decimal::from(lot_size);
        let pnl = match self.role.side() {
            OrderSide::Sell => (self.entry_price - self.exit_price) * lot,
            OrderSide::Buy => (self.exit_price - self.entry_price) * lot,
        };
        self.realized_pnl = pnl.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        self.realized_pnl
    }
}

/// One complete strangle round: exactly four legs in canonical role order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub date: NaiveDate,
    pub entered_at: NaiveDateTime,
    pub spot_price: Decimal,
    pub expiry: NaiveDate,
    pub legs: [Leg; 4],
    /// Short entry premiums minus hedge entry premiums, fixed at entry and
    /// never recomputed.
    pub net_credit: Decimal,
    /// Sum of per-leg realized P/L, set once at settlement.
    pub total_pnl: Option<Decimal>,
}

impl Position {
    #[must_use]
    pub fn new(
        date: NaiveDate,
        entered_at: NaiveDateTime,
        spot_price: Decimal,
        expiry: NaiveDate,
        legs: [Leg; 4],
    ) -> Self {
        Self {
            date,
            entered_at,
            spot_price,
            expiry,
            legs,
            net_credit: Decimal::ZERO,
            total_pnl: None,
        }
    }

    #[must_use]
    pub fn leg(&self, role: LegRole) -> &Leg {
        &self.legs[role.index()]
    }

    pub fn leg_mut(&mut self, role: LegRole) -> &mut Leg {
        &mut self.legs[role.index()]
    }

    /// Fixes the net credit from the recorded entry premiums.
    pub fn fix_net_credit(&mut self) {
        self.net_credit = self
            .legs
            .iter()
            .map(|leg| match leg.role.side() {
                OrderSide::Sell => leg.entry_price,
                OrderSide::Buy => -leg.entry_price,
            })
            .sum();
    }

    /// True once both short legs are closed.
    #[must_use]
    pub fn shorts_closed(&self) -> bool {
        self.leg(LegRole::ShortCall).status.is_closed()
            && self.leg(LegRole::ShortPut).status.is_closed()
    }

    /// True once no leg is pending or open.
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.legs.iter().all(|leg| leg.status.is_closed())
    }

    /// Settles every leg and records the total.
    pub fn settle(&mut self, lot_size: u32) -> Decimal {
        let mut total = Decimal::ZERO;
        for leg in &mut self.legs {
            total += leg.settle(lot_size);
        }
        self.total_pnl = Some(total);
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_leg(role: LegRole) -> Leg {
        Leg::new(
            role,
            48300,
            "BANKNIFTY25SEP202548300CE".to_string(),
            SecurityId::from("49081"),
        )
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 23)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn make_position() -> Position {
        let legs = [
            make_leg(LegRole::ShortCall),
            make_leg(LegRole::HedgeCall),
            make_leg(LegRole::ShortPut),
            make_leg(LegRole::HedgePut),
        ];
        Position::new(
            NaiveDate::from_ymd_opt(2025, 9, 23).unwrap(),
            at(9, 20),
            dec!(48000),
            NaiveDate::from_ymd_opt(2025, 9, 25).unwrap(),
            legs,
        )
    }

    #[test]
    fn roles_map_to_rights_and_sides() {
        assert_eq!(LegRole::ShortCall.right(), OptionRight::Call);
        assert_eq!(LegRole::HedgePut.right(), OptionRight::Put);
        assert_eq!(LegRole::ShortPut.side(), OrderSide::Sell);
        assert_eq!(LegRole::HedgeCall.side(), OrderSide::Buy);
        assert!(LegRole::ShortCall.is_short());
        assert!(!LegRole::HedgeCall.is_short());
    }

    #[test]
    fn opening_a_short_leg_arms_the_stop() {
        let mut leg = make_leg(LegRole::ShortCall);
        leg.open(dec!(100), dec!(25));
        assert_eq!(leg.status, LegStatus::Open);
        assert_eq!(leg.entry_price, dec!(100));
        assert_eq!(leg.stop_loss, Some(dec!(125.0)));
    }

    #[test]
    fn opening_a_hedge_leg_leaves_no_stop() {
        let mut leg = make_leg(LegRole::HedgeCall);
        leg.open(dec!(30), dec!(25));
        assert_eq!(leg.status, LegStatus::Open);
        assert_eq!(leg.stop_loss, None);
    }

    #[test]
    fn short_leg_pnl_gains_on_decay() {
        // sell at 100, buy back at 70, lot 15 => +450
        let mut leg = make_leg(LegRole::ShortCall);
        leg.open(dec!(100), dec!(25));
        leg.close_eod(dec!(70), at(15, 0));
        assert_eq!(leg.settle(15), dec!(450.00));
    }

    #[test]
    fn hedge_leg_pnl_loses_on_decay() {
        let mut leg = make_leg(LegRole::HedgeCall);
        leg.open(dec!(30), dec!(25));
        leg.close_eod(dec!(10), at(15, 0));
        assert_eq!(leg.settle(15), dec!(-300.00));
    }

    #[test]
    fn stop_closure_records_exit_details() {
        let mut leg = make_leg(LegRole::ShortPut);
        leg.open(dec!(120), dec!(25));
        leg.close_by_stop(dec!(151.2), at(11, 5));
        assert_eq!(leg.status, LegStatus::ClosedBySl);
        assert_eq!(leg.exit_price, dec!(151.2));
        assert_eq!(leg.exit_at, Some(at(11, 5)));
    }

    #[test]
    fn net_credit_is_shorts_minus_hedges() {
        let mut position = make_position();
        position.leg_mut(LegRole::ShortCall).open(dec!(100), dec!(25));
        position.leg_mut(LegRole::HedgeCall).open(dec!(30), dec!(25));
        position.leg_mut(LegRole::ShortPut).open(dec!(120), dec!(25));
        position.leg_mut(LegRole::HedgePut).open(dec!(35), dec!(25));
        position.fix_net_credit();
        assert_eq!(position.net_credit, dec!(155));
    }

    #[test]
    fn settle_totals_per_leg_pnl() {
        let mut position = make_position();
        for role in LegRole::ALL {
            let entry = match role {
                LegRole::ShortCall => dec!(100),
                LegRole::HedgeCall => dec!(30),
                LegRole::ShortPut => dec!(120),
                LegRole::HedgePut => dec!(35),
            };
            position.leg_mut(role).open(entry, dec!(25));
        }
        position.leg_mut(LegRole::ShortCall).close_eod(dec!(70), at(15, 0));
        position.leg_mut(LegRole::HedgeCall).close_eod(dec!(10), at(15, 0));
        position.leg_mut(LegRole::ShortPut).close_eod(dec!(110), at(15, 0));
        position.leg_mut(LegRole::HedgePut).close_eod(dec!(20), at(15, 0));

        let total = position.settle(15);
        // 450 - 300 + 150 - 225
        assert_eq!(total, dec!(75.00));
        assert_eq!(position.total_pnl, Some(dec!(75.00)));
        assert!(position.all_closed());
    }

    #[test]
    fn shorts_closed_ignores_hedges() {
        let mut position = make_position();
        for role in LegRole::ALL {
            position.leg_mut(role).open(dec!(50), dec!(25));
        }
        assert!(!position.shorts_closed());

        position.leg_mut(LegRole::ShortCall).close_by_stop(dec!(70), at(10, 0));
        position.leg_mut(LegRole::ShortPut).close_by_stop(dec!(80), at(10, 30));
        assert!(position.shorts_closed());
        assert!(!position.all_closed());
    }
}
