//! Hedged-strangle session engine.
//!
//! One session per trading day:
//! - wait for the entry time, then fix strikes from the index spot
//! - sell an OTM call and put, buy a further-OTM hedge on each side
//! - poll the short legs against their stop prices until the exit time
//! - square off, settle per-leg P/L, and append the trade log row
//!
//! All fills are hypothetical at the last traded premium; no orders are
//! ever placed.

pub mod engine;
pub mod position;
pub mod report;
pub mod snapshot;
pub mod stops;
pub mod strikes;

pub use engine::{RunError, StrategyEngine};
pub use position::{Leg, LegRole, LegStatus, Position};
pub use strikes::StrikeLadder;
