//! Persistence for the strangle session bot.
//!
//! This crate provides:
//! - The trade log of completed rounds (one CSV row per session)
//! - The snapshot log written by the one-shot capture command

pub mod trade_log;

pub use trade_log::{
    CsvSnapshotLog, CsvTradeLog, ExportError, SnapshotRow, TradeLog, TradeLogRow,
};
