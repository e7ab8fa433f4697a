//! Append-only CSV logs for completed rounds and one-shot captures.
//!
//! Both logs write their header only when the file is created; existing
//! rows are never rewritten.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Failure to persist a record.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File could not be created, opened, or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Record could not be serialized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One completed strangle round, flattened for the trade log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogRow {
    pub date: NaiveDate,
    pub entry_time: NaiveDateTime,
    pub spot_price: Decimal,
    pub short_call_strike: i64,
    pub short_call_entry: Decimal,
    pub short_call_sl: Decimal,
    pub short_call_exit: Decimal,
    pub short_call_pnl: Decimal,
    pub hedge_call_strike: i64,
    pub hedge_call_entry: Decimal,
    pub hedge_call_exit: Decimal,
    pub hedge_call_pnl: Decimal,
    pub short_put_strike: i64,
    pub short_put_entry: Decimal,
    pub short_put_sl: Decimal,
    pub short_put_exit: Decimal,
    pub short_put_pnl: Decimal,
    pub hedge_put_strike: i64,
    pub hedge_put_entry: Decimal,
    pub hedge_put_exit: Decimal,
    pub hedge_put_pnl: Decimal,
    pub net_credit: Decimal,
    pub total_pnl: Decimal,
}

/// One point-in-time strangle capture from the snapshot command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub date: NaiveDate,
    pub captured_at: NaiveDateTime,
    pub spot_price: Decimal,
    pub short_call_strike: i64,
    pub short_call_premium: Decimal,
    pub hedge_call_strike: i64,
    pub hedge_call_premium: Decimal,
    pub short_put_strike: i64,
    pub short_put_premium: Decimal,
    pub hedge_put_strike: i64,
    pub hedge_put_premium: Decimal,
    pub net_credit: Decimal,
}

/// Sink for completed rounds.
pub trait TradeLog: Send + Sync {
    /// Appends one completed round.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    fn append(&self, row: &TradeLogRow) -> Result<(), ExportError>;
}

const TRADE_LOG_HEADER: [&str; 23] = [
    "Date",
    "Entry Time",
    "Spot Price",
    "Short CE Strike",
    "Short CE Premium",
    "Short CE SL",
    "Short CE Exit Price",
    "Short CE P/L",
    "Hedge CE Strike",
    "Hedge CE Premium",
    "Hedge CE Exit Price",
    "Hedge CE P/L",
    "Short PE Strike",
    "Short PE Premium",
    "Short PE SL",
    "Short PE Exit Price",
    "Short PE P/L",
    "Hedge PE Strike",
    "Hedge PE Premium",
    "Hedge PE Exit Price",
    "Hedge PE P/L",
    "Net Credit",
    "Total P/L",
];

const SNAPSHOT_HEADER: [&str; 12] = [
    "Date",
    "Timestamp",
    "Spot Price",
    "Short CE Strike",
    "Short CE Premium",
    "Hedge CE Strike",
    "Hedge CE Premium",
    "Short PE Strike",
    "Short PE Premium",
    "Hedge PE Strike",
    "Hedge PE Premium",
    "Net Credit",
];

/// Trade log backed by a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvTradeLog {
    path: PathBuf,
}

impl CsvTradeLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TradeLog for CsvTradeLog {
    fn append(&self, row: &TradeLogRow) -> Result<(), ExportError> {
        let fields = [
            row.date.format("%Y-%m-%d").to_string(),
            row.entry_time.format("%H:%M:%S").to_string(),
            row.spot_price.to_string(),
            row.short_call_strike.to_string(),
            row.short_call_entry.to_string(),
            row.short_call_sl.to_string(),
            row.short_call_exit.to_string(),
            row.short_call_pnl.to_string(),
            row.hedge_call_strike.to_string(),
            row.hedge_call_entry.to_string(),
            row.hedge_call_exit.to_string(),
            row.hedge_call_pnl.to_string(),
            row.short_put_strike.to_string(),
            row.short_put_entry.to_string(),
            row.short_put_sl.to_string(),
            row.short_put_exit.to_string(),
            row.short_put_pnl.to_string(),
            row.hedge_put_strike.to_string(),
            row.hedge_put_entry.to_string(),
            row.hedge_put_exit.to_string(),
            row.hedge_put_pnl.to_string(),
            row.net_credit.to_string(),
            row.total_pnl.to_string(),
        ];
        append_record(&self.path, &TRADE_LOG_HEADER, &fields)
    }
}

/// Snapshot log backed by a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvSnapshotLog {
    path: PathBuf,
}

impl CsvSnapshotLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends one capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    pub fn append(&self, row: &SnapshotRow) -> Result<(), ExportError> {
        let fields = [
            row.date.format("%Y-%m-%d").to_string(),
            row.captured_at.format("%H:%M:%S").to_string(),
            row.spot_price.to_string(),
            row.short_call_strike.to_string(),
            row.short_call_premium.to_string(),
            row.hedge_call_strike.to_string(),
            row.hedge_call_premium.to_string(),
            row.short_put_strike.to_string(),
            row.short_put_premium.to_string(),
            row.hedge_put_strike.to_string(),
            row.hedge_put_premium.to_string(),
            row.net_credit.to_string(),
        ];
        append_record(&self.path, &SNAPSHOT_HEADER, &fields)
    }
}

/// Opens the file for append, writing the header first when the file is new.
fn append_record(path: &Path, header: &[&str], fields: &[String]) -> Result<(), ExportError> {
    let is_new = !path.exists();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if is_new {
        writer.write_record(header)?;
    }
    writer.write_record(fields)?;
    writer.flush()?;

    debug!(path = %path.display(), "Appended record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_row() -> TradeLogRow {
        let date = NaiveDate::from_ymd_opt(2025, 9, 23).unwrap();
        TradeLogRow {
            date,
            entry_time: date.and_hms_opt(9, 20, 0).unwrap(),
            spot_price: dec!(48012.35),
            short_call_strike: 48300,
            short_call_entry: dec!(100.00),
            short_call_sl: dec!(125.0),
            short_call_exit: dec!(70.00),
            short_call_pnl: dec!(450.00),
            hedge_call_strike: 48800,
            hedge_call_entry: dec!(30.00),
            hedge_call_exit: dec!(10.00),
            hedge_call_pnl: dec!(-300.00),
            short_put_strike: 47700,
            short_put_entry: dec!(120.00),
            short_put_sl: dec!(150.0),
            short_put_exit: dec!(110.00),
            short_put_pnl: dec!(150.00),
            hedge_put_strike: 47200,
            hedge_put_entry: dec!(35.00),
            hedge_put_exit: dec!(20.00),
            hedge_put_pnl: dec!(-225.00),
            net_credit: dec!(155.00),
            total_pnl: dec!(75.00),
        }
    }

    fn make_snapshot() -> SnapshotRow {
        let date = NaiveDate::from_ymd_opt(2025, 9, 23).unwrap();
        SnapshotRow {
            date,
            captured_at: date.and_hms_opt(10, 41, 5).unwrap(),
            spot_price: dec!(48000),
            short_call_strike: 48300,
            short_call_premium: dec!(100.00),
            hedge_call_strike: 48800,
            hedge_call_premium: dec!(30.00),
            short_put_strike: 47700,
            short_put_premium: dec!(120.00),
            hedge_put_strike: 47200,
            hedge_put_premium: dec!(35.00),
            net_credit: dec!(155.00),
        }
    }

    #[test]
    fn writes_header_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade_log.csv");
        let log = CsvTradeLog::new(&path);

        log.append(&make_row()).unwrap();
        log.append(&make_row()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date,Entry Time,Spot Price,Short CE Strike"));
        assert!(lines[0].ends_with("Net Credit,Total P/L"));
        assert_eq!(lines[1], lines[2]);
        assert!(lines[1].starts_with("2025-09-23,09:20:00,48012.35,48300,100.00,125.0,70.00,450.00"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/trade_log.csv");
        let log = CsvTradeLog::new(&path);

        log.append(&make_row()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn appends_to_existing_file_without_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade_log.csv");

        CsvTradeLog::new(&path).append(&make_row()).unwrap();
        // a fresh handle must not re-detect the file as new
        CsvTradeLog::new(&path).append(&make_row()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("Date,Entry Time").count(), 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn snapshot_log_round_trips_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.csv");
        let log = CsvSnapshotLog::new(&path);

        log.append(&make_snapshot()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Date,Timestamp,Spot Price"));
        assert!(lines[0].ends_with("Net Credit"));
        assert_eq!(
            lines[1],
            "2025-09-23,10:41:05,48000,48300,100.00,48800,30.00,47700,120.00,47200,35.00,155.00"
        );
    }
}
