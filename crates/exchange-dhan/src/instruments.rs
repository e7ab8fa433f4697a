//! The instrument master: Dhan's daily scrip CSV, cached on disk, queried
//! in memory for symbol, expiry, and index resolution.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use strangle_core::SecurityId;

/// `SEM_EXM_EXCH_ID` value of NSE derivatives rows.
const DERIVATIVES_EXCHANGE: &str = "NSE_FNO";
/// `SEM_EXM_EXCH_ID` value of NSE cash-segment rows.
const CASH_EXCHANGE: &str = "NSE";
/// `SEM_EXCH_INSTRUMENT_TYPE` value of index options.
const INDEX_OPTION_TYPE: &str = "OPTIDX";

/// Prefix of the dated cache files under the cache directory.
const CACHE_FILE_PREFIX: &str = "scrip-master-";

/// Failures loading or querying the instrument master.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Scrip master download failed.
    #[error("scrip master download failed: {0}")]
    Download(#[from] reqwest::Error),
    /// Cache file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Scrip master CSV could not be parsed.
    #[error("scrip master parse failed: {0}")]
    Parse(#[from] csv::Error),
    /// No listed expiry on or after the requested date.
    #[error("no weekly expiry on or after {as_of} for {underlying}")]
    ExpiryNotFound {
        underlying: String,
        as_of: NaiveDate,
    },
    /// Distinct security ids survived an exact symbol match.
    #[error("{count} distinct security ids match {symbol}")]
    AmbiguousSymbol { symbol: String, count: usize },
}

/// One row of the scrip master, reduced to the columns the bot uses.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentRecord {
    #[serde(rename = "SEM_TRADING_SYMBOL")]
    pub trading_symbol: String,
    #[serde(rename = "SEM_EXM_EXCH_ID")]
    pub exchange: String,
    #[serde(rename = "SEM_EXCH_INSTRUMENT_TYPE")]
    pub instrument_type: String,
    #[serde(rename = "SEM_SMST_SECURITY_ID")]
    pub security_id: String,
    #[serde(rename = "SM_SYMBOL_NAME")]
    pub symbol_name: String,
    /// Blank for cash-segment rows; garbled values also become `None`.
    #[serde(rename = "SEM_EXPIRY_DATE", deserialize_with = "de_expiry", default)]
    pub expiry: Option<NaiveDate>,
}

fn de_expiry<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_expiry(&raw))
}

/// Expiry cells are inconsistently formatted across segments; anything
/// unparseable is treated as "no expiry".
fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    None
}

/// In-memory snapshot of one day's scrip master.
///
/// The snapshot is immutable for the duration of a run; it is never
/// refreshed mid-session.
#[derive(Debug, Clone)]
pub struct InstrumentCatalog {
    records: Vec<InstrumentRecord>,
}

impl InstrumentCatalog {
    /// Parses a scrip master CSV.
    ///
    /// Rows missing the needed columns are skipped rather than failing the
    /// whole file; the master carries many segments the bot never touches.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV itself cannot be read.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in csv_reader.records() {
            let record = result?;
            match record.deserialize::<InstrumentRecord>(Some(&headers)) {
                Ok(instrument) => records.push(instrument),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "Skipped scrip master rows missing columns");
        }

        Ok(Self { records })
    }

    /// Parses the scrip master CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn from_csv_path(path: &Path) -> Result<Self, CatalogError> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolves an option trading symbol to its security id.
    ///
    /// The match is exact on symbol, derivatives exchange, and index-option
    /// instrument type. Duplicate rows agreeing on one id resolve to it; no
    /// match is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousSymbol` when matching rows carry distinct ids.
    pub fn resolve_option(&self, symbol: &str) -> Result<Option<SecurityId>, CatalogError> {
        let ids: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| {
                r.trading_symbol == symbol
                    && r.exchange == DERIVATIVES_EXCHANGE
                    && r.instrument_type == INDEX_OPTION_TYPE
            })
            .map(|r| r.security_id.as_str())
            .collect();

        let count = ids.len();
        let mut iter = ids.into_iter();
        match (iter.next(), iter.next()) {
            (Some(id), None) => Ok(Some(SecurityId(id.to_string()))),
            (Some(_), Some(_)) => Err(CatalogError::AmbiguousSymbol {
                symbol: symbol.to_string(),
                count,
            }),
            _ => Ok(None),
        }
    }

    /// Earliest listed option expiry on or after `as_of` for `underlying`.
    ///
    /// # Errors
    ///
    /// Returns `ExpiryNotFound` when no future expiry is listed.
    pub fn nearest_weekly_expiry(
        &self,
        underlying: &str,
        as_of: NaiveDate,
    ) -> Result<NaiveDate, CatalogError> {
        self.records
            .iter()
            .filter(|r| {
                r.symbol_name == underlying
                    && r.exchange == DERIVATIVES_EXCHANGE
                    && r.instrument_type == INDEX_OPTION_TYPE
            })
            .filter_map(|r| r.expiry)
            .filter(|expiry| *expiry >= as_of)
            .min()
            .ok_or_else(|| CatalogError::ExpiryNotFound {
                underlying: underlying.to_string(),
                as_of,
            })
    }

    /// Security id of the cash-segment index row for `underlying`.
    ///
    /// The master is inconsistent about case and padding in index names, so
    /// the match trims and ignores case.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousSymbol` when matching rows carry distinct ids.
    pub fn resolve_index(&self, underlying: &str) -> Result<Option<SecurityId>, CatalogError> {
        let needle = underlying.trim().to_uppercase();
        let ids: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| {
                r.exchange.trim() == CASH_EXCHANGE
                    && r.symbol_name.trim().to_uppercase() == needle
            })
            .map(|r| r.security_id.as_str())
            .collect();

        let count = ids.len();
        let mut iter = ids.into_iter();
        match (iter.next(), iter.next()) {
            (Some(id), None) => Ok(Some(SecurityId(id.to_string()))),
            (Some(_), Some(_)) => Err(CatalogError::AmbiguousSymbol {
                symbol: underlying.to_string(),
                count,
            }),
            _ => Ok(None),
        }
    }

    /// Rows whose symbol name contains `needle`, case-insensitively. Used
    /// by the instruments debug command.
    #[must_use]
    pub fn rows_matching_name(&self, needle: &str) -> Vec<&InstrumentRecord> {
        let needle = needle.to_uppercase();
        self.records
            .iter()
            .filter(|r| r.symbol_name.to_uppercase().contains(&needle))
            .collect()
    }
}

/// Source of the day's instrument catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The catalog snapshot for `date`.
    async fn catalog_for(&self, date: NaiveDate) -> Result<InstrumentCatalog, CatalogError>;
}

/// Downloads the scrip master once per day and caches it on disk.
///
/// A cache hit reads the dated file; a miss sweeps stale cache files, then
/// downloads and writes the new one before parsing.
pub struct DailyCatalogStore {
    http_client: reqwest::Client,
    url: String,
    cache_dir: PathBuf,
}

impl DailyCatalogStore {
    #[must_use]
    pub fn new(url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
            cache_dir: cache_dir.into(),
        }
    }

    fn cache_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir
            .join(format!("{CACHE_FILE_PREFIX}{date}.csv"))
    }

    /// Removes cache files left over from previous days.
    fn sweep_stale(&self, keep: &Path) {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == keep {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CACHE_FILE_PREFIX) && name.ends_with(".csv") {
                match fs::remove_file(&path) {
                    Ok(()) => debug!(path = %path.display(), "Removed stale scrip master"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to remove stale scrip master");
                    }
                }
            }
        }
    }

    async fn download(&self) -> Result<String, CatalogError> {
        info!(url = self.url, "Downloading scrip master");
        let body = self
            .http_client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl CatalogSource for DailyCatalogStore {
    async fn catalog_for(&self, date: NaiveDate) -> Result<InstrumentCatalog, CatalogError> {
        let path = self.cache_path(date);
        if path.exists() {
            debug!(path = %path.display(), "Reading cached scrip master");
            return InstrumentCatalog::from_csv_path(&path);
        }

        fs::create_dir_all(&self.cache_dir)?;
        self.sweep_stale(&path);

        let body = self.download().await?;
        fs::write(&path, &body)?;
        info!(path = %path.display(), "Cached scrip master for the day");

        InstrumentCatalog::from_reader(body.as_bytes())
    }
}
