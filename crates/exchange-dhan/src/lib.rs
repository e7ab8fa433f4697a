//! Dhan broker integration.
//!
//! Three concerns live here:
//! - The quote client (`DhanClient`) for option and index LTPs
//! - The instrument master: daily download-or-cache plus in-memory lookups
//! - Trading-symbol construction for index options

pub mod client;
pub mod instruments;
pub mod symbols;

pub use client::DhanClient;
pub use instruments::{
    CatalogError, CatalogSource, DailyCatalogStore, InstrumentCatalog, InstrumentRecord,
};
pub use symbols::option_symbol;
