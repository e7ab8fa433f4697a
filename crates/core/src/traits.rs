use crate::types::{Quote, SecurityId};
use anyhow::Result;
use async_trait::async_trait;

/// Read-only market data access.
///
/// Errors are transport-level failures; an upstream that answered but had
/// no price reports `Quote::Unavailable` instead.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Last traded premium of an option contract.
    async fn option_ltp(&self, security_id: &SecurityId) -> Result<Quote>;

    /// Last traded level of a cash index.
    async fn index_ltp(&self, security_id: &SecurityId) -> Result<Quote>;
}
