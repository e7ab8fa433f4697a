//! Dhan HTTP market data client.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use strangle_core::{DhanConfig, MarketDataSource, Quote, SecurityId};

/// Market segment key for NSE derivatives in quote payloads.
const SEGMENT_FNO: &str = "NSE_FNO";
/// Market segment key for NSE indices in quote payloads.
const SEGMENT_INDEX: &str = "NSE_INDEX";

/// Quote API response. Prices are keyed by security id; a missing entry
/// means the feed had no price for it.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    ltp: Decimal,
}

pub struct DhanClient {
    http_client: reqwest::Client,
    api_url: String,
    client_id: String,
    access_token: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl DhanClient {
    #[must_use]
    pub fn new(config: &DhanConfig) -> Self {
        // Dhan allows 5 data API requests per second
        let quota = Quota::per_second(NonZeroU32::new(5).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http_client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            client_id: config.client_id.clone(),
            access_token: config.access_token.clone(),
            rate_limiter,
        }
    }

    /// Fetches the LTP of one security in `segment`.
    ///
    /// An HTTP-level or API-level rejection, and a payload without an entry
    /// for the security, all come back as `Quote::Unavailable`; only
    /// transport failures are errors.
    async fn ltp(&self, segment: &str, security_id: &SecurityId) -> Result<Quote> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/v2/marketfeed/ltp", self.api_url);
        let body = json!({ segment: [security_id.as_str()] });
        let response = self
            .http_client
            .post(&url)
            .header("access-token", &self.access_token)
            .header("client-id", &self.client_id)
            .json(&body)
            .send()
            .await?;

        let http_status = response.status();
        if !http_status.is_success() {
            warn!(security_id = %security_id, status = %http_status, "Quote request rejected");
            return Ok(Quote::Unavailable);
        }

        let payload: QuoteResponse = response.json().await?;
        Ok(quote_from_payload(&payload, security_id.as_str()))
    }
}

/// Extracts the quote for `security_id` from a response payload.
fn quote_from_payload(payload: &QuoteResponse, security_id: &str) -> Quote {
    if payload.status != "success" {
        warn!(api_status = %payload.status, "Quote response not successful");
        return Quote::Unavailable;
    }
    match payload.data.get(security_id) {
        Some(entry) => Quote::Known(entry.ltp),
        None => {
            warn!(security_id, "No entry for security in quote response");
            Quote::Unavailable
        }
    }
}

#[async_trait]
impl MarketDataSource for DhanClient {
    async fn option_ltp(&self, security_id: &SecurityId) -> Result<Quote> {
        self.ltp(SEGMENT_FNO, security_id).await
    }

    async fn index_ltp(&self, security_id: &SecurityId) -> Result<Quote> {
        self.ltp(SEGMENT_INDEX, security_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(raw: &str) -> QuoteResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn successful_payload_yields_known_quote() {
        let payload = parse(r#"{"status":"success","data":{"49081":{"ltp":101.55}}}"#);
        assert_eq!(
            quote_from_payload(&payload, "49081"),
            Quote::Known(dec!(101.55))
        );
    }

    #[test]
    fn failed_status_yields_unavailable() {
        let payload = parse(r#"{"status":"failure","data":{}}"#);
        assert_eq!(quote_from_payload(&payload, "49081"), Quote::Unavailable);
    }

    #[test]
    fn missing_security_entry_yields_unavailable() {
        let payload = parse(r#"{"status":"success","data":{"99999":{"ltp":5.0}}}"#);
        assert_eq!(quote_from_payload(&payload, "49081"), Quote::Unavailable);
    }

    #[test]
    fn entries_tolerate_extra_fields() {
        let payload = parse(
            r#"{"status":"success","data":{"25":{"ltp":48012.35,"volume":0}},"remarks":""}"#,
        );
        assert_eq!(
            quote_from_payload(&payload, "25"),
            Quote::Known(dec!(48012.35))
        );
    }
}
