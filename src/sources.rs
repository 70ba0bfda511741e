//! Metric sources - fetch the current value of a metric from its quote endpoint

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::{MetricDefinition, MetricKind};

/// Troy ounce in grams, the gold endpoint quotes per ounce
pub const OZ_TO_GRAMS: f64 = 31.1034768;

/// Currency of the gold quote we convert to grams
const GOLD_CURRENCY: &str = "CNY";

/// Why a poll produced no usable value. The monitor treats every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("incomplete quote: {0}")]
    Incomplete(String),

    #[error("unusable value: {0}")]
    InvalidValue(f64),
}

#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, metric: &MetricDefinition) -> Result<f64, FetchError>;
}

/// Fetches quotes over HTTP and parses them according to the metric kind.
#[derive(Debug, Clone)]
pub struct HttpMetricSource {
    client: reqwest::Client,
}

impl HttpMetricSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    #[instrument(skip(self, metric), fields(metric = %metric.identifier))]
    async fn fetch(&self, metric: &MetricDefinition) -> Result<f64, FetchError> {
        trace!("requesting quote from {}", metric.url);

        let body = self.get_body(&metric.url).await?;

        let price = match metric.kind {
            MetricKind::Bitcoin => parse_bitcoin_quote(&body)?,
            MetricKind::Gold => parse_gold_quote(&body)?,
        };

        trace!("{} price: {price} {}", metric.identifier, metric.kind.unit());
        Ok(price)
    }
}

#[derive(Debug, Deserialize)]
struct BitcoinResponse {
    data: Option<BitcoinData>,
}

#[derive(Debug, Deserialize)]
struct BitcoinData {
    #[serde(rename = "1")]
    bitcoin: Option<BitcoinEntry>,
}

#[derive(Debug, Deserialize)]
struct BitcoinEntry {
    quote: Option<BitcoinQuote>,
}

#[derive(Debug, Deserialize)]
struct BitcoinQuote {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    #[serde(default)]
    last_updated: String,
    price: Option<f64>,
}

/// The widget endpoint answers with an empty `last_updated` when it has no quote
pub fn parse_bitcoin_quote(body: &str) -> Result<f64, FetchError> {
    let response: BitcoinResponse = serde_json::from_str(body)?;

    let quote = response
        .data
        .and_then(|data| data.bitcoin)
        .and_then(|entry| entry.quote)
        .and_then(|quote| quote.usd)
        .ok_or_else(|| FetchError::Incomplete("missing USD quote".into()))?;

    if quote.last_updated.is_empty() {
        return Err(FetchError::Incomplete("USD quote was never updated".into()));
    }

    let price = quote
        .price
        .ok_or_else(|| FetchError::Incomplete("USD quote has no price".into()))?;

    ensure_usable(price)
}

#[derive(Debug, Deserialize)]
struct GoldResponse {
    #[serde(default)]
    items: Vec<GoldItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoldItem {
    curr: String,
    xau_price: Option<f64>,
}

/// Gold price in CNY per gram
pub fn parse_gold_quote(body: &str) -> Result<f64, FetchError> {
    let response: GoldResponse = serde_json::from_str(body)?;

    let per_ounce = response
        .items
        .iter()
        .filter(|item| item.curr == GOLD_CURRENCY)
        .filter_map(|item| item.xau_price)
        .last()
        .ok_or_else(|| FetchError::Incomplete(format!("no {GOLD_CURRENCY} gold price")))?;

    ensure_usable(per_ounce / OZ_TO_GRAMS)
}

fn ensure_usable(value: f64) -> Result<f64, FetchError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FetchError::InvalidValue(value))
    }
}
