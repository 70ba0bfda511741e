pub mod actors;
pub mod alerts;
pub mod config;
pub mod sources;
pub mod util;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const BITCOIN_URL: &str =
    "https://3rdparty-apis.coinmarketcap.com/v1/cryptocurrency/widget?id=1&convert=BTC,USD,USD";

const GOLD_URL: &str = "https://data-asg.goldprice.org/dbXRates/USD,CNY";

/// The closed set of metrics the monitor knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Bitcoin spot price in USD
    Bitcoin,
    /// Gold spot price in CNY per gram
    Gold,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Bitcoin => "bitcoin",
            MetricKind::Gold => "gold",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            MetricKind::Bitcoin => BITCOIN_URL,
            MetricKind::Gold => GOLD_URL,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Bitcoin => "USD",
            MetricKind::Gold => "CNY/g",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved, immutable description of one monitored metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub identifier: String,
    pub kind: MetricKind,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub poll_interval: Duration,
    pub url: String,
}

impl MetricDefinition {
    /// Both bounds are inclusive.
    pub fn is_breached(&self, value: f64) -> bool {
        value >= self.upper_limit || value <= self.lower_limit
    }
}

/// A single sample of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub timestamp: DateTime<Local>,
    pub valid: bool,
}

impl Reading {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            timestamp: Local::now(),
            // prices are strictly positive, a zero means the upstream left the field unset
            valid: value.is_finite() && value > 0.0,
        }
    }
}
