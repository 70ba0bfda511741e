//! Helper types and functions for integration tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use xmonitor::{
    MetricDefinition, MetricKind,
    actors::day_boundary::Clock,
    alerts::{NotificationMessage, Notifier, SendError},
    config::{Config, EmailConfig, MetricConfig},
    sources::{FetchError, MetricSource},
};

/// Metric source replaying a fixed list of results, failing once the list is exhausted
#[derive(Debug, Default)]
pub struct ScriptedSource {
    readings: Mutex<VecDeque<Result<f64, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(readings: Vec<Result<f64, FetchError>>) -> Self {
        Self {
            readings: Mutex::new(readings.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Ok).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    async fn fetch(&self, _metric: &MetricDefinition) -> Result<f64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.readings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Incomplete("no more readings".into())))
    }
}

/// Notifier recording every message it was asked to deliver
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<NotificationMessage>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the attempt but reports every delivery as failed
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<NotificationMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), SendError> {
        self.messages.lock().unwrap().push(message.clone());

        if self.failing {
            Err(SendError::Build("mail server unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Wall clock driven by tokio's (pausable) clock, starting at `base`
#[derive(Debug)]
pub struct VirtualClock {
    base: DateTime<Local>,
    started: tokio::time::Instant,
}

impl VirtualClock {
    pub fn starting_at(base: DateTime<Local>) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = tokio::time::Instant::now() - self.started;
        self.base + chrono::Duration::from_std(elapsed).unwrap()
    }
}

pub fn local_time(day: u32, h: u32, m: u32, s: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 1, day, h, m, s)
        .earliest()
        .unwrap()
}

pub fn metric_config(kind: MetricKind, upper_limit: f64, lower_limit: f64) -> MetricConfig {
    MetricConfig {
        kind,
        name: None,
        upper_limit,
        lower_limit,
        interval: None,
        url: None,
    }
}

pub fn create_test_config(metrics: Vec<MetricConfig>) -> Config {
    Config {
        metrics,
        email: EmailConfig {
            from: "monitor@example.com".to_string(),
            authorization: None,
            host: "smtp.example.com".to_string(),
            port: 465,
            mail_to: vec!["ops@example.com".to_string()],
            subject: "xmonitor report !".to_string(),
        },
        poll_interval: 180,
        reset_time: NaiveTime::MIN,
    }
}

pub fn bitcoin_definition(url: &str) -> MetricDefinition {
    MetricDefinition {
        identifier: "bitcoin".to_string(),
        kind: MetricKind::Bitcoin,
        upper_limit: 100000.0,
        lower_limit: 10000.0,
        poll_interval: std::time::Duration::from_secs(180),
        url: url.to_string(),
    }
}

pub fn gold_definition(url: &str) -> MetricDefinition {
    MetricDefinition {
        identifier: "gold".to_string(),
        kind: MetricKind::Gold,
        upper_limit: 3000.0,
        lower_limit: 1800.0,
        poll_interval: std::time::Duration::from_secs(180),
        url: url.to_string(),
    }
}

pub fn bitcoin_quote_json(price: f64) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "1": {
                "id": 1,
                "name": "Bitcoin",
                "quote": {
                    "USD": {
                        "last_updated": "2024-01-15T10:00:00.000Z",
                        "market_cap": 800000000000.0,
                        "percent_change_1h": 0.1,
                        "percent_change_24h": -1.2,
                        "percent_change_7d": 3.4,
                        "price": price,
                        "volume_24h": 20000000000.0
                    }
                }
            }
        },
        "status": { "error_code": 0 }
    })
}

pub fn gold_quote_json(cny_per_ounce: f64) -> serde_json::Value {
    serde_json::json!({
        "ts": 1705312800000u64,
        "items": [
            { "curr": "USD", "xauPrice": 2050.0, "xagPrice": 23.1, "chgXau": 1.0, "xauClose": 2049.0 },
            { "curr": "CNY", "xauPrice": cny_per_ounce, "xagPrice": 165.0, "chgXau": 7.0, "xauClose": 14700.0 }
        ]
    })
}
