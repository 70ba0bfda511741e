use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use tracing::trace;

use crate::{MetricDefinition, MetricKind};

/// Errors raised while loading the configuration. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,

    pub email: EmailConfig,

    /// Seconds between two polls of the same metric
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Local wall-clock time at which the alert gates are reset. Accepts a TOML local time
    /// (`06:30:00`) or the same value as a string.
    #[serde(default = "default_reset_time", deserialize_with = "deserialize_reset_time")]
    pub reset_time: NaiveTime,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MetricConfig {
    pub kind: MetricKind,
    pub name: Option<String>,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub interval: Option<u64>,
    pub url: Option<String>,
}

impl MetricConfig {
    pub fn identifier(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_string())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub authorization: Option<String>,
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub mail_to: Vec<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_poll_interval() -> u64 {
    180
}

fn default_reset_time() -> NaiveTime {
    NaiveTime::MIN
}

fn deserialize_reset_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ResetTimeVisitor;

    impl<'de> serde::de::Visitor<'de> for ResetTimeVisitor {
        type Value = NaiveTime;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a local time such as 06:30:00")
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse().map_err(E::custom)
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            use serde::Deserialize;
            use serde::de::Error;

            let datetime = toml::value::Datetime::deserialize(
                serde::de::value::MapAccessDeserializer::new(map),
            )?;
            if datetime.date.is_some() || datetime.offset.is_some() {
                return Err(A::Error::custom(format!(
                    "expected a local time without date or offset, got {datetime}"
                )));
            }
            self.visit_str(&datetime.to_string())
        }
    }

    deserializer.deserialize_any(ResetTimeVisitor)
}

fn default_smtp_port() -> u16 {
    465
}

fn default_subject() -> String {
    String::from("xmonitor report !")
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid("no metrics configured".into()));
        }

        if self.poll_interval == 0 {
            return Err(ConfigError::Invalid("poll_interval must be positive".into()));
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            let identifier = metric.identifier();

            if !seen.insert(identifier.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate metric identifier '{identifier}'"
                )));
            }

            if !metric.upper_limit.is_finite() || !metric.lower_limit.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{identifier}: limits must be finite numbers"
                )));
            }

            if metric.lower_limit >= metric.upper_limit {
                return Err(ConfigError::Invalid(format!(
                    "{identifier}: lower_limit ({}) must be below upper_limit ({})",
                    metric.lower_limit, metric.upper_limit
                )));
            }

            if metric.interval == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "{identifier}: interval must be positive"
                )));
            }
        }

        if self.email.mail_to.is_empty() {
            return Err(ConfigError::Invalid("email.mail_to is empty".into()));
        }

        Ok(())
    }

    /// Resolve the per-metric settings against the global defaults.
    pub fn definitions(&self) -> Vec<MetricDefinition> {
        self.metrics
            .iter()
            .map(|metric| MetricDefinition {
                identifier: metric.identifier(),
                kind: metric.kind,
                upper_limit: metric.upper_limit,
                lower_limit: metric.lower_limit,
                poll_interval: Duration::from_secs(metric.interval.unwrap_or(self.poll_interval)),
                url: metric
                    .url
                    .clone()
                    .unwrap_or_else(|| metric.kind.default_url().to_string()),
            })
            .collect()
    }
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
        .inspect(|config| trace!("loaded config with {} metric(s)", config.metrics.len()))
}
