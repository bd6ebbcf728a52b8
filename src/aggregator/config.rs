//! Aggregator configuration.

use crate::reduce::AggregationMode;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between the first submission of a batch and its flush.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(1000);

/// Environment variable overriding the flush delay, in milliseconds.
pub const FLUSH_DELAY_ENV: &str = "BATCH_AGGREGATOR_FLUSH_DELAY_MS";

/// Environment variable selecting the aggregation mode (`positional` or `frequency`).
pub const MODE_ENV: &str = "BATCH_AGGREGATOR_MODE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    #[serde(rename = "flush_delay_ms", with = "duration_ms")]
    pub flush_delay: Duration,
    pub mode: AggregationMode,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_delay: DEFAULT_FLUSH_DELAY,
            mode: AggregationMode::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Defaults overridden by [`FLUSH_DELAY_ENV`] and [`MODE_ENV`] when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(FLUSH_DELAY_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                Error::configuration_with_context(
                    "invalid flush delay",
                    ErrorContext::new()
                        .with_field_path(FLUSH_DELAY_ENV)
                        .with_details(format!("expected integer milliseconds, got '{}'", raw))
                        .with_source("config"),
                )
            })?;
            cfg.flush_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup(MODE_ENV) {
            cfg.mode = raw.parse().map_err(|e: Error| {
                let details = e.context().and_then(|c| c.details.clone()).unwrap_or_default();
                Error::configuration_with_context(
                    "invalid aggregation mode",
                    ErrorContext::new()
                        .with_field_path(MODE_ENV)
                        .with_details(details)
                        .with_source("config"),
                )
            })?;
        }
        Ok(cfg)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AggregatorConfig::default();
        assert_eq!(cfg.flush_delay, Duration::from_millis(1000));
        assert_eq!(cfg.mode, AggregationMode::Positional);
    }

    #[test]
    fn test_builder() {
        let cfg = AggregatorConfig::new()
            .with_flush_delay(Duration::from_millis(250))
            .with_mode(AggregationMode::Frequency);
        assert_eq!(cfg.flush_delay, Duration::from_millis(250));
        assert_eq!(cfg.mode, AggregationMode::Frequency);
    }

    #[test]
    fn test_lookup_unset_keeps_defaults() {
        let cfg = AggregatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AggregatorConfig::default());
    }

    #[test]
    fn test_lookup_overrides() {
        let cfg = AggregatorConfig::from_lookup(lookup(&[
            (FLUSH_DELAY_ENV, "50"),
            (MODE_ENV, "frequency"),
        ]))
        .unwrap();
        assert_eq!(cfg.flush_delay, Duration::from_millis(50));
        assert_eq!(cfg.mode, AggregationMode::Frequency);
    }

    #[test]
    fn test_lookup_bad_delay() {
        let err = AggregatorConfig::from_lookup(lookup(&[(FLUSH_DELAY_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some(FLUSH_DELAY_ENV)
        );
    }

    #[test]
    fn test_lookup_bad_mode() {
        let err = AggregatorConfig::from_lookup(lookup(&[(MODE_ENV, "histogram")])).unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some(MODE_ENV)
        );
        assert!(err.to_string().contains("histogram"));
    }

    #[test]
    fn test_deserialize_partial() {
        let cfg: AggregatorConfig = serde_json::from_str(r#"{"flush_delay_ms": 20}"#).unwrap();
        assert_eq!(cfg.flush_delay, Duration::from_millis(20));
        assert_eq!(cfg.mode, AggregationMode::Positional);

        let json = serde_json::to_value(AggregatorConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({"flush_delay_ms": 1000, "mode": "positional"}));
    }
}
