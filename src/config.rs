// src/config.rs
use anyhow::{bail, Context, Result};
use chrono::Duration;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::update_policy::DEFAULT_STALENESS_DAYS;

/// One week.
const MAX_CACHE_TTL_MINUTES: i64 = 7 * 24 * 60;
const MAX_STALENESS_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub history_file: String,
    pub risk_free_rate: f64,
    pub staleness_days: i64,
    pub cache_ttl_minutes: i64,
    pub refresh_schedule: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3030,
            data_dir: PathBuf::from("data"),
            history_file: "historical_fund_data.csv".to_string(),
            risk_free_rate: 0.0,
            staleness_days: DEFAULT_STALENESS_DAYS,
            cache_ttl_minutes: 60,
            refresh_schedule: "0 0 23 * * *".to_string(),
        }
    }
}

/// Reads `key` through `lookup`; unset falls back to `default` with a warning.
fn setting<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => {
            warn!("${} not set, defaulting to {:?}", key, default);
            Ok(default)
        }
    }
}

impl AppConfig {
    /// Environment (after `.env`) with defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let d = AppConfig::default();
        let config = AppConfig {
            port: setting(&lookup, "PORT", d.port)?,
            data_dir: setting(&lookup, "DATA_DIR", d.data_dir)?,
            history_file: setting(&lookup, "HISTORY_FILE", d.history_file)?,
            risk_free_rate: setting(&lookup, "RISK_FREE_RATE", d.risk_free_rate)?,
            staleness_days: setting(&lookup, "STALENESS_DAYS", d.staleness_days)?,
            cache_ttl_minutes: setting(&lookup, "CACHE_TTL_MINUTES", d.cache_ttl_minutes)?,
            refresh_schedule: setting(&lookup, "REFRESH_SCHEDULE", d.refresh_schedule)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            bail!("RISK_FREE_RATE must be a finite number, got {}", self.risk_free_rate);
        }
        if !(0..=MAX_CACHE_TTL_MINUTES).contains(&self.cache_ttl_minutes) {
            bail!(
                "CACHE_TTL_MINUTES must be within [0, {}], got {}",
                MAX_CACHE_TTL_MINUTES,
                self.cache_ttl_minutes
            );
        }
        if !(0..=MAX_STALENESS_DAYS).contains(&self.staleness_days) {
            bail!(
                "STALENESS_DAYS must be within [0, {}], got {}",
                MAX_STALENESS_DAYS,
                self.staleness_days
            );
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(self.cache_ttl_minutes)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.data_dir.join("portfolios")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.history_path(),
            PathBuf::from("data").join("historical_fund_data.csv")
        );
    }

    #[test]
    fn overrides_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATA_DIR", "/var/lib/planner"),
            ("RISK_FREE_RATE", "0.04"),
            ("STALENESS_DAYS", "7"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/planner"));
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.staleness_days, 7);
        assert_eq!(config.cache_ttl_minutes, 60);
    }

    #[test]
    fn invalid_number_is_an_error() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn out_of_range_values_are_errors() {
        for (key, value) in [
            ("CACHE_TTL_MINUTES", "-5"),
            ("CACHE_TTL_MINUTES", "9223372036854775807"),
            ("STALENESS_DAYS", "-1"),
            ("RISK_FREE_RATE", "NaN"),
            ("RISK_FREE_RATE", "inf"),
        ] {
            assert!(
                AppConfig::from_lookup(lookup(&[(key, value)])).is_err(),
                "{}={} accepted",
                key,
                value
            );
        }
        let config = AppConfig::from_lookup(lookup(&[("CACHE_TTL_MINUTES", "0")])).unwrap();
        assert_eq!(config.cache_ttl(), Duration::zero());
    }
}
