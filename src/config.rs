// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Delay before a GonMap is reconciled again after a completed cycle
    pub requeue_interval: Duration,
    pub error_backoff: Duration,
    pub error_backoff_max: Duration,
    /// Delete owned ConfigMaps from namespaces that no longer match the selector
    pub prune_stale: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            requeue_interval: Duration::from_secs(defaults::REQUEUE_INTERVAL_SECS),
            error_backoff: Duration::from_secs(defaults::ERROR_BACKOFF_SECS),
            error_backoff_max: Duration::from_secs(defaults::ERROR_BACKOFF_MAX_SECS),
            prune_stale: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let secs = |key: &str, fallback: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, v)),
                None => Ok(fallback),
            }
        };

        let requeue_interval = secs("REQUEUE_INTERVAL_SECS", defaults.requeue_interval)?;
        let error_backoff = secs("ERROR_BACKOFF_SECS", defaults.error_backoff)?;
        let error_backoff_max = secs("ERROR_BACKOFF_MAX_SECS", defaults.error_backoff_max)?;

        let prune_stale = match lookup("PRUNE_STALE") {
            Some(v) => v
                .trim()
                .parse::<bool>()
                .with_context(|| format!("PRUNE_STALE must be true or false, got '{}'", v))?,
            None => defaults.prune_stale,
        };

        anyhow::ensure!(
            !requeue_interval.is_zero(),
            "REQUEUE_INTERVAL_SECS must be greater than zero"
        );

        Ok(Config {
            requeue_interval,
            error_backoff,
            error_backoff_max: error_backoff_max.max(error_backoff),
            prune_stale,
        })
    }
}
