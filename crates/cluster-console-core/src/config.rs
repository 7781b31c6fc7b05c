// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven settings for embedding the command layer.

use std::collections::HashMap;
use std::env;

use tracing::Level;

use crate::feature_flags::{Feature, FeatureFlagsProvider, UnknownFeature};

/// Region used for cluster-scoped API routes.
const ENV_REGION: &str = "CLUSTER_CONSOLE_REGION";
/// Extra feature flags, as a JSON array or a comma-separated list.
const ENV_ADDITIONAL_FEATURES: &str = "CLUSTER_CONSOLE_ADDITIONAL_FEATURES";
/// Log level requested by the embedder.
const ENV_LOG_LEVEL: &str = "CLUSTER_CONSOLE_LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "info";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    UnknownFeature(#[from] UnknownFeature),
}

/// Settings captured from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEnv {
    pub region: Option<String>,
    /// Raw feature names; checked by [`validate`](Self::validate).
    pub additional_features: Vec<String>,
    /// Level for the embedder's subscriber; the library never installs one.
    /// See [`tracing_level`](Self::tracing_level).
    pub log_level: String,
}

impl Default for ConsoleEnv {
    fn default() -> Self {
        Self {
            region: None,
            additional_features: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ConsoleEnv {
    pub fn from_os_env() -> Result<Self, ConfigError> {
        Self::from_env_iter(env::vars())
    }

    /// Builds settings from key/value pairs (typically for tests).
    pub fn from_env_iter<I, K, V>(iter: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let region = map
            .get(ENV_REGION)
            .and_then(|value| sanitize_non_empty(value));
        let additional_features = map
            .get(ENV_ADDITIONAL_FEATURES)
            .map(|value| parse_feature_list(value))
            .transpose()?
            .unwrap_or_default();
        let log_level = map
            .get(ENV_LOG_LEVEL)
            .and_then(|value| sanitize_non_empty(value))
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let config = Self {
            region,
            additional_features,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        self.features()?;
        Ok(())
    }

    /// Parsed additional features.
    pub fn features(&self) -> Result<Vec<Feature>, ConfigError> {
        self.additional_features
            .iter()
            .map(|name| name.parse::<Feature>().map_err(ConfigError::from))
            .collect()
    }

    /// Feature gate seeded with the configured additional features.
    pub fn feature_flags(&self) -> Result<FeatureFlagsProvider, ConfigError> {
        Ok(FeatureFlagsProvider::new().with_additional_features(self.features()?))
    }

    /// `log_level` as a [`Level`], for building the embedder's subscriber.
    ///
    /// Falls back to `INFO` for a level that did not pass validation.
    pub fn tracing_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    /// Region to use when none is known from the cluster itself; empty when unset.
    pub fn region_or_unknown(&self) -> &str {
        self.region.as_deref().unwrap_or("")
    }
}

fn parse_feature_list(value: &str) -> Result<Vec<String>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed).map_err(|err| {
            ConfigError::Invalid(format!("{ENV_ADDITIONAL_FEATURES} is not a JSON list: {err}"))
        });
    }
    Ok(trimmed
        .split(',')
        .filter_map(sanitize_non_empty)
        .collect())
}

fn sanitize_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
