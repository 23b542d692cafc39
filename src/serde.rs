//! # Serde module for EstimatorConfig
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `EstimatorConfig`, so estimator parameters can be loaded from configuration files.
//! Estimator state itself (sample set, round, history) is intentionally not serializable.
//!
//! `EstimatorConfig` is serialized as a map with `capacity`, `max_capacity`, `error_threshold`
//! and `history_limit` fields. During deserialization missing fields take their default values
//! and the result is validated, so an invalid configuration never reaches an estimator.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use serde::de::Error;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;

impl Serialize for EstimatorConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EstimatorConfig", 4)?;
        state.serialize_field("capacity", &self.capacity)?;
        state.serialize_field("max_capacity", &self.max_capacity)?;
        state.serialize_field("error_threshold", &self.error_threshold)?;
        state.serialize_field("history_limit", &self.history_limit)?;
        state.end()
    }
}

/// Unvalidated mirror of `EstimatorConfig` used during deserialization
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    capacity: usize,
    max_capacity: usize,
    error_threshold: f64,
    history_limit: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        let config = EstimatorConfig::default();
        Self {
            capacity: config.capacity,
            max_capacity: config.max_capacity,
            error_threshold: config.error_threshold,
            history_limit: config.history_limit,
        }
    }
}

impl<'de> Deserialize<'de> for EstimatorConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawConfig::deserialize(deserializer)?;
        let config = EstimatorConfig {
            capacity: raw.capacity,
            max_capacity: raw.max_capacity,
            error_threshold: raw.error_threshold,
            history_limit: raw.history_limit,
        };
        config.validate().map_err(D::Error::custom)?;
        Ok(config)
    }
}
