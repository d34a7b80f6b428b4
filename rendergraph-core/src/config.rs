//! Render Configuration
//!
//! The engine takes an explicit [`RenderConfig`] at construction. Nothing in
//! the engine looks at the process environment; callers that want the
//! environment-driven behaviour opt in with [`RenderConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable enabling pooled dispatch.
pub const ENV_CONCURRENT: &str = "RENDER_VARIABLES_ASYNC";

/// Environment variable bounding the worker pool.
pub const ENV_MAX_WORKERS: &str = "RENDER_ASYNC_MAX_WORKERS";

/// Default upper bound on pool workers.
pub const DEFAULT_MAX_WORKERS: usize = 50;

/// How edge groups are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Run edge groups on a worker pool instead of in sequence.
    pub concurrent: bool,

    /// Upper bound on the number of pool workers.
    pub max_workers: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            concurrent: false,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl RenderConfig {
    /// Sequential dispatch.
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Pooled dispatch with at most `max_workers` workers.
    pub fn concurrent(max_workers: usize) -> Self {
        Self {
            concurrent: true,
            max_workers,
        }
    }

    /// Build a config from `RENDER_VARIABLES_ASYNC` and
    /// `RENDER_ASYNC_MAX_WORKERS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// lookup, so tests don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CONCURRENT) {
            config.concurrent = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: ENV_CONCURRENT,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(ENV_MAX_WORKERS) {
            config.max_workers = value.trim().parse().map_err(|_| {
                ConfigError::InvalidWorkerCount {
                    var: ENV_MAX_WORKERS,
                    value: value.clone(),
                }
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the dispatcher cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_sequential_with_fifty_workers() {
        let config = RenderConfig::default();
        assert!(!config.concurrent);
        assert_eq!(config.max_workers, 50);
    }

    #[test]
    fn missing_variables_keep_defaults() {
        let config = RenderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn reads_both_variables() {
        let config = RenderConfig::from_lookup(lookup(&[
            (ENV_CONCURRENT, "True"),
            (ENV_MAX_WORKERS, "8"),
        ]))
        .unwrap();
        assert_eq!(config, RenderConfig::concurrent(8));
    }

    #[test]
    fn rejects_garbage() {
        let err = RenderConfig::from_lookup(lookup(&[(ENV_CONCURRENT, "yes please")]));
        assert!(matches!(err, Err(ConfigError::InvalidBool { .. })));

        let err = RenderConfig::from_lookup(lookup(&[(ENV_MAX_WORKERS, "-3")]));
        assert!(matches!(err, Err(ConfigError::InvalidWorkerCount { .. })));

        let err = RenderConfig::from_lookup(lookup(&[(ENV_MAX_WORKERS, "0")]));
        assert_eq!(err, Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn deserializes_with_field_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"concurrent": true}"#).unwrap();
        assert_eq!(config, RenderConfig::concurrent(DEFAULT_MAX_WORKERS));
    }
}
