//! Pregel runtime configuration
//!
//! Configuration for the Pregel execution engine including
//! parallelism, superstep limits and timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pregel runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PregelConfig {
    /// Maximum supersteps per `start`/`resume` invocation
    pub max_supersteps: usize,

    /// Maximum concurrent vertex dispatches within a superstep
    pub parallelism: usize,

    /// Timeout for a single handler invocation
    #[serde(with = "humantime_serde")]
    pub vertex_timeout: Duration,

    /// Timeout for a whole `start`/`resume` invocation
    #[serde(with = "humantime_serde")]
    pub invocation_timeout: Duration,
}

impl Default for PregelConfig {
    fn default() -> Self {
        Self {
            max_supersteps: 100,
            parallelism: num_cpus::get(),
            vertex_timeout: Duration::from_secs(300),      // 5 min per handler
            invocation_timeout: Duration::from_secs(3600), // 1 hour per invocation
        }
    }
}

impl PregelConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum supersteps
    pub fn with_max_supersteps(mut self, max: usize) -> Self {
        self.max_supersteps = max;
        self
    }

    /// Set parallelism level
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set vertex timeout
    pub fn with_vertex_timeout(mut self, timeout: Duration) -> Self {
        self.vertex_timeout = timeout;
        self
    }

    /// Set invocation timeout
    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PregelConfig::default();
        assert_eq!(config.max_supersteps, 100);
        assert!(config.parallelism > 0);
        assert_eq!(config.vertex_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_config_builder() {
        let config = PregelConfig::new()
            .with_max_supersteps(50)
            .with_parallelism(4)
            .with_vertex_timeout(Duration::from_secs(60))
            .with_invocation_timeout(Duration::from_secs(120));

        assert_eq!(config.max_supersteps, 50);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.vertex_timeout, Duration::from_secs(60));
        assert_eq!(config.invocation_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_parallelism_minimum() {
        let config = PregelConfig::default().with_parallelism(0);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn test_humantime_serialization() {
        let config = PregelConfig::default().with_vertex_timeout(Duration::from_secs(90));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["vertex_timeout"], "1m 30s");

        let parsed: PregelConfig = serde_json::from_value(serde_json::json!({
            "max_supersteps": 7,
            "parallelism": 2,
            "vertex_timeout": "5s",
            "invocation_timeout": "10m",
        }))
        .unwrap();
        assert_eq!(parsed.max_supersteps, 7);
        assert_eq!(parsed.vertex_timeout, Duration::from_secs(5));
        assert_eq!(parsed.invocation_timeout, Duration::from_secs(600));
    }
}
