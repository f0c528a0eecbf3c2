//! Node configuration
//!
//! Tunables of a routing node: solver budget, event queue depth and the
//! stale request sweeper.

use router_runner::SolverConfig;
use std::time::Duration;

/// Node configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this node
    pub node_id: String,

    /// Wall-clock budget handed to every solver invocation
    pub solver_time_limit: Duration,

    /// Capacity of each command queue and of every job's event stream
    pub event_queue_size: usize,

    /// Age after which an active request with no progress is terminated
    ///
    /// Must exceed `solver_time_limit`, or the sweeper would end live jobs.
    pub stale_request_timeout: Duration,

    /// How often the sweeper looks for stale requests
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(node_id: String) -> Self {
        Self {
            node_id,
            solver_time_limit: Duration::from_secs(60),
            event_queue_size: 32,
            stale_request_timeout: Duration::from_secs(600), // 10 minutes
            sweep_interval: Duration::from_secs(60),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - NODE_ID (optional, default: random uuid)
    /// - SOLVER_TIME_LIMIT (optional, seconds, default: 60)
    /// - EVENT_QUEUE_SIZE (optional, default: 32)
    /// - STALE_REQUEST_TIMEOUT (optional, seconds, default: 600)
    /// - SWEEP_INTERVAL (optional, seconds, default: 60)
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let node_id = std::env::var("NODE_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.node_id);

        let solver_time_limit = env_secs("SOLVER_TIME_LIMIT").unwrap_or(defaults.solver_time_limit);

        let event_queue_size = std::env::var("EVENT_QUEUE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.event_queue_size);

        let stale_request_timeout =
            env_secs("STALE_REQUEST_TIMEOUT").unwrap_or(defaults.stale_request_timeout);

        let sweep_interval = env_secs("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval);

        let config = Self {
            node_id,
            solver_time_limit,
            event_queue_size,
            stale_request_timeout,
            sweep_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Overrides the solver budget
    pub fn with_solver_time_limit(mut self, limit: Duration) -> Self {
        self.solver_time_limit = limit;
        self
    }

    pub fn with_stale_request_timeout(mut self, timeout: Duration) -> Self {
        self.stale_request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node_id.is_empty() {
            anyhow::bail!("node_id cannot be empty");
        }

        if self.solver_time_limit.is_zero() {
            anyhow::bail!("solver_time_limit must be greater than 0");
        }

        if self.event_queue_size == 0 {
            anyhow::bail!("event_queue_size must be greater than 0");
        }

        if self.stale_request_timeout <= self.solver_time_limit {
            anyhow::bail!("stale_request_timeout must be greater than solver_time_limit");
        }

        if self.sweep_interval.is_zero() {
            anyhow::bail!("sweep_interval must be greater than 0");
        }

        Ok(())
    }

    /// Configuration handed to the solver manager
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.solver_time_limit)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.solver_time_limit, Duration::from_secs(60));
        assert_eq!(config.event_queue_size, 32);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(!config.node_id.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.node_id = String::new();
        assert!(config.validate().is_err());
        config.node_id = "node-1".to_string();

        config.event_queue_size = 0;
        assert!(config.validate().is_err());
        config.event_queue_size = 1;

        config.solver_time_limit = Duration::ZERO;
        assert!(config.validate().is_err());
        config.solver_time_limit = Duration::from_secs(1);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stale_timeout_must_exceed_solver_budget() {
        let config = Config::new("node".to_string())
            .with_solver_time_limit(Duration::from_secs(600))
            .with_stale_request_timeout(Duration::from_secs(5));
        assert!(config.validate().is_err());

        let config = config.with_stale_request_timeout(Duration::from_secs(600));
        assert!(config.validate().is_err());

        let config = config.with_stale_request_timeout(Duration::from_secs(601));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_solver_config_follows_time_limit() {
        let config = Config::new("node".to_string()).with_solver_time_limit(Duration::from_secs(7));
        assert_eq!(config.solver_config().time_limit, Duration::from_secs(7));
    }
}
