use crate::error::{Error, Result};
use std::time::Duration;

/// Pool configuration, read once at pool creation and immutable for the
/// pool's lifetime.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum tasks admitted but not yet finished.
    pub queue_size: usize,
    /// Workers kept alive for the pool's lifetime.
    pub core_workers: usize,
    /// Upper bound on workers, core plus extra.
    pub max_workers: usize,
    /// Idle timeout after which workers above `core_workers` exit.
    pub keepalive: Duration,
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            queue_size: 200,
            core_workers: 2,
            max_workers: 10,
            keepalive: Duration::from_secs(5 * 60),
            thread_name_prefix: "invoker-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Read the four pool keys from a caller-supplied property lookup,
    /// falling back to the defaults for absent keys: `pool.queue` (200),
    /// `pool.core` (2), `pool.max` (10), `pool.keepalive` minutes (5).
    pub fn from_properties<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse(key: &str, raw: Option<String>, default: usize) -> Result<usize> {
            match raw {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| Error::config(format!("{}: invalid value {:?}", key, value))),
                None => Ok(default),
            }
        }

        let queue_size = parse("pool.queue", get("pool.queue"), 200)?;
        let core_workers = parse("pool.core", get("pool.core"), 2)?;
        let max_workers = parse("pool.max", get("pool.max"), 10)?;
        let keepalive_minutes = parse("pool.keepalive", get("pool.keepalive"), 5)?;

        let config = Self {
            queue_size,
            core_workers,
            max_workers,
            keepalive: Duration::from_secs(keepalive_minutes as u64 * 60),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_size == 0 {
            return Err(Error::config("queue_size must be > 0"));
        }
        if self.core_workers == 0 {
            return Err(Error::config("core_workers must be > 0"));
        }
        if self.max_workers < self.core_workers {
            return Err(Error::config("max_workers must be >= core_workers"));
        }
        if self.keepalive.is_zero() {
            return Err(Error::config("keepalive must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn queue_size(mut self, n: usize) -> Self {
        self.config.queue_size = n;
        self
    }

    pub fn core_workers(mut self, n: usize) -> Self {
        self.config.core_workers = n;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = n;
        self
    }

    pub fn keepalive(mut self, keepalive: Duration) -> Self {
        self.config.keepalive = keepalive;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.queue_size, 200);
        assert_eq!(config.core_workers, 2);
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.keepalive, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_max_below_core() {
        let result = PoolConfig::builder().core_workers(8).max_workers(4).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_queue() {
        let result = PoolConfig::builder().queue_size(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_properties_defaults_absent_keys() {
        let config = PoolConfig::from_properties(|_| None).unwrap();
        assert_eq!(config.queue_size, 200);
        assert_eq!(config.core_workers, 2);
    }

    #[test]
    fn test_from_properties_reads_keys() {
        let config = PoolConfig::from_properties(|key| match key {
            "pool.queue" => Some("16".to_string()),
            "pool.core" => Some("1".to_string()),
            "pool.max" => Some("4".to_string()),
            "pool.keepalive" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.queue_size, 16);
        assert_eq!(config.core_workers, 1);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.keepalive, Duration::from_secs(60));
    }

    #[test]
    fn test_from_properties_rejects_garbage() {
        let result = PoolConfig::from_properties(|key| {
            (key == "pool.max").then(|| "many".to_string())
        });
        assert!(result.is_err());
    }
}
