//! Idempotency configuration.

use std::time::Duration;

/// Lease and wait settings.
#[derive(Debug, Clone)]
pub struct IdempotencyConfig {
    /// A pending lease older than this may be reclaimed.
    pub lease_ttl: Duration,
    /// How long a caller waits on another caller's lease.
    pub wait_timeout: Duration,
    /// Delay between polls while waiting.
    pub poll_interval: Duration,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl IdempotencyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("LANDED_IDEMPOTENCY_LEASE_SECS") {
            if let Ok(secs) = secs.parse() {
                config.lease_ttl = Duration::from_secs(secs);
            }
        }

        if let Ok(ms) = std::env::var("LANDED_IDEMPOTENCY_WAIT_MS") {
            if let Ok(ms) = ms.parse() {
                config.wait_timeout = Duration::from_millis(ms);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.lease_ttl.is_zero() {
            return Err("Lease TTL cannot be 0".to_string());
        }

        if self.poll_interval.is_zero() {
            return Err("Poll interval cannot be 0".to_string());
        }

        if self.poll_interval > self.wait_timeout {
            return Err("Poll interval cannot exceed wait timeout".to_string());
        }

        Ok(())
    }

    /// Lease TTL as a wall-clock span for comparing `locked_at` stamps.
    pub fn lease_span(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lease_ttl).unwrap_or_else(|_| chrono::Duration::days(36_500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = IdempotencyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lease_span(), chrono::Duration::seconds(30));
    }

    #[test]
    fn test_validate_rejects_zero_lease() {
        let config = IdempotencyConfig {
            lease_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
