//! Configuration types for fleet sweeps

use std::time::Duration;

use crate::error::CoreError;

/// Reconnect policy of the post-action verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Session open attempts, including the first one
    pub max_attempts: u32,
    /// Delay before every attempt after the first
    pub backoff: Duration,
}

impl RetryBudget {
    /// Longest time spent sleeping when every attempt fails
    #[must_use]
    pub fn worst_case_wait(&self) -> Duration {
        self.backoff * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(20),
        }
    }
}

/// Fleet sweep configuration
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Wait after a reboot-triggering action before reconnecting
    pub settle_delay: Duration,
    /// Verifier reconnect policy
    pub retry: RetryBudget,
    /// Number of devices handled in parallel
    pub concurrency: usize,
    /// Disable SSH on every device once the update sweeps are done
    pub disable_remote_shell: bool,
}

impl FleetConfig {
    /// Reject settings the sweeps cannot run with
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` on zero attempts or zero concurrency
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.retry.max_attempts == 0 {
            return Err(CoreError::ConfigError(
                "verify attempts must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CoreError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(20),
            retry: RetryBudget::default(),
            concurrency: 1,
            disable_remote_shell: false,
        }
    }
}
