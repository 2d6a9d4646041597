use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling budget for a single assistant run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiterConfig {
    pub poll_interval: Duration,
    /// Polls granted to the caller before it is told the run timed out
    pub max_attempts: u32,
    /// Consecutive transport failures tolerated before the run is declared failed
    pub max_consecutive_errors: u32,
    /// Extra polls after a timeout so a late completion is still persisted and broadcast
    pub late_completion_attempts: u32,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_attempts: 20,
            max_consecutive_errors: 3,
            late_completion_attempts: 120,
        }
    }
}

impl WaiterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_max_consecutive_errors(mut self, errors: u32) -> Self {
        self.max_consecutive_errors = errors;
        self
    }

    pub fn with_late_completion_attempts(mut self, attempts: u32) -> Self {
        self.late_completion_attempts = attempts;
        self
    }

    /// Worst-case latency seen by the caller
    pub fn caller_budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_ten_seconds() {
        assert_eq!(WaiterConfig::default().caller_budget(), Duration::from_secs(10));
    }
}
