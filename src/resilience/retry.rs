use std::fmt::Display;

use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::config::settings::RetryConfig;
use crate::utils::constants::DEFAULT_REFRESH_ATTEMPTS;

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_REFRESH_ATTEMPTS,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }
}

impl RetrySettings {
    pub fn from_config(retry: &Option<RetryConfig>) -> Self {
        let defaults = Self::default();
        Self {
            attempts: retry.as_ref().and_then(|r| r.attempts).unwrap_or(defaults.attempts).max(1),
            base_delay_ms: retry.as_ref().and_then(|r| r.base_delay_ms).unwrap_or(defaults.base_delay_ms),
            max_delay_ms: retry.as_ref().and_then(|r| r.max_delay_ms).unwrap_or(defaults.max_delay_ms),
        }
    }

    /// Doubled delay, capped at `max_delay_ms` (never below `base_delay_ms`)
    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms.max(self.base_delay_ms))
    }

    /// Run `operation` until it succeeds or `attempts` runs out; returns the last error.
    pub async fn run_with_retry<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    if delay > 0 {
                        sleep(Duration::from_millis(delay)).await;
                        delay = self.next_delay(delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!("all {attempt} attempts failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}
