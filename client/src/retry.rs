//! Resubmission of transactions whose outcome a transport could not report.

use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result, TransportError},
};

/// Exponential backoff over transient [`TransportError`]s.
///
/// Verdicts on the transaction itself (a failed instruction, a missing
/// signature) are returned on the first attempt: resubmitting would only
/// repeat them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries
    pub max_retries: usize,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            multiplier: config.retry_multiplier,
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Runs `operation` until it succeeds, fails for good, or the retry
    /// budget is spent.
    pub fn run<T, F>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> std::result::Result<T, TransportError>,
    {
        let mut backoff = self.create_backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Attempt {} of {}", attempts, self.max_retries + 1);

            let error = match operation() {
                Ok(value) => {
                    if attempts > 1 {
                        debug!("Operation succeeded after {} attempts", attempts);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                debug!("Not retrying: {}", error);
                return Err(error.into());
            }

            if attempts > self.max_retries {
                warn!(
                    "Max retries ({}) exceeded. Last error: {}",
                    self.max_retries, error
                );
                return Err(ClientError::MaxRetriesExceeded {
                    retries: self.max_retries,
                    last: error,
                });
            }

            let Some(delay) = backoff.next_backoff() else {
                warn!("Backoff exhausted");
                return Err(ClientError::MaxRetriesExceeded {
                    retries: self.max_retries,
                    last: error,
                });
            };

            warn!(
                "Attempt {} failed: {}. Retrying in {:?}",
                attempts, error, delay
            );
            std::thread::sleep(delay);
        }
    }
}
