//! Bounded retry with linear backoff for upstream calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::http_client::HttpErrorKind;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed {
        delay: Duration,
    },
    /// Delay grows with the attempt number: `base * attempt`.
    Linear {
        base: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            base: Duration::from_millis(2_000),
        }
    }
}

impl Backoff {
    /// Delay to wait after `attempt` (1-based) failed.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Linear { base } => base.saturating_mul(attempt.max(1)),
        }
    }
}

/// Failure signals the executor classifies on.
///
/// The executor never inspects the operation itself, only these signals.
pub trait RetrySignal {
    fn status(&self) -> Option<u16> {
        None
    }

    fn transport_kind(&self) -> Option<HttpErrorKind> {
        None
    }
}

/// Configuration for the retry executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// When false the operation runs exactly once, whatever `max_attempts` says.
    pub enabled: bool,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay schedule between attempts; nothing is waited after the last one.
    pub backoff: Backoff,
    /// HTTP statuses worth another attempt. Any other status fails at once.
    pub retry_on_status: Vec<u16>,
    /// Retry transport errors classified as [`HttpErrorKind::Timeout`].
    pub retry_on_timeout: bool,
    /// Retry transport errors classified as [`HttpErrorKind::ConnectionReset`].
    pub retry_on_reset: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            backoff: Backoff::default(),
            retry_on_status: vec![429, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_reset: true,
        }
    }
}

impl RetryConfig {
    pub fn linear(base: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear { base },
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    pub fn is_retryable<E: RetrySignal>(&self, error: &E) -> bool {
        if error
            .status()
            .is_some_and(|status| self.should_retry_status(status))
        {
            return true;
        }

        match error.transport_kind() {
            Some(HttpErrorKind::Timeout) => self.retry_on_timeout,
            Some(HttpErrorKind::ConnectionReset) => self.retry_on_reset,
            _ => false,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    fn attempt_budget(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Runs `operation` until it succeeds, fails non-retryably, or the attempt
    /// budget is spent. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetrySignal + Display,
    {
        let max_attempts = self.attempt_budget();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= max_attempts || !self.is_retryable(&error) {
                        return Err(error);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "upstream attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
