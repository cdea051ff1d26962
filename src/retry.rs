use std::time::Duration;

/// Bounded exponential backoff shared by token refresh and message delivery.
///
/// Retry `n` (1-based) waits `base_delay * 2^(n-1)`, so the default 2s base gives
/// 2s, 4s, 8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Token refresh: three retries after the first attempt.
    pub const fn token_refresh() -> Self {
        Self::new(3, Self::DEFAULT_BASE_DELAY)
    }

    /// Message send: two retries, three attempts in total.
    pub const fn message_send() -> Self {
        Self::new(2, Self::DEFAULT_BASE_DELAY)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    pub fn delays(&self) -> Vec<Duration> {
        (1..=self.max_retries).map(|retry| self.delay_for(retry)).collect()
    }

    pub async fn wait(&self, retry: u32) {
        tokio::time::sleep(self.delay_for(retry)).await;
    }
}
