use crate::config::ThrottleConfig;
use std::time::Duration;
use tracing::trace;

/// Points in the pipeline where the bot waits before the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After each non-empty followers page
    Page,
    /// After every follow attempt, successful or not
    Follow,
    /// After skipping an account that is already followed
    Skip,
}

/// Pacing policy between API calls
#[allow(async_fn_in_trait)] // Internal trait for dependency injection in tests
pub trait Throttle {
    async fn pause(&self, pause: Pause);
}

/// Static delays, independent of rate-limit headers
#[derive(Debug, Clone)]
pub struct FixedThrottle {
    page: Duration,
    follow: Duration,
    skip: Duration,
}

impl FixedThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            page: config.page_delay(),
            follow: config.follow_delay(),
            skip: config.skip_delay(),
        }
    }

    pub fn delay(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Page => self.page,
            Pause::Follow => self.follow,
            Pause::Skip => self.skip,
        }
    }
}

impl Default for FixedThrottle {
    fn default() -> Self {
        Self::new(&ThrottleConfig::default())
    }
}

impl Throttle for FixedThrottle {
    async fn pause(&self, pause: Pause) {
        let delay = self.delay(pause);
        trace!("Pausing {:?} for {}ms", pause, delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
    async fn pause(&self, _pause: Pause) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_fixed_throttle_defaults() {
        let throttle = FixedThrottle::default();
        assert_eq!(throttle.delay(Pause::Page), Duration::from_secs(1));
        assert_eq!(throttle.delay(Pause::Follow), Duration::from_secs(2));
        assert_eq!(throttle.delay(Pause::Skip), Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_throttle_from_config() {
        let throttle = FixedThrottle::new(&ThrottleConfig {
            page_delay_ms: Some(10),
            follow_delay_ms: None,
            skip_delay_ms: Some(0),
        });
        assert_eq!(throttle.delay(Pause::Page), Duration::from_millis(10));
        assert_eq!(throttle.delay(Pause::Follow), Duration::from_secs(2));
        assert_eq!(throttle.delay(Pause::Skip), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_throttle_sleeps() {
        let throttle = FixedThrottle::default();
        let start = Instant::now();
        throttle.pause(Pause::Follow).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_no_delay_returns_immediately() {
        let start = std::time::Instant::now();
        for _ in 0..100 {
            NoDelay.pause(Pause::Follow).await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
