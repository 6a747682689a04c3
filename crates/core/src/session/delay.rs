//! Randomized and fixed pacing between automation actions.

use rand::Rng;
use std::time::Duration;

use super::config::SmartDelayConfig;

/// The fixed pauses of the delay profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    UploadAfter,
    InputAfter,
    ClickAfter,
}

/// Delay profile used between actions and between items.
#[derive(Debug, Clone, Default)]
pub struct SmartDelay {
    config: SmartDelayConfig,
}

impl SmartDelay {
    pub fn new(config: SmartDelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmartDelayConfig {
        &self.config
    }

    /// A uniform duration in `[min_delay, max_delay]`.
    ///
    /// An inverted range collapses to `min_delay`.
    pub fn random(&self) -> Duration {
        let min = self.config.min_delay.max(0.0);
        let max = self.config.max_delay.max(min);
        if max <= min {
            return Duration::from_secs_f64(min);
        }
        let secs = rand::thread_rng().gen_range(min..=max);
        Duration::from_secs_f64(secs)
    }

    /// One of the fixed pauses.
    pub fn fixed(&self, kind: DelayKind) -> Duration {
        let secs = match kind {
            DelayKind::UploadAfter => self.config.upload_after,
            DelayKind::InputAfter => self.config.input_after,
            DelayKind::ClickAfter => self.config.click_after,
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Sleeps for one of the fixed pauses.
    pub async fn pause(&self, kind: DelayKind) {
        let duration = self.fixed(kind);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_within_range() {
        let delay = SmartDelay::new(SmartDelayConfig::default().with_range(0.5, 1.5));
        for _ in 0..100 {
            let d = delay.random();
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_random_inverted_range_clamps() {
        let delay = SmartDelay::new(SmartDelayConfig::default().with_range(3.0, 1.0));
        assert_eq!(delay.random(), Duration::from_secs(3));
    }

    #[test]
    fn test_fixed_delays() {
        let delay = SmartDelay::default();
        assert_eq!(delay.fixed(DelayKind::UploadAfter), Duration::from_secs(2));
        assert_eq!(delay.fixed(DelayKind::InputAfter), Duration::from_secs(1));
        assert_eq!(delay.fixed(DelayKind::ClickAfter), Duration::from_millis(1500));
    }

    #[test]
    fn test_none_profile_is_zero() {
        let delay = SmartDelay::new(SmartDelayConfig::none());
        assert!(delay.random().is_zero());
        assert!(delay.fixed(DelayKind::ClickAfter).is_zero());
    }
}
