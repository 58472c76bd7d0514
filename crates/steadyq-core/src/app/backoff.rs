//! Randomized delays for redial and restart.

use std::time::Duration;

use rand::Rng;
use tracing::info;

/// Uniform random delay in `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    pub const DEFAULT_MIN: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX: Duration = Duration::from_secs(15);

    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw one delay. A degenerate range (`min >= max`) always yields `min`.
    pub fn sample(&self) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if lo >= hi {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..hi))
    }

    pub async fn sleep(&self) {
        let delay = self.sample();
        info!("sleeping {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        let jitter = Jitter::from_secs(5, 15);
        for _ in 0..200 {
            let d = jitter.sample();
            assert!(d >= Duration::from_secs(5));
            assert!(d < Duration::from_secs(15));
        }
    }

    #[test]
    fn degenerate_range_yields_min() {
        let jitter = Jitter::new(Duration::from_millis(30), Duration::from_millis(30));
        assert_eq!(jitter.sample(), Duration::from_millis(30));

        let inverted = Jitter::new(Duration::from_millis(50), Duration::from_millis(10));
        assert_eq!(inverted.sample(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_waits_at_least_min() {
        let jitter = Jitter::new(Duration::from_millis(100), Duration::from_millis(200));
        let start = tokio::time::Instant::now();
        jitter.sleep().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
