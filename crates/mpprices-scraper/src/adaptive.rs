//! Adaptive request pacing driven by anti-bot feedback.
//!
//! Every blocked response stretches the delay by `increase_factor`. After
//! `success_threshold` successes in a row it shrinks by `decrease_factor`.
//! The delay always stays inside `[min_delay, max_delay]`.

use std::time::Duration;

/// Snapshot of [`AdaptiveDelayer`] counters for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayStats {
    pub current_delay: Duration,
    pub total_requests: u64,
    pub total_blocks: u64,
    pub block_streak: u32,
    pub success_count: u32,
    /// Percentage of requests that were not blocked; `0.0` before any request.
    pub success_rate: f64,
}

#[derive(Debug, Clone)]
pub struct AdaptiveDelayer {
    current: Duration,
    min: Duration,
    max: Duration,
    increase_factor: f64,
    decrease_factor: f64,
    success_threshold: u32,
    success_count: u32,
    block_streak: u32,
    total_blocks: u64,
    total_requests: u64,
}

impl Default for AdaptiveDelayer {
    /// 1 s initial delay bounded to `[0.5 s, 5 s]`, ×1.5 on block, ×0.8 after
    /// five consecutive successes.
    fn default() -> Self {
        Self::new(
            Duration::from_millis(1000),
            Duration::from_millis(500),
            Duration::from_millis(5000),
        )
    }
}

impl AdaptiveDelayer {
    /// Creates a delayer with the default growth/shrink factors.
    ///
    /// `initial` is clamped into `[min, max]`.
    #[must_use]
    pub fn new(initial: Duration, min: Duration, max: Duration) -> Self {
        Self {
            current: initial.clamp(min, max),
            min,
            max,
            increase_factor: 1.5,
            decrease_factor: 0.8,
            success_threshold: 5,
            success_count: 0,
            block_streak: 0,
            total_blocks: 0,
            total_requests: 0,
        }
    }

    #[must_use]
    pub fn with_factors(mut self, increase: f64, decrease: f64, success_threshold: u32) -> Self {
        self.increase_factor = increase;
        self.decrease_factor = decrease;
        self.success_threshold = success_threshold.max(1);
        self
    }

    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    /// Records a successful (HTTP 200) response.
    pub fn on_success(&mut self) {
        self.total_requests += 1;
        self.success_count += 1;
        self.block_streak = 0;

        if self.success_count >= self.success_threshold {
            let old = self.current;
            self.current = self.current.mul_f64(self.decrease_factor).max(self.min);
            self.success_count = 0;
            if old != self.current {
                tracing::info!(
                    old_delay_ms = old.as_millis(),
                    new_delay_ms = self.current.as_millis(),
                    "adaptive delay decreased after consecutive successes"
                );
            }
        }
    }

    /// Records a response blocked by the anti-bot layer.
    pub fn on_block(&mut self) {
        self.total_requests += 1;
        self.total_blocks += 1;
        self.block_streak += 1;
        self.success_count = 0;

        let old = self.current;
        self.current = self.current.mul_f64(self.increase_factor).min(self.max);
        if old != self.current {
            tracing::warn!(
                old_delay_ms = old.as_millis(),
                new_delay_ms = self.current.as_millis(),
                block_streak = self.block_streak,
                "adaptive delay increased after anti-bot block"
            );
        }
    }

    #[must_use]
    pub fn stats(&self) -> DelayStats {
        #[allow(clippy::cast_precision_loss)]
        let success_rate = if self.total_requests == 0 {
            0.0
        } else {
            (self.total_requests - self.total_blocks) as f64 / self.total_requests as f64 * 100.0
        };
        DelayStats {
            current_delay: self.current,
            total_requests: self.total_requests,
            total_blocks: self.total_blocks,
            block_streak: self.block_streak,
            success_count: self.success_count,
            success_rate,
        }
    }

    /// Clears all counters. The current delay is kept.
    pub fn reset(&mut self) {
        self.success_count = 0;
        self.block_streak = 0;
        self.total_blocks = 0;
        self.total_requests = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn default_starts_at_one_second() {
        let d = AdaptiveDelayer::default();
        assert_eq!(d.current_delay(), ms(1000));
        let stats = d.stats();
        assert_eq!(stats.total_requests, 0);
        assert!(stats.success_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn block_increases_delay_by_half() {
        let mut d = AdaptiveDelayer::default();
        d.on_block();
        assert_eq!(d.current_delay(), ms(1500));
        d.on_block();
        assert_eq!(d.current_delay(), ms(2250));
    }

    #[test]
    fn block_caps_at_max() {
        let mut d = AdaptiveDelayer::default();
        for _ in 0..10 {
            d.on_block();
        }
        assert_eq!(d.current_delay(), ms(5000));
        assert_eq!(d.stats().block_streak, 10);
    }

    #[test]
    fn decrease_only_after_threshold_successes() {
        let mut d = AdaptiveDelayer::default();
        for _ in 0..4 {
            d.on_success();
        }
        assert_eq!(d.current_delay(), ms(1000));
        d.on_success();
        assert_eq!(d.current_delay(), ms(800));
        assert_eq!(d.stats().success_count, 0);
    }

    #[test]
    fn decrease_floors_at_min() {
        let mut d = AdaptiveDelayer::default();
        for _ in 0..50 {
            d.on_success();
        }
        assert_eq!(d.current_delay(), ms(500));
    }

    #[test]
    fn block_resets_success_streak() {
        let mut d = AdaptiveDelayer::default();
        for _ in 0..4 {
            d.on_success();
        }
        d.on_block();
        assert_eq!(d.stats().success_count, 0);
        d.on_success();
        assert_eq!(d.stats().block_streak, 0);
        assert_eq!(d.stats().total_blocks, 1);
    }

    #[test]
    fn success_rate_counts_all_blocks() {
        let mut d = AdaptiveDelayer::default();
        d.on_block();
        d.on_success();
        d.on_success();
        d.on_block();
        let stats = d.stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.total_blocks, 2);
        assert!((stats.success_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn reset_keeps_delay() {
        let mut d = AdaptiveDelayer::default();
        d.on_block();
        d.reset();
        let stats = d.stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.total_blocks, 0);
        assert_eq!(stats.current_delay, ms(1500));
    }

    #[test]
    fn initial_is_clamped() {
        let d = AdaptiveDelayer::new(ms(10), ms(500), ms(5000));
        assert_eq!(d.current_delay(), ms(500));
    }

    #[test]
    fn custom_factors() {
        let mut d = AdaptiveDelayer::new(ms(1000), ms(100), ms(10_000)).with_factors(2.0, 0.5, 1);
        d.on_block();
        assert_eq!(d.current_delay(), ms(2000));
        d.on_success();
        assert_eq!(d.current_delay(), ms(1000));
    }
}
