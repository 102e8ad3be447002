//! Scheduler tests on a paused clock.
//!
//! `start_paused = true` auto-advances time whenever the runtime is idle, so
//! `sleep_until` resolves without real waiting.

use std::time::Duration;

use hoard_tick::{TickConfig, TickScheduler};
use tokio::time::{self, Instant};

const PERIOD: Duration = Duration::from_secs(300);

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn default_config_is_disabled() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, None);
}

#[test]
fn zero_period_is_disabled() {
    assert_eq!(TickConfig::every(Duration::ZERO).period, None);
    assert_eq!(TickConfig::maybe_every(None).period, None);
    assert_eq!(TickConfig::maybe_every(Some(PERIOD)).period, Some(PERIOD));
}

// =========================================================================
// Ticking
// =========================================================================

#[tokio::test(start_paused = true)]
async fn first_tick_fires_one_period_after_creation() {
    let start = Instant::now();
    let mut s = TickScheduler::new("test", TickConfig::every(PERIOD));
    assert_eq!(s.tick_count(), 0);

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(Instant::now() - start, PERIOD);
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn ticks_are_numbered_consecutively() {
    let start = Instant::now();
    let mut s = TickScheduler::new("test", TickConfig::every(PERIOD));
    for expected in 1..=3 {
        assert_eq!(s.wait_for_tick().await.tick, expected);
    }
    assert_eq!(Instant::now() - start, PERIOD * 3);
    assert_eq!(s.tick_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn disabled_scheduler_never_fires() {
    let mut s = TickScheduler::new("test", TickConfig::disabled());
    assert!(s.is_disabled());
    let result = time::timeout(PERIOD * 10, s.wait_for_tick()).await;
    assert!(result.is_err());
    assert_eq!(s.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn paused_scheduler_never_fires() {
    let mut s = TickScheduler::new("test", TickConfig::every(PERIOD));
    s.pause();
    s.pause();
    assert!(s.is_paused());
    assert!(time::timeout(PERIOD * 3, s.wait_for_tick()).await.is_err());
    assert_eq!(s.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_does_not_consume_a_tick() {
    let mut s = TickScheduler::new("test", TickConfig::every(PERIOD));
    assert!(time::timeout(PERIOD / 2, s.wait_for_tick()).await.is_err());
    assert_eq!(s.tick_count(), 0);

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
}

// =========================================================================
// Overruns
// =========================================================================

#[tokio::test(start_paused = true)]
async fn late_tick_counts_missed_periods_and_restarts_cadence() {
    let mut s = TickScheduler::new("test", TickConfig::every(PERIOD));
    time::advance(PERIOD * 3 + PERIOD / 2).await;

    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);

    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(Instant::now() - before, PERIOD);
}
