//! Fixed-period scheduler for Hoard.
//!
//! Drives recurring housekeeping (the idle reaper, the status broadcast) from
//! inside the hub actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         _ = reaper.wait_for_tick() => { /* sweep */ }
//!         Some(cmd) = commands.recv() => { /* handle */ }
//!     }
//! }
//! ```
//!
//! `wait_for_tick` only changes scheduler state after its sleep completes, so
//! dropping it when another branch wins loses nothing.
//!
//! A scheduler with no period is disabled and [`TickScheduler::wait_for_tick`]
//! pends forever. Built on `tokio::time`, so tests can drive it with a paused
//! clock instead of real sleeps.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scheduler configuration.
#[derive(Debug, Clone, Default)]
pub struct TickConfig {
    /// Time between ticks. `None` disables the scheduler.
    pub period: Option<Duration>,
}

impl TickConfig {
    /// A scheduler that fires every `period`. A zero period is treated as
    /// disabled.
    pub fn every(period: Duration) -> Self {
        Self {
            period: Some(period).filter(|p| !p.is_zero()),
        }
    }

    /// A scheduler that never fires.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Like [`every`](Self::every) but accepting an optional period.
    pub fn maybe_every(period: Option<Duration>) -> Self {
        period.map(Self::every).unwrap_or_default()
    }
}

/// What [`TickScheduler::wait_for_tick`] returns.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// How late the tick fired relative to its deadline.
    pub late_by: Duration,
    /// `true` when `late_by` exceeded a tenth of the period.
    pub overrun: bool,
    /// Whole periods that were missed. They are not run; the next tick is
    /// one period after this one.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One recurring task's timer.
pub struct TickScheduler {
    name: &'static str,
    config: TickConfig,
    tick_count: u64,
    next_tick: Option<Instant>,
    paused: bool,
}

impl TickScheduler {
    /// Creates a running scheduler. `name` labels its log lines.
    pub fn new(name: &'static str, config: TickConfig) -> Self {
        let next_tick = config.period.map(|period| Instant::now() + period);

        match config.period {
            Some(period) => debug!(name, period_ms = period.as_millis() as u64, "scheduler created"),
            None => debug!(name, "scheduler created disabled"),
        }

        Self {
            name,
            config,
            tick_count: 0,
            next_tick,
            paused: false,
        }
    }

    /// Waits for the next tick. Pends forever when disabled or paused.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, period) = match (self.next_tick, self.config.period) {
            (Some(next), Some(period)) if !self.paused => (next, period),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > period / 10;
        let ticks_skipped = u64::try_from(late_by.as_nanos() / period.as_nanos()).unwrap_or(u64::MAX);
        self.next_tick = Some(now + period);

        if overrun {
            warn!(
                name = self.name,
                tick = self.tick_count,
                late_ms = late_by.as_millis() as u64,
                skipped = ticks_skipped,
                "tick fired late"
            );
        }
        trace!(name = self.name, tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            late_by,
            overrun,
            ticks_skipped,
        }
    }

    /// Stops ticking for good. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(name = self.name, tick = self.tick_count, "scheduler paused");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` when no period is configured.
    pub fn is_disabled(&self) -> bool {
        self.config.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
