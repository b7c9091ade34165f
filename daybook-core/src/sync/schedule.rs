//! When automatic pushes and pulls are allowed to happen.
//!
//! Both types take `now` as an argument so they can be driven by
//! `tokio::time` in the run loop and by a paused clock in tests.

use std::time::Duration;

use tokio::time::Instant;

/// Delays used by the automatic triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    /// Quiet period after the last edit before an automatic push.
    pub debounce: Duration,
    /// How often an automatic pull is considered.
    pub pull_interval: Duration,
    /// No automatic pull until this long after the last edit.
    pub quiet_after_change: Duration,
    pub min_pull_gap: Duration,
    pub min_push_gap: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1400),
            pull_interval: Duration::from_secs(12),
            quiet_after_change: Duration::from_millis(6500),
            min_pull_gap: Duration::from_secs(10),
            min_push_gap: Duration::from_secs(4),
        }
    }
}

/// Cancel-and-reschedule timer: every `touch` pushes the deadline out by the
/// full window, so a burst of touches fires once.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` and disarms when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Why an automatic pull was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullBlocked {
    NoTarget,
    RecentChange,
    RecentPull,
    RecentPush,
}

/// Tracks recent activity and decides whether an automatic pull may start.
#[derive(Debug, Clone)]
pub struct AutoPullGate {
    timing: SyncTiming,
    last_change: Option<Instant>,
    last_pull_attempt: Option<Instant>,
    last_push_attempt: Option<Instant>,
}

impl AutoPullGate {
    pub fn new(timing: SyncTiming) -> Self {
        Self {
            timing,
            last_change: None,
            last_pull_attempt: None,
            last_push_attempt: None,
        }
    }

    pub fn record_change(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn record_pull_attempt(&mut self, now: Instant) {
        self.last_pull_attempt = Some(now);
    }

    pub fn record_push_attempt(&mut self, now: Instant) {
        self.last_push_attempt = Some(now);
    }

    pub fn check(&self, now: Instant, has_target: bool) -> Result<(), PullBlocked> {
        if !has_target {
            return Err(PullBlocked::NoTarget);
        }
        if !elapsed(self.last_change, now, self.timing.quiet_after_change) {
            return Err(PullBlocked::RecentChange);
        }
        if !elapsed(self.last_pull_attempt, now, self.timing.min_pull_gap) {
            return Err(PullBlocked::RecentPull);
        }
        if !elapsed(self.last_push_attempt, now, self.timing.min_push_gap) {
            return Err(PullBlocked::RecentPush);
        }
        Ok(())
    }
}

fn elapsed(since: Option<Instant>, now: Instant, min: Duration) -> bool {
    since.map_or(true, |t| now.saturating_duration_since(t) >= min)
}
