//! Countdown against a total time allowance.
//!
//! Not a scheduler. Elapsed time is a pure function of the stored start
//! timestamp and the caller's `now`, recomputed on every tick instead of
//! summing per-tick deltas, so rounding error never compounds.
//!
//! While running: `elapsed = now - start_time`, clamped to `0..=total`.
//! While frozen: `elapsed` is the value captured by `freeze`.
//! `resume` moves `start_time` to `now - elapsed` so time continues seamlessly.
//!
//! Allowances are limited to `MAX_TOTAL_TIME_SECS`, which keeps every
//! `now - elapsed` well inside chrono's representable range.
//!
//! All stored durations are truncated to whole milliseconds, which is the
//! precision of the persisted record.

use chrono::{DateTime, Duration, Utc};

use crate::core::{GameError, Result, MAX_TOTAL_TIME_SECS};

/// Truncate a duration to whole milliseconds.
#[must_use]
pub fn truncate_millis(d: Duration) -> Duration {
    Duration::milliseconds(d.num_milliseconds())
}

/// Check that a time allowance is positive and at most `MAX_TOTAL_TIME_SECS`.
pub fn check_allowance(total: Duration) -> Result<Duration> {
    let max = Duration::seconds(MAX_TOTAL_TIME_SECS as i64);
    if total <= Duration::zero() || total > max {
        return Err(GameError::InvalidTime(format!(
            "allowance {}ms outside 1ms..={}s",
            total.num_milliseconds(),
            MAX_TOTAL_TIME_SECS
        )));
    }
    Ok(total)
}

/// Format a duration as `MM:SS`, rounding down to whole seconds.
///
/// ```
/// use chrono::Duration;
/// use memory_match::clock::format_mmss;
///
/// assert_eq!(format_mmss(Duration::milliseconds(119_999)), "01:59");
/// assert_eq!(format_mmss(Duration::seconds(-3)), "00:00");
/// ```
#[must_use]
pub fn format_mmss(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Elapsed/remaining time model for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    total: Duration,
    start_time: DateTime<Utc>,
    elapsed: Duration,
    running: bool,
}

impl Countdown {
    /// Start a fresh countdown at `now`.
    #[must_use]
    pub fn start(total: Duration, now: DateTime<Utc>) -> Self {
        Self {
            total: truncate_millis(total),
            start_time: now,
            elapsed: Duration::zero(),
            running: true,
        }
    }

    /// Restore a frozen countdown from persisted values.
    #[must_use]
    pub fn frozen(total: Duration, start_time: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            total: truncate_millis(total),
            start_time,
            elapsed: truncate_millis(elapsed).max(Duration::zero()),
            running: false,
        }
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Last captured elapsed value (updated by `sample`, `freeze` and `expire`).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time as of `now`. Never negative, even if `now` precedes the
    /// start, and never past the allowance.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        if self.running {
            truncate_millis(now - self.start_time)
                .min(self.total)
                .max(Duration::zero())
        } else {
            self.elapsed
        }
    }

    /// Remaining time as of `now`: `max(0, total - elapsed)`.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.total - self.elapsed_at(now)).max(Duration::zero())
    }

    /// Has the allowance run out as of `now`?
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_at(now) >= self.total
    }

    /// Recompute and store elapsed time without stopping.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Duration {
        self.elapsed = self.elapsed_at(now);
        self.elapsed
    }

    /// Stop the countdown, capturing elapsed time.
    pub fn freeze(&mut self, now: DateTime<Utc>) {
        self.elapsed = self.elapsed_at(now);
        self.running = false;
    }

    /// Stop the countdown at the full allowance.
    pub fn expire(&mut self) {
        self.elapsed = self.total;
        self.running = false;
    }

    /// Restart a frozen countdown so elapsed continues from where it stopped.
    ///
    /// Fails with `InvalidTime` if the shifted start is not representable;
    /// the countdown stays frozen.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.running {
            self.start_time = now.checked_sub_signed(self.elapsed).ok_or_else(|| {
                GameError::InvalidTime(format!(
                    "cannot resume {}ms before {}",
                    self.elapsed.num_milliseconds(),
                    now
                ))
            })?;
            self.running = true;
        }
        Ok(())
    }
}
