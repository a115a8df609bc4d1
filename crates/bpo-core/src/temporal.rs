//! # Temporal Types: Discrete Time Units
//!
//! Every report measures its timing in exactly one [`TimeUnit`], chosen at
//! creation and never mixed: wall-clock seconds or count-based ticks (block
//! heights in a chain host). A [`Clock`] answers "now" in either unit.
//!
//! ## Implementations
//!
//! - [`SystemClock`]: seconds from the UTC wall clock, ticks derived from a
//!   fixed tick interval since the Unix epoch.
//! - [`ManualClock`]: both counters advanced explicitly; used by tests and
//!   the simulation CLI.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The discrete time unit governing a report's timing checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Wall-clock seconds since the Unix epoch.
    Seconds,
    /// Count-based ticks (e.g. block height).
    Ticks,
}

impl TimeUnit {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Ticks => "ticks",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current time in both units.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in seconds.
    fn seconds(&self) -> u64;

    /// Current tick height.
    fn ticks(&self) -> u64;

    /// Current time in the requested unit.
    fn now(&self, unit: TimeUnit) -> u64 {
        match unit {
            TimeUnit::Seconds => self.seconds(),
            TimeUnit::Ticks => self.ticks(),
        }
    }
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tick_interval_secs: u64,
}

impl SystemClock {
    /// Create a clock whose ticks advance every `tick_interval_secs` seconds.
    /// An interval of zero is treated as one second.
    pub fn new(tick_interval_secs: u64) -> Self {
        Self {
            tick_interval_secs: tick_interval_secs.max(1),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Clock for SystemClock {
    fn seconds(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }

    fn ticks(&self) -> u64 {
        self.seconds() / self.tick_interval_secs
    }
}

/// Explicitly driven [`Clock`].
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: AtomicU64,
    ticks: AtomicU64,
}

impl ManualClock {
    /// Create a clock at the given starting point.
    pub fn new(seconds: u64, ticks: u64) -> Self {
        Self {
            seconds: AtomicU64::new(seconds),
            ticks: AtomicU64::new(ticks),
        }
    }

    /// Advance the counter for `unit` by `amount`.
    pub fn advance(&self, unit: TimeUnit, amount: u64) {
        match unit {
            TimeUnit::Seconds => self.seconds.fetch_add(amount, Ordering::SeqCst),
            TimeUnit::Ticks => self.ticks.fetch_add(amount, Ordering::SeqCst),
        };
    }

    /// Set the counter for `unit` to an absolute value.
    pub fn set(&self, unit: TimeUnit, value: u64) {
        match unit {
            TimeUnit::Seconds => self.seconds.store(value, Ordering::SeqCst),
            TimeUnit::Ticks => self.ticks.store(value, Ordering::SeqCst),
        }
    }
}

impl Clock for ManualClock {
    fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_units_are_independent() {
        let clock = ManualClock::new(1_000, 50);
        clock.advance(TimeUnit::Seconds, 12);
        assert_eq!(clock.now(TimeUnit::Seconds), 1_012);
        assert_eq!(clock.now(TimeUnit::Ticks), 50);

        clock.advance(TimeUnit::Ticks, 1);
        assert_eq!(clock.now(TimeUnit::Ticks), 51);
    }

    #[test]
    fn manual_clock_set() {
        let clock = ManualClock::default();
        clock.set(TimeUnit::Ticks, 9);
        assert_eq!(clock.ticks(), 9);
        assert_eq!(clock.seconds(), 0);
    }

    #[test]
    fn system_clock_ticks_follow_interval() {
        let clock = SystemClock::new(10);
        let secs = clock.seconds();
        let ticks = clock.ticks();
        assert!(secs > 1_600_000_000);
        assert!(ticks >= secs / 10 - 1 && ticks <= secs / 10 + 1);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let clock = SystemClock::new(0);
        assert!(clock.ticks() > 0);
    }

    #[test]
    fn time_unit_serde_names() {
        assert_eq!(serde_json::to_string(&TimeUnit::Seconds).unwrap(), "\"seconds\"");
        let unit: TimeUnit = serde_json::from_str("\"ticks\"").unwrap();
        assert_eq!(unit, TimeUnit::Ticks);
        assert_eq!(TimeUnit::Ticks.to_string(), "ticks");
    }
}
