//! Two-phase polling schedule
//!
//! Right after application start the tracker polls frequently (the boost
//! phase), then settles into a long interval. The phase is a pure function
//! of wall-clock time elapsed since the tracker started.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TrackerSchedule {
    /// Delay before the very first cycle, letting the app finish
    /// initializing before the shared webview takes load.
    pub startup_delay: Duration,
    /// How long after start the boost phase lasts.
    pub boost_duration: Duration,
    /// Re-check interval during the boost phase.
    pub boost_interval: Duration,
    /// Re-check interval afterwards.
    pub normal_interval: Duration,
    /// Pause between items within one cycle, to be considerate of the
    /// target site.
    pub item_delay: Duration,
}

impl Default for TrackerSchedule {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(10),
            boost_duration: Duration::from_secs(5 * 60),
            boost_interval: Duration::from_secs(60),
            normal_interval: Duration::from_secs(30 * 60),
            item_delay: Duration::from_millis(300),
        }
    }
}

impl TrackerSchedule {
    /// Interval to wait before the next cycle, given time elapsed since
    /// tracker start.
    pub fn interval_after(&self, elapsed: Duration) -> Duration {
        if elapsed < self.boost_duration {
            self.boost_interval
        } else {
            self.normal_interval
        }
    }

    pub fn phase_name(&self, elapsed: Duration) -> &'static str {
        if elapsed < self.boost_duration {
            "boost"
        } else {
            "normal"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> TrackerSchedule {
        TrackerSchedule {
            startup_delay: Duration::ZERO,
            boost_duration: Duration::from_millis(100),
            boost_interval: Duration::from_millis(10),
            normal_interval: Duration::from_millis(1000),
            item_delay: Duration::ZERO,
        }
    }

    #[test]
    fn boost_interval_applies_during_boost_window() {
        let s = schedule();
        assert_eq!(s.interval_after(Duration::ZERO), Duration::from_millis(10));
        assert_eq!(
            s.interval_after(Duration::from_millis(99)),
            Duration::from_millis(10)
        );
        assert_eq!(s.phase_name(Duration::from_millis(50)), "boost");
    }

    #[test]
    fn normal_interval_after_boost_elapses() {
        let s = schedule();
        // 150ms elapsed with a 100ms boost window: next delay is normal.
        assert_eq!(
            s.interval_after(Duration::from_millis(150)),
            Duration::from_millis(1000)
        );
        // Boundary is exclusive for boost.
        assert_eq!(
            s.interval_after(Duration::from_millis(100)),
            Duration::from_millis(1000)
        );
        assert_eq!(s.phase_name(Duration::from_millis(150)), "normal");
    }
}
