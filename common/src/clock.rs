//! Wall-clock time and fixed delays.

use std::fmt;
use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Delays shorter than this are busy-waited; the scheduler cannot be trusted with them.
pub const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Wall-clock time with one-second resolution.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from seconds since the Unix epoch.
    pub fn from_secs(secs: u64) -> Timestamp {
        Timestamp(secs)
    }

    /// Returns seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of time for the acquisition sequence.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;

    /// Block for exactly `length`; never returns early.
    fn sleep(&self, length: Duration);
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }

    fn sleep(&self, length: Duration) {
        if length < SPIN_THRESHOLD {
            let t_until = Instant::now() + length;
            while Instant::now() < t_until {  } // spin wait
        } else {
            thread::sleep(length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_is_never_short() {
        let clock = SystemClock;
        for &length in &[Duration::from_micros(20), Duration::from_millis(2)] {
            let t0 = Instant::now();
            clock.sleep(length);
            assert!(t0.elapsed() >= length);
        }
    }

    #[test]
    fn now_is_after_2019() {
        assert!(SystemClock.now() > Timestamp::from_secs(1_546_300_800));
    }
}
