use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use turnstile_core::Timestamp;

/// Maps tokio's monotonic clock onto coordinator timestamps
///
/// Timestamps are `origin` plus the time elapsed since the clock was created,
/// so they follow tokio's paused clock in tests.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    start: Instant,
    origin: Timestamp,
}

impl SessionClock {
    /// Anchor at the current wall-clock time (epoch milliseconds)
    pub fn system() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        Self::starting_at(Timestamp::from_millis(millis))
    }

    /// Anchor at a fixed timestamp
    pub fn starting_at(origin: Timestamp) -> Self {
        Self {
            start: Instant::now(),
            origin,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.origin.after(self.start.elapsed())
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Instant at which `timestamp` will be reached
    pub fn instant_at(&self, timestamp: Timestamp) -> Instant {
        self.start + timestamp.since(self.origin)
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::system()
    }
}
