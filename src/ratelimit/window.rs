//! Sliding-window limiter.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// Length of the trailing window admissions are counted over.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Admits at most `capacity` events within any trailing one-second window.
///
/// The window is half-open, `(now - 1s, now]`: an admission exactly one
/// second old still counts against the budget. Each limiter guards its own
/// timestamps, so limiters for different senders never contend.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Maximum admissions within the window
    capacity: u32,
    /// Admission instants, oldest first
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter with a fixed capacity.
    ///
    /// A capacity of zero is valid and rejects every request.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            timestamps: Mutex::new(VecDeque::with_capacity(capacity.min(1024) as usize)),
        }
    }

    /// Try to admit an event at the current system time.
    pub fn try_admit(&self) -> bool {
        self.try_admit_at(Instant::now())
    }

    /// Try to admit an event at `now`.
    ///
    /// An instant older than the newest recorded admission is treated as
    /// that admission's instant. Expired admissions are purged first. On success `now` is recorded;
    /// on rejection the limiter is left untouched apart from the purge.
    pub fn try_admit_at(&self, now: Instant) -> bool {
        let mut timestamps = self.timestamps.lock();
        // Callers read the clock before taking the lock; keep entries ordered.
        let now = timestamps.back().map_or(now, |&newest| now.max(newest));
        purge_expired(&mut timestamps, now);

        if timestamps.len() < self.capacity as usize {
            timestamps.push_back(now);
            trace!(
                capacity = self.capacity,
                in_window = timestamps.len(),
                "Admitted"
            );
            true
        } else {
            trace!(capacity = self.capacity, "Window full, rejected");
            false
        }
    }

    /// The capacity this limiter was created with.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of admissions retained since the last purge.
    pub fn len(&self) -> usize {
        self.timestamps.lock().len()
    }

    /// Whether no admissions are retained.
    pub fn is_empty(&self) -> bool {
        self.timestamps.lock().is_empty()
    }

    /// Instant of the most recent retained admission, `None` if nothing has
    /// been admitted (or everything was purged by a later check).
    pub fn last_admitted(&self) -> Option<Instant> {
        self.timestamps.lock().back().copied()
    }
}

fn purge_expired(timestamps: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) > WINDOW {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
