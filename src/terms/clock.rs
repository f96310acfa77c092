// Time sources for term records

use std::sync::atomic::{AtomicI64, Ordering};

/// Source of record timestamps, in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock that never repeats or goes backwards.
///
/// Two reads in the same millisecond get distinct values, so recency
/// ordering between records is always strict.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock::default()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let wall = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Deterministic clock: starts at `start` and advances by `step` per read
#[derive(Debug)]
pub struct ManualClock {
    next: AtomicI64,
    step: i64,
}

impl ManualClock {
    pub fn new(start: i64, step: i64) -> Self {
        ManualClock {
            next: AtomicI64::new(start),
            step,
        }
    }

    /// Jump forward without producing a reading
    pub fn advance(&self, millis: i64) {
        self.next.fetch_add(millis, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::AcqRel)
    }
}
