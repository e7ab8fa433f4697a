//! Wall-clock abstraction so session timing can be driven in tests.
//!
//! Session times (entry, exit) are defined in exchange-local terms, so the
//! clock hands out naive local timestamps and never converts time zones.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

/// Source of exchange-local time, plus the ability to wait.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current exchange-local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the host's local time and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock whose time only moves when `sleep` is called or a test sets it.
///
/// `sleep` advances the clock by the requested duration and returns
/// immediately, so a full session runs in virtual time without real waits.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        *self.now.lock().unwrap() += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 23)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[tokio::test]
    async fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new(at(9, 15));
        assert_eq!(clock.now(), at(9, 15));

        clock.sleep(Duration::from_secs(300)).await;
        assert_eq!(clock.now(), at(9, 20));
    }

    #[test]
    fn manual_clock_can_be_set() {
        let clock = ManualClock::new(at(9, 15));
        clock.set(at(15, 0));
        assert_eq!(clock.now(), at(15, 0));
    }
}
