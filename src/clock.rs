//! Time source for the engine.
//!
//! Everything that stamps or buckets time goes through a `Clock` so tests
//! can drive synthesis ticks and hour-of-day heuristics deterministically.

use chrono::{DateTime, Datelike, Duration, Local, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::types::TimeOfDay;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Local wall time in the configured zone (host zone when unset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMoment {
    pub hour: u32,
    pub weekday: Weekday,
}

impl LocalMoment {
    pub fn at(now: DateTime<Utc>, tz: Option<Tz>) -> Self {
        match tz {
            Some(tz) => {
                let local = now.with_timezone(&tz);
                Self {
                    hour: local.hour(),
                    weekday: local.weekday(),
                }
            }
            None => {
                let local = now.with_timezone(&Local);
                Self {
                    hour: local.hour(),
                    weekday: local.weekday(),
                }
            }
        }
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour)
    }

    pub fn day_name(&self) -> &'static str {
        match self.weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(45));
        assert_eq!(clock.now(), start + Duration::seconds(45));
    }

    #[test]
    fn test_local_moment_respects_timezone() {
        // 14:30 UTC on a Friday is 10:30 in New York (EDT)
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 14, 30, 0).unwrap();
        let moment = LocalMoment::at(now, Some(chrono_tz::America::New_York));
        assert_eq!(moment.hour, 10);
        assert_eq!(moment.day_name(), "Friday");
        assert_eq!(moment.time_of_day(), TimeOfDay::Morning);
    }
}
