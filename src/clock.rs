use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for the session lifecycle. Work dates are UTC dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
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

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 23, 30, 0).unwrap());
        assert_eq!(clock.now().date_naive(), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());

        clock.advance(Duration::hours(1));
        assert_eq!(clock.now().date_naive(), NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
    }
}
