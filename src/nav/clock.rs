//! Time source for cache freshness

use chrono::{DateTime, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: std::cell::Cell<i64>,
}

#[cfg(test)]
impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self {
            millis: std::cell::Cell::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.set(millis);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.timestamp_millis_opt(self.millis.get())
            .single()
            .unwrap_or_default()
    }
}
