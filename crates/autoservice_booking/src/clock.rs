// --- File: crates/autoservice_booking/src/clock.rs ---
//! Wall-clock access in the workshop's time zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

/// Source of "now" for the booking widgets.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Current instant, used for the submission timestamp.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Current local date and time in the workshop's time zone.
    fn now(&self) -> NaiveDateTime;

    /// Today's date at the workshop. Dates are compared at local midnight.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn utc_now(&self) -> DateTime<Utc> {
        (**self).utc_now()
    }

    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// The real clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// A clock that only moves when told to. Used by embedding shells and tests.
#[derive(Debug)]
pub struct ManualClock {
    tz: Tz,
    local: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(tz: Tz, local: NaiveDateTime) -> Self {
        Self {
            tz,
            local: Mutex::new(local),
        }
    }

    pub fn set(&self, local: NaiveDateTime) {
        *self.local.lock().unwrap_or_else(|e| e.into_inner()) = local;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut local = self.local.lock().unwrap_or_else(|e| e.into_inner());
        *local += by;
    }
}

impl Clock for ManualClock {
    fn utc_now(&self) -> DateTime<Utc> {
        let local = self.now();
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }

    fn now(&self) -> NaiveDateTime {
        *self.local.lock().unwrap_or_else(|e| e.into_inner())
    }
}
