use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Source of "now" for everything that depends on the calendar day.
///
/// Days are US Eastern civil days no matter which zone the host runs in.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock pinned to America/New_York.
///
/// The zone rules are compiled into the binary, so resolving the zone cannot fail at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct EasternClock;

impl Clock for EasternClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&New_York)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Tz>);

#[cfg(test)]
impl FixedClock {
    /// Noon Eastern on `date`, far from any DST transition hour.
    pub fn on(date: NaiveDate) -> Self {
        use chrono::TimeZone;

        let noon = date.and_hms_opt(12, 0, 0).expect("valid noon");
        Self(New_York.from_local_datetime(&noon).single().expect("unambiguous noon"))
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}
