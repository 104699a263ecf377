use crate::domain::PickupDay;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// The service's local clock. The service area (Arizona) keeps a fixed UTC
/// offset all year, so no daylight-saving rules are involved.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCalendar {
    offset: FixedOffset,
}

impl ServiceCalendar {
    pub fn new(offset: FixedOffset) -> ServiceCalendar {
        ServiceCalendar { offset }
    }

    pub fn from_utc_offset_minutes(minutes: i32) -> Result<ServiceCalendar, String> {
        FixedOffset::east_opt(minutes * 60)
            .map(ServiceCalendar::new)
            .ok_or_else(|| format!("{} minutes is not a valid UTC offset.", minutes))
    }

    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.offset).naive_local()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_now(now).date()
    }

    /// Next date falling on `day`, strictly after today.
    pub fn next_occurrence(&self, day: PickupDay, now: DateTime<Utc>) -> NaiveDate {
        let today = self.today(now);
        let current = today.weekday().num_days_from_sunday() as i64;
        let target = day.weekday().num_days_from_sunday() as i64;
        let mut days_ahead = target - current;
        if days_ahead <= 0 {
            days_ahead += 7;
        }
        today + Duration::days(days_ahead)
    }
}

/// e.g. "Monday, October 19"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}
