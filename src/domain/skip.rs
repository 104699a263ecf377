//! The customer may skip a scheduled pickup only with at least 24 hours of
//! notice, measured from the start of the pickup day in service-local time.

use crate::domain::PickupStatus;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub const SKIP_NOTICE_HOURS: i64 = 24;

/// `now` is the service-local wall clock (see `ServiceCalendar::local_now`).
pub fn can_skip(status: PickupStatus, scheduled_date: NaiveDate, now: NaiveDateTime) -> bool {
    status == PickupStatus::Scheduled
        && start_of_day(scheduled_date) - now >= Duration::hours(SKIP_NOTICE_HOURS)
}

/// First date a scheduled pickup may fall on and still be skippable at `now`.
///
/// For a scheduled pickup, `can_skip` holds exactly when its date is on or
/// after this one, which lets stores fold the rule into a conditional update.
pub fn earliest_skippable_date(now: NaiveDateTime) -> NaiveDate {
    let cutoff = now + Duration::hours(SKIP_NOTICE_HOURS);
    if cutoff.time() == NaiveTime::MIN {
        cutoff.date()
    } else {
        cutoff.date().succ_opt().unwrap_or(NaiveDate::MAX)
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
