//! Leave-day arithmetic and the calendar helpers the rules depend on.
//!
//! Every date here is a plain calendar date in India Standard Time; callers
//! convert instants with [`today_in`] before asking any date question.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::draft::DateRange;
use crate::types::{DayDuration, LeaveDays};

/// Timezone the HR policy counts calendar days in.
pub const POLICY_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Compute the number of leave days a date range covers.
///
/// Boundary days contribute half a day when their duration is half, and
/// every day strictly between them counts as a full day. An inverted range
/// yields zero; the validator reports it, this function never fails.
#[must_use]
pub fn compute_leave_days(range: &DateRange) -> LeaveDays {
    let Some(from) = range.from else {
        return LeaveDays::ZERO;
    };

    let first_day = day_weight(range.from_duration);

    let to = match range.to {
        None => return first_day,
        Some(to) if to == from => return first_day,
        Some(to) if from > to => return LeaveDays::ZERO,
        Some(to) => to,
    };

    let total_days = u32::try_from((to - from).num_days() + 1).unwrap_or(0);
    let middle = LeaveDays::whole(total_days.saturating_sub(2));

    first_day + middle + day_weight(range.to_duration)
}

const fn day_weight(duration: Option<DayDuration>) -> LeaveDays {
    match duration {
        Some(DayDuration::Half) => LeaveDays::HALF,
        _ => LeaveDays::ONE,
    }
}

/// The current calendar date in the given timezone.
#[must_use]
pub fn today_in(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The current calendar date under the HR policy timezone.
#[must_use]
pub fn policy_today() -> NaiveDate {
    today_in(Utc::now(), POLICY_TIMEZONE)
}

/// Whether the date falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Step forward `count` working days from `start`, skipping weekends.
///
/// `start` itself is never counted.
#[must_use]
pub fn add_working_days(start: NaiveDate, count: u32) -> NaiveDate {
    let mut date = start;
    let mut remaining = count;
    while remaining > 0 {
        date += Duration::days(1);
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    date
}

/// Number of working days strictly between `start` and `end`.
#[must_use]
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    start
        .iter_days()
        .skip(1)
        .take_while(|d| *d < end)
        .filter(|d| !is_weekend(*d))
        .fold(0, |acc, _| acc + 1)
}
