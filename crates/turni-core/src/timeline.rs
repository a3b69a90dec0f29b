//! Position of "now" relative to days and shifts. The current time is always
//! passed in by the caller.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::hours::{MINUTES_PER_DAY, end_to_minutes, time_to_minutes};
use crate::schedule::{DayKind, DaySchedule, Shift};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Past,
    Today,
    Future,
}

pub fn day_status(date: NaiveDate, now: NaiveDateTime) -> DayStatus {
    let today = now.date();
    if date == today {
        DayStatus::Today
    } else if date < today {
        DayStatus::Past
    } else {
        DayStatus::Future
    }
}

fn minutes_of(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Vertical position of the "now" marker in a day column, `0.0..100.0`.
pub fn timeline_percent(now: NaiveDateTime) -> f64 {
    f64::from(minutes_of(now)) / f64::from(MINUTES_PER_DAY) * 100.0
}

pub fn shift_offset_percent(shift: &Shift) -> f64 {
    f64::from(time_to_minutes(&shift.start)) / f64::from(MINUTES_PER_DAY) * 100.0
}

/// The shift of `day` running at `now`. Overnight shifts stay active past
/// midnight until their end on the following date.
pub fn active_shift(day: &DaySchedule, now: NaiveDateTime) -> Option<&Shift> {
    if day.kind != DayKind::Work {
        return None;
    }

    let offset = (now.date() - day.date).num_days();
    let now_minutes = i64::from(minutes_of(now));

    day.shifts.iter().filter(|s| !s.is_partial()).find(|shift| {
        let start = i64::from(time_to_minutes(&shift.start));
        let mut end = i64::from(end_to_minutes(&shift.end));
        if end < start {
            end += i64::from(MINUTES_PER_DAY);
        }
        let elapsed = offset * i64::from(MINUTES_PER_DAY) + now_minutes;
        elapsed >= start && elapsed < end
    })
}
