//! Shift time accounting.
//!
//! Extracted schedules are frequently incomplete, so nothing in here fails:
//! unreadable times count as midnight, shifts missing an endpoint count as
//! zero hours and non-finite durations render as `0h 0m`.

use crate::schedule::{DayKind, DaySchedule};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes since midnight for an `HH:MM` string, in `0..1440`.
pub fn time_to_minutes(time: &str) -> u32 {
    clock_minutes(time) % MINUTES_PER_DAY
}

/// Like [`time_to_minutes`], but `24:00` stays 1440 so a shift can close at
/// the end of its day.
pub fn end_to_minutes(time: &str) -> u32 {
    match clock_minutes(time) {
        MINUTES_PER_DAY => MINUTES_PER_DAY,
        minutes => minutes % MINUTES_PER_DAY,
    }
}

/// Minutes before wrapping at midnight; `0` for unreadable input.
fn clock_minutes(time: &str) -> u32 {
    let trimmed = time.trim();
    if trimmed.is_empty() {
        return 0;
    }

    let (hour_part, minute_part) = match trimmed.split_once(':') {
        Some((h, m)) => (h, m),
        None => (trimmed, ""),
    };

    let hour = leading_number(hour_part);
    let minute = leading_number(minute_part);
    if hour > 24 || minute > 59 {
        return 0;
    }

    hour * 60 + minute
}

fn leading_number(part: &str) -> u32 {
    let digits: String = part
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .take(4)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Hours between two clock times. An end earlier than the start crosses
/// midnight and the whole span belongs to the start day.
pub fn shift_hours(start: &str, end: &str) -> f64 {
    if start.trim().is_empty() || end.trim().is_empty() {
        return 0.0;
    }

    let start_minutes = i64::from(time_to_minutes(start));
    let end_minutes = i64::from(end_to_minutes(end));

    let mut diff = end_minutes - start_minutes;
    if diff < 0 {
        diff += i64::from(MINUTES_PER_DAY);
    }

    diff as f64 / 60.0
}

pub fn day_hours(day: &DaySchedule) -> f64 {
    if day.kind != DayKind::Work {
        return 0.0;
    }
    day.shifts
        .iter()
        .map(|shift| shift_hours(&shift.start, &shift.end))
        .sum()
}

pub fn week_hours(days: &[DaySchedule]) -> f64 {
    days.iter().map(day_hours).sum()
}

/// Renders decimal hours as `"{H}h {M}m"`, rounded to the nearest minute.
pub fn format_duration(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0h 0m".to_string();
    }

    let total_minutes = (hours * 60.0).round() as u64;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
