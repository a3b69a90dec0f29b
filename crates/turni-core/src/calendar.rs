use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use serde::Serialize;

use crate::locale::CalendarLabels;
use crate::schedule::DaySchedule;

pub const DAYS_PER_WEEK: usize = 7;
const SHORT_GRID_CELLS: usize = 35;
const LONG_GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDayDescriptor {
  pub name: &'static str,
  pub date: NaiveDate
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize
)]
#[serde(rename_all = "camelCase")]
pub struct MonthGridCell {
  pub date:             NaiveDate,
  pub is_current_month: bool
}

/// Monday-first weekday index, `0..=6`.
fn monday_index(date: NaiveDate) -> i64 {
  date
    .weekday()
    .num_days_from_monday()
    as i64
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .unwrap_or(date)
}

/// Monday of the week containing
/// `date`.
#[must_use]
pub fn week_start(
  date: NaiveDate
) -> NaiveDate {
  add_days(date, -monday_index(date))
}

#[must_use]
pub fn week_dates(
  date: NaiveDate
) -> [NaiveDate; DAYS_PER_WEEK] {
  let start = week_start(date);
  let mut dates = [start; DAYS_PER_WEEK];
  for (offset, slot) in
    dates.iter_mut().enumerate()
  {
    *slot =
      add_days(start, offset as i64);
  }
  dates
}

#[must_use]
pub fn week_days(
  date: NaiveDate,
  labels: &dyn CalendarLabels
) -> Vec<WeekDayDescriptor> {
  week_dates(date)
    .into_iter()
    .map(|day| WeekDayDescriptor {
      name: labels
        .weekday_name(day.weekday()),
      date: day
    })
    .collect()
}

#[must_use]
pub fn first_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn last_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  let (next_year, next_month) =
    if date.month() >= 12 {
      (date.year().saturating_add(1), 1)
    } else {
      (date.year(), date.month() + 1)
    };
  NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  )
  .map(|first| add_days(first, -1))
  .unwrap_or(date)
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .map(|first| {
    last_day_of_month(first).day()
  })
  .unwrap_or(0)
}

/// Cells for the month containing
/// `date`, padded with neighbouring
/// days to whole Monday-first weeks:
/// always 35 or 42 cells.
#[must_use]
pub fn month_grid(
  date: NaiveDate
) -> Vec<MonthGridCell> {
  let first = first_day_of_month(date);
  let last = last_day_of_month(date);

  let mut grid: Vec<MonthGridCell> =
    Vec::with_capacity(LONG_GRID_CELLS);

  let leading = monday_index(first);
  for back in (1..=leading).rev() {
    grid.push(MonthGridCell {
      date:             add_days(
        first, -back
      ),
      is_current_month: false
    });
  }

  let mut day = first;
  while day <= last {
    grid.push(MonthGridCell {
      date:             day,
      is_current_month: true
    });
    let next = add_days(day, 1);
    if next == day {
      break;
    }
    day = next;
  }

  let trailing = 6 - monday_index(last);
  for ahead in 1..=trailing {
    grid.push(MonthGridCell {
      date:             add_days(
        last, ahead
      ),
      is_current_month: false
    });
  }

  let target =
    if grid.len() > SHORT_GRID_CELLS {
      LONG_GRID_CELLS
    } else {
      SHORT_GRID_CELLS
    };
  while grid.len() < target {
    let Some(tail) = grid.last() else {
      break;
    };
    let next = add_days(tail.date, 1);
    grid.push(MonthGridCell {
      date:             next,
      is_current_month: false
    });
  }

  grid
}

#[must_use]
pub fn shift_weeks(
  date: NaiveDate,
  weeks: i64
) -> NaiveDate {
  add_days(date, weeks.saturating_mul(7))
}

/// Moves by whole months, clamping the
/// day to the target month's length.
/// Stays on `date` when the target is
/// outside chrono's range.
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  checked_shift_months(date, months)
    .unwrap_or(date)
}

pub fn checked_shift_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let total = i64::from(date.year()) * 12
    + i64::from(date.month0())
    + i64::from(months);
  let year =
    i32::try_from(total.div_euclid(12))
      .ok()?;
  let month =
    total.rem_euclid(12) as u32 + 1;
  checked_jump_to_month(date, year, month)
}

/// Same day-of-month in another month,
/// clamped to that month's length.
#[must_use]
pub fn jump_to_month(
  date: NaiveDate,
  year: i32,
  month: u32
) -> NaiveDate {
  checked_jump_to_month(date, year, month)
    .unwrap_or(date)
}

fn checked_jump_to_month(
  date: NaiveDate,
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  let max_day =
    days_in_month(year, month);
  if max_day == 0 {
    return None;
  }
  NaiveDate::from_ymd_opt(
    year,
    month,
    date.day().min(max_day)
  )
}

pub fn day_for(
  days: &[DaySchedule],
  date: NaiveDate
) -> Option<&DaySchedule> {
  days.iter().find(|day| day.date == date)
}

/// The seven days of the week
/// containing `date`, filling dates
/// without a record with empty days.
#[must_use]
pub fn week_schedule(
  date: NaiveDate,
  days: &[DaySchedule]
) -> Vec<DaySchedule> {
  week_dates(date)
    .into_iter()
    .map(|day| {
      day_for(days, day)
        .cloned()
        .unwrap_or_else(|| {
          DaySchedule::empty(day)
        })
    })
    .collect()
}
