use chrono::{Datelike, Duration, NaiveDate, Weekday};
use turni_core::calendar::{month_grid, shift_months, shift_weeks, week_days, week_start};
use turni_core::format::format_date_range;
use turni_core::hours::{format_duration, shift_hours, week_hours};
use turni_core::locale::{English, Italian, Locale};
use turni_core::schedule::{DaySchedule, Shift};
use turni_core::summary::WeekSummary;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn week_views_follow_navigation() {
    let mut cursor = date(2024, 10, 30);
    for _ in 0..60 {
        let days = week_days(cursor, Locale::It.labels());
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, week_start(cursor));
        assert_eq!(days[0].date.weekday(), Weekday::Mon);
        assert_eq!(days[6].date - days[0].date, Duration::days(6));
        cursor = shift_weeks(cursor, 1);
    }
}

#[test]
fn month_views_follow_navigation() {
    let mut cursor = date(2023, 1, 31);
    for _ in 0..36 {
        let grid = month_grid(cursor);
        assert!(grid.len() == 35 || grid.len() == 42);
        assert_eq!(grid.len() % 7, 0);
        assert_eq!(month_grid(cursor.with_day(1).expect("first of month")), grid);
        let mut sorted = grid.clone();
        sorted.dedup_by_key(|cell| cell.date);
        assert_eq!(sorted.len(), grid.len());
        cursor = shift_months(cursor, 1);
    }
}

#[test]
fn shift_hour_contracts() {
    assert_eq!(shift_hours("22:00", "06:00"), 8.0);
    assert_eq!(shift_hours("09:00", "17:30"), 8.5);
    assert_eq!(shift_hours("", "10:00"), 0.0);
    assert_eq!(format_duration(8.5), "8h 30m");
    assert_eq!(format_duration(f64::NAN), "0h 0m");
}

#[test]
fn cross_month_week_label() {
    let label = format_date_range(date(2024, 10, 31), &Italian);
    assert_eq!(label, "28 Ottobre - 03 Novembre 2024");
    assert_eq!(format_date_range(date(2024, 10, 31), &English), "28 October - 03 November 2024");
}

#[test]
fn split_shift_week_end_to_end() {
    let monday = date(2024, 10, 28);
    let mut week = vec![DaySchedule::work(
        monday,
        vec![Shift::new("08:00", "12:00"), Shift::new("13:00", "17:00")],
    )];
    for offset in 1..7 {
        let day = monday + Duration::days(offset);
        week.push(if offset % 2 == 0 {
            DaySchedule::rest(day)
        } else {
            DaySchedule::empty(day)
        });
    }

    let total = week_hours(&week);
    assert_eq!(total, 8.0);
    assert_eq!(format_duration(total), "8h 0m");

    let summary = WeekSummary::from_days(&week);
    assert_eq!(summary.work_days, 1);
    assert_eq!(summary.rest_days, 3);
    assert_eq!(summary.empty_days, 3);
}
