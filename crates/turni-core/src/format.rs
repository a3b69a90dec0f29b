use chrono::{Datelike, Duration, NaiveDate};

use crate::calendar::week_start;
use crate::locale::CalendarLabels;

fn week_end(start: NaiveDate) -> NaiveDate {
    start.checked_add_signed(Duration::days(6)).unwrap_or(start)
}

/// Human label for the Monday..Sunday week containing `date`.
///
/// The shortest unambiguous form is picked: `"04 - 10 Novembre 2024"` inside
/// one month, `"28 Ottobre - 03 Novembre 2024"` across months and
/// `"30 Dicembre 2024 - 05 Gennaio 2025"` across years.
pub fn format_date_range(date: NaiveDate, labels: &dyn CalendarLabels) -> String {
    let start = week_start(date);
    let end = week_end(start);

    let start_month = labels.month_name(start.month());
    let end_month = labels.month_name(end.month());

    if start.year() != end.year() {
        format!(
            "{:02} {start_month} {} - {:02} {end_month} {}",
            start.day(),
            start.year(),
            end.day(),
            end.year()
        )
    } else if start.month() != end.month() {
        format!(
            "{:02} {start_month} - {:02} {end_month} {}",
            start.day(),
            end.day(),
            end.year()
        )
    } else {
        format!(
            "{:02} - {:02} {end_month} {}",
            start.day(),
            end.day(),
            end.year()
        )
    }
}

/// Week header in numeric form: `"28/10/2024 - 03/11/2024"`.
pub fn format_numeric_range(date: NaiveDate) -> String {
    let start = week_start(date);
    let end = week_end(start);
    format!("{} - {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"))
}

pub fn month_title(date: NaiveDate, labels: &dyn CalendarLabels) -> String {
    format!("{} {}", labels.month_name(date.month()), date.year())
}

pub fn day_title(date: NaiveDate, labels: &dyn CalendarLabels) -> String {
    format!(
        "{} {} {}",
        labels.weekday_name(date.weekday()),
        date.day(),
        labels.month_name(date.month())
    )
}
