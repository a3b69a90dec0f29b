use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDateTime};
use unicode_width::UnicodeWidthStr;

use crate::calendar::{MonthGridCell, day_for, week_days};
use crate::config::Config;
use crate::format::{day_title, format_date_range, format_numeric_range, month_title};
use crate::hours::{day_hours, format_duration, week_hours};
use crate::locale::{Caption, CalendarLabels};
use crate::schedule::{AnalysisEntry, DayKind, DaySchedule};
use crate::timeline::{DayStatus, active_shift, day_status, shift_offset_percent, timeline_percent};

const MONTH_CELL_WIDTH: usize = 5;
const TIMELINE_SLOTS: usize = 48;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self { color: cfg.color() }
    }

    /// `week` holds the seven Monday-first days of one week.
    #[tracing::instrument(skip(self, week, labels, now))]
    pub fn print_week(
        &mut self,
        week: &[DaySchedule],
        labels: &dyn CalendarLabels,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let Some(first) = week.first() else {
            return Ok(());
        };

        writeln!(out, "{}", format_date_range(first.date, labels))?;
        writeln!(out, "{}", format_numeric_range(first.date))?;
        writeln!(out)?;

        let headers: Vec<String> = captions(labels, &[Caption::Day, Caption::Date, Caption::Shifts, Caption::Hours])
            .into_iter()
            .chain([String::new()])
            .collect();

        let names = week_days(first.date, labels);
        let mut rows = Vec::with_capacity(week.len());
        for (day, descriptor) in week.iter().zip(names.iter()) {
            let status = day_status(day.date, now);
            let name = match status {
                DayStatus::Today => self.paint(descriptor.name, "1;36"),
                DayStatus::Past => self.paint(descriptor.name, "2"),
                DayStatus::Future => descriptor.name.to_string(),
            };

            let shifts = self.shift_cell(day, labels, now);
            let hours = if day.kind == DayKind::Work {
                format_duration(day_hours(day))
            } else {
                String::new()
            };
            let flag = if day.needs_review() {
                self.paint("!", "33")
            } else {
                String::new()
            };

            rows.push(vec![name, format!("{:02}", day.date.day()), shifts, hours, flag]);
        }

        write_table(&mut out, headers, rows)?;
        writeln!(out)?;
        writeln!(
            out,
            "{} {}",
            labels.caption(Caption::Total),
            format_duration(week_hours(week))
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, grid, days, labels, now))]
    pub fn print_month(
        &mut self,
        grid: &[MonthGridCell],
        days: &[DaySchedule],
        labels: &dyn CalendarLabels,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let Some(anchor) = grid.iter().find(|cell| cell.is_current_month) else {
            return Ok(());
        };

        writeln!(out, "{}", month_title(anchor.date, labels))?;
        for day in &week_days(anchor.date, labels) {
            write!(
                out,
                "{:<width$}",
                labels.weekday_short(day.date.weekday()),
                width = MONTH_CELL_WIDTH
            )?;
        }
        writeln!(out)?;

        for week in grid.chunks(7) {
            for cell in week {
                let marker = if cell.is_current_month {
                    match day_for(days, cell.date).map(|day| day.kind) {
                        Some(DayKind::Work) => "*",
                        Some(DayKind::Rest) => "~",
                        _ => " ",
                    }
                } else {
                    " "
                };

                let number = format!("{:>2}{marker}", cell.date.day());
                let text = if !cell.is_current_month {
                    self.paint(&number, "2")
                } else if cell.date == now.date() {
                    self.paint(&number, "1;36")
                } else {
                    number
                };
                let visible = UnicodeWidthStr::width(strip_ansi(&text).as_str());
                write!(out, "{text}{}", " ".repeat(MONTH_CELL_WIDTH.saturating_sub(visible)))?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, day, labels, now))]
    pub fn print_day(
        &mut self,
        day: &DaySchedule,
        labels: &dyn CalendarLabels,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{}", day_title(day.date, labels))?;
        if day.needs_review() {
            writeln!(out, "{}", self.paint(labels.caption(Caption::NeedsReview), "33"))?;
        }

        match day.kind {
            DayKind::Work => {
                writeln!(out, "  00{:>width$}", "24", width = TIMELINE_SLOTS - 2)?;
                writeln!(out, "  {}", timeline_bar(day, now, TIMELINE_SLOTS))?;
                for shift in &day.shifts {
                    writeln!(out, "  {shift:<15} {}", format_duration(shift.hours()))?;
                }
                writeln!(
                    out,
                    "  {:<15} {}",
                    labels.caption(Caption::Total),
                    format_duration(day_hours(day))
                )?;
            }
            DayKind::Rest => writeln!(out, "{}", labels.rest_label())?,
            DayKind::Empty => writeln!(out, "{}", labels.empty_label())?,
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, entries, labels))]
    pub fn print_history(&mut self, entries: &[AnalysisEntry], labels: &dyn CalendarLabels) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = captions(labels, &[Caption::Entry, Caption::Week, Caption::Days, Caption::Hours]);

        let rows = entries
            .iter()
            .map(|entry| {
                vec![
                    self.paint(&entry.id.to_string(), "33"),
                    entry.date_range.clone(),
                    entry.schedule.len().to_string(),
                    format_duration(week_hours(&entry.schedule)),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn shift_cell(&self, day: &DaySchedule, labels: &dyn CalendarLabels, now: NaiveDateTime) -> String {
        match day.kind {
            DayKind::Work => {
                let running = active_shift(day, now);
                day.shifts
                    .iter()
                    .map(|shift| {
                        let text = shift.to_string();
                        if running == Some(shift) {
                            self.paint(&text, "32")
                        } else {
                            text
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            }
            DayKind::Rest => labels.rest_label().to_string(),
            DayKind::Empty => labels.empty_label().to_string(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn captions(labels: &dyn CalendarLabels, keys: &[Caption]) -> Vec<String> {
    keys.iter().map(|key| labels.caption(*key).to_string()).collect()
}

fn percent_slot(percent: f64, slots: usize) -> usize {
    let slot = (percent / 100.0 * slots as f64).floor().max(0.0) as usize;
    slot.min(slots.saturating_sub(1))
}

/// One character per slot of the day: `#` while a shift runs, `|` at the
/// current time on today's row. Overnight shifts are cut at midnight.
fn timeline_bar(day: &DaySchedule, now: NaiveDateTime, slots: usize) -> String {
    let mut bar = vec!['.'; slots];
    if day.kind == DayKind::Work {
        for shift in day.shifts.iter().filter(|shift| !shift.is_partial()) {
            let start = percent_slot(shift_offset_percent(shift), slots);
            let len = (shift.hours() / 24.0 * slots as f64).round() as usize;
            for cell in bar.iter_mut().skip(start).take(len) {
                *cell = '#';
            }
        }
    }
    if slots > 0 && day_status(day.date, now) == DayStatus::Today {
        bar[percent_slot(timeline_percent(now), slots)] = '|';
    }
    bar.into_iter().collect()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{captions, strip_ansi, timeline_bar, write_table};
    use crate::locale::{Caption, English, Italian};
    use crate::schedule::{DaySchedule, Shift};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).expect("valid date")
    }

    #[test]
    fn headers_follow_locale() {
        let keys = [Caption::Day, Caption::Shifts, Caption::Hours];
        assert_eq!(captions(&Italian, &keys), vec!["Giorno", "Turni", "Ore"]);
        assert_eq!(captions(&English, &keys), vec!["Day", "Shifts", "Hours"]);
    }

    #[test]
    fn timeline_marks_shifts_and_now() {
        let day = DaySchedule::work(date(28), vec![Shift::new("06:00", "12:00")]);
        let noon = date(28).and_hms_opt(12, 0, 0).expect("valid time");
        assert_eq!(timeline_bar(&day, noon, 24), "......######|...........");

        let next_day = date(29).and_hms_opt(12, 0, 0).expect("valid time");
        assert_eq!(timeline_bar(&day, next_day, 24), "......######............");
    }

    #[test]
    fn timeline_cuts_overnight_shift_and_skips_rest() {
        let night = DaySchedule::work(date(28), vec![Shift::new("18:00", "06:00")]);
        let later = date(30).and_hms_opt(0, 0, 0).expect("valid time");
        assert_eq!(timeline_bar(&night, later, 24), "..................######");

        let rest = DaySchedule::rest(date(28));
        assert_eq!(timeline_bar(&rest, later, 8), "........");
        assert_eq!(timeline_bar(&rest, later, 0), "");
    }

    #[test]
    fn table_pads_by_display_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Day".to_string(), "Hours".to_string()],
            vec![
                vec!["Lunedì".to_string(), "8h 0m".to_string()],
                vec!["\x1b[2mMar\x1b[0m".to_string(), "4h 30m".to_string()],
            ],
        )
        .expect("write table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Day    Hours  ");
        assert_eq!(lines[1], "------ ------ ");
        assert_eq!(lines[2], "Lunedì 8h 0m  ");
        assert_eq!(strip_ansi(lines[3]), "Mar    4h 30m ");
    }
}
