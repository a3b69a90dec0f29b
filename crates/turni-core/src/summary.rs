use serde::Serialize;

use crate::hours::{day_hours, format_duration};
use crate::locale::CalendarLabels;
use crate::schedule::{DayKind, DaySchedule};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeekSummary {
    pub work_days: usize,
    pub rest_days: usize,
    pub empty_days: usize,
    pub uncertain_days: usize,
    pub total_hours: f64,
}

impl WeekSummary {
    pub fn from_days(days: &[DaySchedule]) -> Self {
        days.iter().fold(Self::default(), |mut acc, day| {
            match day.kind {
                DayKind::Work => acc.work_days += 1,
                DayKind::Rest => acc.rest_days += 1,
                DayKind::Empty => acc.empty_days += 1,
            }
            if day.needs_review() {
                acc.uncertain_days += 1;
            }
            acc.total_hours += day_hours(day);
            acc
        })
    }

    pub fn formatted_total(&self) -> String {
        format_duration(self.total_hours)
    }

    pub fn describe(&self, labels: &dyn CalendarLabels) -> String {
        labels.week_summary(self.work_days, self.rest_days, &self.formatted_total())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::WeekSummary;
    use crate::locale::Italian;
    use crate::schedule::{DaySchedule, Shift};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).expect("valid date")
    }

    #[test]
    fn counts_days_and_hours() {
        let mut uncertain = DaySchedule::work(date(29), vec![Shift::new("14:00", "22:00")]);
        uncertain.is_uncertain = true;
        let days = vec![
            DaySchedule::work(date(28), vec![Shift::new("22:00", "06:00")]),
            uncertain,
            DaySchedule::rest(date(30)),
            DaySchedule::empty(date(31)),
        ];

        let summary = WeekSummary::from_days(&days);
        assert_eq!(summary.work_days, 2);
        assert_eq!(summary.rest_days, 1);
        assert_eq!(summary.empty_days, 1);
        assert_eq!(summary.uncertain_days, 1);
        assert_eq!(summary.formatted_total(), "16h 0m");
        assert_eq!(
            summary.describe(&Italian),
            "Settimana con 2 giorni lavorativi e 1 di riposo, con un totale di 16h 0m."
        );
    }
}
