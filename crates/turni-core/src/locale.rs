use std::str::FromStr;

use anyhow::anyhow;
use chrono::Weekday;

/// Localized names used by calendar views and summaries.
pub trait CalendarLabels: Send + Sync {
    fn weekday_name(&self, weekday: Weekday) -> &'static str;

    fn weekday_short(&self, weekday: Weekday) -> &'static str;

    /// `month` is 1-based. Out of range values yield an empty string.
    fn month_name(&self, month: u32) -> &'static str;

    fn rest_label(&self) -> &'static str;

    fn empty_label(&self) -> &'static str;

    fn week_summary(&self, work_days: usize, rest_days: usize, total: &str) -> String;

    /// Fixed words printed around the calendar: table headers and notices.
    fn caption(&self, caption: Caption) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caption {
    Day,
    Date,
    Shifts,
    Hours,
    Entry,
    Week,
    Days,
    Total,
    NeedsReview,
    Imported,
    Deleted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Italian;

#[derive(Debug, Clone, Copy, Default)]
pub struct English;

const IT_WEEKDAYS: [&str; 7] = [
    "Lunedì",
    "Martedì",
    "Mercoledì",
    "Giovedì",
    "Venerdì",
    "Sabato",
    "Domenica",
];
const IT_WEEKDAYS_SHORT: [&str; 7] = ["Lun", "Mar", "Mer", "Gio", "Ven", "Sab", "Dom"];
const IT_MONTHS: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

const EN_WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const EN_WEEKDAYS_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn weekday_slot(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

fn month_slot(names: &[&'static str; 12], month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| names.get(idx as usize))
        .copied()
        .unwrap_or("")
}

impl CalendarLabels for Italian {
    fn weekday_name(&self, weekday: Weekday) -> &'static str {
        IT_WEEKDAYS[weekday_slot(weekday)]
    }

    fn weekday_short(&self, weekday: Weekday) -> &'static str {
        IT_WEEKDAYS_SHORT[weekday_slot(weekday)]
    }

    fn month_name(&self, month: u32) -> &'static str {
        month_slot(&IT_MONTHS, month)
    }

    fn rest_label(&self) -> &'static str {
        "Riposo"
    }

    fn empty_label(&self) -> &'static str {
        "-"
    }

    fn week_summary(&self, work_days: usize, rest_days: usize, total: &str) -> String {
        let work = if work_days == 1 {
            "giorno lavorativo"
        } else {
            "giorni lavorativi"
        };
        format!("Settimana con {work_days} {work} e {rest_days} di riposo, con un totale di {total}.")
    }

    fn caption(&self, caption: Caption) -> &'static str {
        match caption {
            Caption::Day => "Giorno",
            Caption::Date => "Data",
            Caption::Shifts => "Turni",
            Caption::Hours => "Ore",
            Caption::Entry => "ID",
            Caption::Week => "Settimana",
            Caption::Days => "Giorni",
            Caption::Total => "Totale",
            Caption::NeedsReview => "Da verificare",
            Caption::Imported => "Importato",
            Caption::Deleted => "Eliminato",
        }
    }
}

impl CalendarLabels for English {
    fn weekday_name(&self, weekday: Weekday) -> &'static str {
        EN_WEEKDAYS[weekday_slot(weekday)]
    }

    fn weekday_short(&self, weekday: Weekday) -> &'static str {
        EN_WEEKDAYS_SHORT[weekday_slot(weekday)]
    }

    fn month_name(&self, month: u32) -> &'static str {
        month_slot(&EN_MONTHS, month)
    }

    fn rest_label(&self) -> &'static str {
        "Rest"
    }

    fn empty_label(&self) -> &'static str {
        "-"
    }

    fn week_summary(&self, work_days: usize, rest_days: usize, total: &str) -> String {
        let work = if work_days == 1 {
            "working day"
        } else {
            "working days"
        };
        let rest = if rest_days == 1 { "rest day" } else { "rest days" };
        format!("Week with {work_days} {work} and {rest_days} {rest}, totalling {total}.")
    }

    fn caption(&self, caption: Caption) -> &'static str {
        match caption {
            Caption::Day => "Day",
            Caption::Date => "Date",
            Caption::Shifts => "Shifts",
            Caption::Hours => "Hours",
            Caption::Entry => "ID",
            Caption::Week => "Week",
            Caption::Days => "Days",
            Caption::Total => "Total",
            Caption::NeedsReview => "Please review",
            Caption::Imported => "Imported",
            Caption::Deleted => "Deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    It,
    En,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::It => "it",
            Locale::En => "en",
        }
    }

    pub fn labels(self) -> &'static dyn CalendarLabels {
        match self {
            Locale::It => &Italian,
            Locale::En => &English,
        }
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let language = lower
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        match language {
            "it" => Ok(Locale::It),
            "en" => Ok(Locale::En),
            _ => Err(anyhow!("unsupported locale: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::{Caption, CalendarLabels, English, Italian, Locale};

    #[test]
    fn parses_locale_tags() {
        assert_eq!("it".parse::<Locale>().expect("it"), Locale::It);
        assert_eq!("it-IT".parse::<Locale>().expect("it-IT"), Locale::It);
        assert_eq!("en_US".parse::<Locale>().expect("en_US"), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn italian_labels() {
        assert_eq!(Italian.weekday_name(Weekday::Mon), "Lunedì");
        assert_eq!(Italian.weekday_short(Weekday::Sun), "Dom");
        assert_eq!(Italian.month_name(10), "Ottobre");
        assert_eq!(Italian.month_name(0), "");
        assert_eq!(Italian.month_name(13), "");
    }

    #[test]
    fn captions_follow_locale() {
        assert_eq!(Italian.caption(Caption::Shifts), "Turni");
        assert_eq!(Italian.caption(Caption::Total), "Totale");
        assert_eq!(English.caption(Caption::Shifts), "Shifts");
        assert_eq!(Locale::En.labels().caption(Caption::Hours), "Hours");
        assert_eq!(Locale::It.tag(), "it");
    }

    #[test]
    fn summary_sentences() {
        assert_eq!(
            Italian.week_summary(5, 2, "38h 0m"),
            "Settimana con 5 giorni lavorativi e 2 di riposo, con un totale di 38h 0m."
        );
        assert_eq!(
            English.week_summary(1, 1, "8h 0m"),
            "Week with 1 working day and 1 rest day, totalling 8h 0m."
        );
    }
}
