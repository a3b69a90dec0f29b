use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::format::format_date_range;
use crate::hours::shift_hours;
use crate::locale::CalendarLabels;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shift {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl Shift {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// A shift missing either endpoint. It counts for zero hours.
    pub fn is_partial(&self) -> bool {
        self.start.trim().is_empty() || self.end.trim().is_empty()
    }

    pub fn hours(&self) -> f64 {
        shift_hours(&self.start, &self.end)
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{} - {}", self.start, self.end))
    }
}

impl FromStr for Shift {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("expected START-END, got: {s}"))?;
        Ok(Self::new(start.trim(), end.trim()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Work,
    Rest,
    Empty,
}

impl DayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DayKind::Work => "work",
            DayKind::Rest => "rest",
            DayKind::Empty => "empty",
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(DayKind::Work),
            "rest" => Ok(DayKind::Rest),
            "empty" => Ok(DayKind::Empty),
            other => Err(anyhow!("unknown day type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,

    #[serde(rename = "type")]
    pub kind: DayKind,

    #[serde(default)]
    pub shifts: Vec<Shift>,

    #[serde(default, rename = "isUncertain")]
    pub is_uncertain: bool,
}

impl DaySchedule {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            kind: DayKind::Empty,
            shifts: vec![],
            is_uncertain: false,
        }
    }

    pub fn rest(date: NaiveDate) -> Self {
        Self {
            date,
            kind: DayKind::Rest,
            shifts: vec![],
            is_uncertain: false,
        }
    }

    pub fn work(date: NaiveDate, shifts: Vec<Shift>) -> Self {
        Self {
            date,
            kind: DayKind::Work,
            shifts,
            is_uncertain: false,
        }
    }

    /// Replaces the shift list the way the shift editor saves it: any shift
    /// makes the day a work day, none makes it a rest day.
    pub fn with_shifts(mut self, shifts: Vec<Shift>) -> Self {
        self.kind = if shifts.is_empty() {
            DayKind::Rest
        } else {
            DayKind::Work
        };
        self.shifts = shifts;
        self
    }

    pub fn normalized(mut self) -> Self {
        match self.kind {
            DayKind::Work => {
                if self.shifts.iter().any(Shift::is_partial) {
                    self.is_uncertain = true;
                }
            }
            DayKind::Rest | DayKind::Empty => self.shifts.clear(),
        }
        self
    }

    pub fn needs_review(&self) -> bool {
        self.is_uncertain || self.shifts.iter().any(Shift::is_partial)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEntry {
    pub id: i64,
    #[serde(default)]
    pub date_range: String,
    pub schedule: Vec<DaySchedule>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionPayload {
    #[serde(default)]
    date_range: Option<String>,
    schedule: Vec<DaySchedule>,
    #[serde(default)]
    summary: Option<String>,
}

impl AnalysisEntry {
    /// Builds an entry from the structured extraction payload
    /// (`{dateRange, schedule, summary}`).
    pub fn from_json(raw: &str, id: i64, labels: &dyn CalendarLabels) -> anyhow::Result<Self> {
        let payload: ExtractionPayload =
            serde_json::from_str(raw).context("failed to parse schedule payload")?;

        let mut schedule: Vec<DaySchedule> = payload
            .schedule
            .into_iter()
            .map(DaySchedule::normalized)
            .collect();
        schedule.sort_by_key(|day| day.date);

        let date_range = match payload.date_range {
            Some(range) if !range.trim().is_empty() => range,
            _ => schedule
                .first()
                .map(|day| format_date_range(day.date, labels))
                .unwrap_or_default(),
        };

        Ok(Self {
            id,
            date_range,
            schedule,
            summary: payload.summary.unwrap_or_default(),
        })
    }
}

/// Flattens several entries into one date-keyed view. On duplicate dates the
/// entry with the highest id wins.
pub fn merge_days(entries: &[AnalysisEntry]) -> Vec<DaySchedule> {
    let mut ordered: Vec<&AnalysisEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.id);

    let mut by_date: BTreeMap<NaiveDate, DaySchedule> = BTreeMap::new();
    for entry in ordered {
        for day in &entry.schedule {
            by_date.insert(day.date, day.clone());
        }
    }

    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{AnalysisEntry, DayKind, DaySchedule, Shift, merge_days};
    use crate::locale::Italian;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn deserializes_extraction_day() {
        let raw = r#"{"date":"2024-10-28","type":"work","shifts":[{"start":"08:00","end":"14:00"}],"isUncertain":true}"#;
        let day: DaySchedule = serde_json::from_str(raw).expect("parse day");
        assert_eq!(day.date, date(2024, 10, 28));
        assert_eq!(day.kind, DayKind::Work);
        assert_eq!(day.shifts, vec![Shift::new("08:00", "14:00")]);
        assert!(day.is_uncertain);

        let back = serde_json::to_value(&day).expect("serialize day");
        assert_eq!(back["type"], "work");
        assert_eq!(back["isUncertain"], true);
    }

    #[test]
    fn uncertain_flag_defaults_to_false() {
        let raw = r#"{"date":"2024-10-29","type":"rest","shifts":[]}"#;
        let day: DaySchedule = serde_json::from_str(raw).expect("parse day");
        assert!(!day.is_uncertain);
    }

    #[test]
    fn normalization_clears_shifts_on_rest_days() {
        let day = DaySchedule {
            date: date(2024, 10, 29),
            kind: DayKind::Rest,
            shifts: vec![Shift::new("08:00", "12:00")],
            is_uncertain: false,
        }
        .normalized();
        assert!(day.shifts.is_empty());
    }

    #[test]
    fn partial_shift_flags_day_for_review() {
        let day = DaySchedule::work(date(2024, 10, 30), vec![Shift::new("08:00", "")]).normalized();
        assert!(day.is_uncertain);
        assert!(day.needs_review());
        assert_eq!(day.shifts[0].hours(), 0.0);
    }

    #[test]
    fn editing_shifts_switches_day_kind() {
        let day = DaySchedule::empty(date(2024, 10, 31));
        let worked = day.with_shifts(vec![Shift::new("09:00", "13:00")]);
        assert_eq!(worked.kind, DayKind::Work);

        let cleared = worked.with_shifts(vec![]);
        assert_eq!(cleared.kind, DayKind::Rest);
    }

    #[test]
    fn parses_day_kind() {
        assert_eq!(" Rest ".parse::<DayKind>().expect("rest"), DayKind::Rest);
        assert_eq!(DayKind::Work.to_string(), "work");
        assert!("holiday".parse::<DayKind>().is_err());
    }

    #[test]
    fn parses_shift_argument() {
        let shift: Shift = "22:00-06:00".parse().expect("parse shift");
        assert_eq!(shift, Shift::new("22:00", "06:00"));
        assert!("0800".parse::<Shift>().is_err());
    }

    #[test]
    fn entry_without_range_derives_one() {
        let raw = r#"{
            "schedule": [
                {"date":"2024-11-03","type":"rest","shifts":[]},
                {"date":"2024-10-28","type":"work","shifts":[{"start":"08:00","end":"12:00"}]}
            ]
        }"#;
        let entry = AnalysisEntry::from_json(raw, 7, &Italian).expect("parse entry");
        assert_eq!(entry.id, 7);
        assert_eq!(entry.date_range, "28 Ottobre - 03 Novembre 2024");
        assert_eq!(entry.schedule[0].date, date(2024, 10, 28));
        assert!(entry.summary.is_empty());
    }

    #[test]
    fn newest_entry_wins_on_merge() {
        let older = AnalysisEntry {
            id: 1,
            date_range: String::new(),
            schedule: vec![DaySchedule::rest(date(2024, 10, 28))],
            summary: String::new(),
        };
        let newer = AnalysisEntry {
            id: 2,
            date_range: String::new(),
            schedule: vec![
                DaySchedule::work(date(2024, 10, 28), vec![Shift::new("08:00", "12:00")]),
                DaySchedule::rest(date(2024, 10, 27)),
            ],
            summary: String::new(),
        };

        let merged = merge_days(&[newer, older]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].date, date(2024, 10, 27));
        assert_eq!(merged[1].kind, DayKind::Work);
    }
}
