//! Core domain types for the training planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Plan structure (phases, weekday templates, week configs, overrides)
//! - Sport categories used for classification and conversion
//! - Rendered sessions and suggestion outputs
//! - Logged history entries

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

// ============================================================================
// Dates
// ============================================================================

/// Parse an ISO `YYYY-MM-DD` calendar date.
///
/// The result is a plain calendar date with no timezone attached, so week and
/// range arithmetic never shifts by a day.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Monday of the ISO week containing `date` (Sunday closes the week)
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Inclusive calendar date range, written `YYYY-MM-DD..YYYY-MM-DD` in plan files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl TryFrom<String> for DateRange {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let (start, end) = value
            .split_once("..")
            .ok_or_else(|| format!("date range '{}' is missing '..'", value))?;
        let start = parse_iso_date(start).map_err(|e| e.to_string())?;
        let end = parse_iso_date(end).map_err(|e| e.to_string())?;
        Ok(Self { start, end })
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ============================================================================
// Sport Categories
// ============================================================================

/// Category a free-text sport or plan discipline resolves to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SportCategory {
    Run,
    Hike,
    Pulka,
    #[serde(rename = "virtualride")]
    VirtualRide,
    Bike,
    Row,
    #[serde(rename = "airbike")]
    AirBike,
    Strength,
    Mobility,
    Rest,
    Other,
}

impl SportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SportCategory::Run => "run",
            SportCategory::Hike => "hike",
            SportCategory::Pulka => "pulka",
            SportCategory::VirtualRide => "virtualride",
            SportCategory::Bike => "bike",
            SportCategory::Row => "row",
            SportCategory::AirBike => "airbike",
            SportCategory::Strength => "strength",
            SportCategory::Mobility => "mobility",
            SportCategory::Rest => "rest",
            SportCategory::Other => "other",
        }
    }
}

impl fmt::Display for SportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Plan Structure
// ============================================================================

/// How long a weekday template lasts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDurationSpec", into = "RawDurationSpec")]
pub enum DurationSpec {
    /// Explicit `[min, max]` minutes; `max == 0` marks a rest day
    Range { min: u32, max: u32 },
    /// Derive from the week config (`long_sat` / `b2b_sun`)
    ByWeekCalendar,
}

const BY_WEEK_CALENDAR: &str = "by_week_calendar";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDurationSpec {
    Pair([u32; 2]),
    Keyword(String),
}

impl TryFrom<RawDurationSpec> for DurationSpec {
    type Error = String;

    fn try_from(raw: RawDurationSpec) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawDurationSpec::Pair([min, max]) => Ok(DurationSpec::Range { min, max }),
            RawDurationSpec::Keyword(k) if k == BY_WEEK_CALENDAR => Ok(DurationSpec::ByWeekCalendar),
            RawDurationSpec::Keyword(k) => Err(format!("unknown duration keyword '{}'", k)),
        }
    }
}

impl From<DurationSpec> for RawDurationSpec {
    fn from(spec: DurationSpec) -> Self {
        match spec {
            DurationSpec::Range { min, max } => RawDurationSpec::Pair([min, max]),
            DurationSpec::ByWeekCalendar => RawDurationSpec::Keyword(BY_WEEK_CALENDAR.into()),
        }
    }
}

/// Session template for one weekday of a phase
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekdayTemplate {
    /// Tag such as `longrun`, `b2b_peak` or `recovery_or_c2_ab`
    #[serde(rename = "type")]
    pub kind: String,
    pub dur_min: DurationSpec,
    /// Fraction of Saturday's upper bound used for a back-to-back Sunday
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_of_sat: Option<f64>,
}

/// The seven weekday templates of a phase
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekdayTemplates {
    pub mon: WeekdayTemplate,
    pub tue: WeekdayTemplate,
    pub wed: WeekdayTemplate,
    pub thu: WeekdayTemplate,
    pub fri: WeekdayTemplate,
    pub sat: WeekdayTemplate,
    pub sun: WeekdayTemplate,
}

impl WeekdayTemplates {
    pub fn get(&self, weekday: Weekday) -> &WeekdayTemplate {
        match weekday {
            Weekday::Mon => &self.mon,
            Weekday::Tue => &self.tue,
            Weekday::Wed => &self.wed,
            Weekday::Thu => &self.thu,
            Weekday::Fri => &self.fri,
            Weekday::Sat => &self.sat,
            Weekday::Sun => &self.sun,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &WeekdayTemplate)> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(move |d| (d, self.get(d)))
    }
}

/// A macro training block with a fixed weekly shape
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub key: String,
    pub label: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub weekday_templates: WeekdayTemplates,
}

impl Phase {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to
    }
}

/// Narrative modes that replace normal generation for a week
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMode {
    /// 4 miles every 4 hours for 48 hours
    #[serde(rename = "4x4x48")]
    FourByFourByFortyEight,
    /// Three-day expedition simulation
    MiniExpedition,
    /// Travel and race week
    RaceWeek,
}

impl SpecialMode {
    /// Whether the mode takes over generation on this weekday
    pub fn is_active_on(&self, weekday: Weekday) -> bool {
        match self {
            SpecialMode::FourByFourByFortyEight | SpecialMode::MiniExpedition => {
                matches!(weekday, Weekday::Fri | Weekday::Sat | Weekday::Sun)
            }
            SpecialMode::RaceWeek => true,
        }
    }
}

/// Per-week volume target and long-day bounds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekConfig {
    pub range: DateRange,
    pub hours_target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_sat: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b2b_sun: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialMode>,
}

/// A renderable planned or derived workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingSession {
    pub label: String,
    pub discipline: String,
    pub duration_text: String,
    pub intensity: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl TrainingSession {
    pub fn new(
        label: impl Into<String>,
        discipline: impl Into<String>,
        duration_text: impl Into<String>,
        intensity: impl Into<String>,
        notes: &[&str],
    ) -> Self {
        Self {
            label: label.into(),
            discipline: discipline.into(),
            duration_text: duration_text.into(),
            intensity: intensity.into(),
            notes: notes.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// Hand-authored replacement for one exact date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyOverride {
    pub primary: TrainingSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<TrainingSession>,
}

// ============================================================================
// History and Outputs
// ============================================================================

/// One logged real-world activity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub sport: String,
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_string: Option<String>,
}

/// Everything generated for one day
#[derive(Clone, Debug, Serialize)]
pub struct SuggestionOutput {
    pub date: NaiveDate,
    pub phase: Phase,
    pub week: WeekConfig,
    pub primary: TrainingSession,
    pub alternative: Option<TrainingSession>,
    pub prehab: Option<TrainingSession>,
    pub is_special: bool,
    pub actual: Option<HistoryEntry>,
}

/// One row of a week plan
#[derive(Clone, Debug, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub session: TrainingSession,
    pub actual: Option<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        let d = parse_iso_date("2026-01-05").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(matches!(parse_iso_date("05.01.2026"), Err(Error::InvalidDate(_))));
        assert!(parse_iso_date("2026-02-30").is_err());
    }

    #[test]
    fn test_monday_of_treats_sunday_as_week_end() {
        let sunday = parse_iso_date("2026-01-11").unwrap();
        let monday = parse_iso_date("2026-01-05").unwrap();
        assert_eq!(monday_of(sunday), monday);
        assert_eq!(monday_of(monday), monday);
    }

    #[test]
    fn test_date_range_parsing() {
        let range = DateRange::try_from("2025-10-06..2025-10-12".to_string()).unwrap();
        assert!(range.contains(parse_iso_date("2025-10-12").unwrap()));
        assert!(!range.contains(parse_iso_date("2025-10-13").unwrap()));
        assert_eq!(range.to_string(), "2025-10-06..2025-10-12");
        assert!(DateRange::try_from("2025-10-06".to_string()).is_err());
    }

    #[test]
    fn test_duration_spec_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            dur_min: DurationSpec,
        }

        let range: Holder = toml::from_str("dur_min = [45, 60]").unwrap();
        assert_eq!(range.dur_min, DurationSpec::Range { min: 45, max: 60 });

        let calendar: Holder = toml::from_str(r#"dur_min = "by_week_calendar""#).unwrap();
        assert_eq!(calendar.dur_min, DurationSpec::ByWeekCalendar);

        assert!(toml::from_str::<Holder>(r#"dur_min = "whenever""#).is_err());
    }

    #[test]
    fn test_special_mode_active_days() {
        assert!(SpecialMode::RaceWeek.is_active_on(Weekday::Tue));
        assert!(SpecialMode::MiniExpedition.is_active_on(Weekday::Sun));
        assert!(!SpecialMode::MiniExpedition.is_active_on(Weekday::Mon));
        assert!(!SpecialMode::FourByFourByFortyEight.is_active_on(Weekday::Thu));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(SportCategory::VirtualRide.to_string(), "virtualride");
        assert_eq!(
            serde_json::to_string(&SportCategory::AirBike).unwrap(),
            "\"airbike\""
        );
    }
}
