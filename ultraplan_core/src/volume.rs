//! Planned versus logged hours per plan week.

use crate::history::entries_between;
use crate::{HistoryEntry, Plan};
use chrono::NaiveDate;
use serde::Serialize;

/// One plan week with its target and logged hours
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WeekVolume {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub hours_target: f64,
    /// Logged minutes / 60, one decimal
    pub actual_hours: f64,
    pub is_current: bool,
    pub is_past: bool,
}

pub fn weekly_volume(plan: &Plan, history: &[HistoryEntry], today: NaiveDate) -> Vec<WeekVolume> {
    plan.weeks
        .iter()
        .map(|week| {
            let (start, end) = (week.range.start, week.range.end);
            let minutes: u32 = entries_between(history, start, end)
                .map(|e| e.duration_min)
                .sum();

            WeekVolume {
                start,
                end,
                hours_target: week.hours_target,
                actual_hours: (f64::from(minutes) / 60.0 * 10.0).round() / 10.0,
                is_current: week.range.contains(today),
                is_past: end < today,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_iso_date;

    fn date(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    fn entry(d: &str, minutes: u32) -> HistoryEntry {
        HistoryEntry {
            date: date(d),
            sport: "Walk".into(),
            duration_min: minutes,
            distance_km: None,
            original_string: None,
        }
    }

    #[test]
    fn test_weekly_volume() {
        let plan = Plan::builtin().unwrap();
        let history = vec![
            entry("2025-10-06", 50),
            entry("2025-10-12", 120),
            entry("2025-10-13", 45),
            entry("2025-09-30", 300),
        ];

        let weeks = weekly_volume(plan, &history, date("2025-10-15"));
        assert_eq!(weeks.len(), plan.weeks.len());

        let first = &weeks[0];
        assert_eq!(first.hours_target, 8.5);
        // 170 min
        assert_eq!(first.actual_hours, 2.8);
        assert!(first.is_past);
        assert!(!first.is_current);

        let second = &weeks[1];
        assert_eq!(second.actual_hours, 0.8);
        assert!(second.is_current);
        assert!(!second.is_past);

        assert!(weeks[2..].iter().all(|w| !w.is_past && !w.is_current && w.actual_hours == 0.0));
    }
}
