//! The periodized plan: phases, week configs and daily overrides.
//!
//! The built-in plan is compiled into the binary as TOML and parsed once on
//! first use. A plan file with the same schema can replace it.

use crate::{DailyOverride, DurationSpec, Error, Phase, Result, WeekConfig};
use chrono::{Duration, NaiveDate};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_PLAN: &str = include_str!("../data/plan.toml");

static BUILTIN: OnceCell<Plan> = OnceCell::new();

/// Immutable plan tables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub phases: Vec<Phase>,
    pub weeks: Vec<WeekConfig>,
    #[serde(default)]
    pub overrides: BTreeMap<NaiveDate, DailyOverride>,
}

impl Plan {
    /// The plan shipped with the crate
    pub fn builtin() -> Result<&'static Plan> {
        BUILTIN.get_or_try_init(|| {
            let plan = Self::from_toml_str(BUILTIN_PLAN)?;
            tracing::debug!(
                "Parsed built-in plan: {} phases, {} weeks, {} overrides",
                plan.phases.len(),
                plan.weeks.len(),
                plan.overrides.len()
            );
            Ok(plan)
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a plan file, rejecting it if validation finds problems
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let plan = Self::from_toml_str(&contents)?;

        let errors = plan.validate();
        if !errors.is_empty() {
            return Err(Error::PlanValidation(format!(
                "{:?}: {}",
                path,
                errors.join("; ")
            )));
        }

        tracing::info!("Loaded plan from {:?}", path);
        Ok(plan)
    }

    /// Load from `path` when given, otherwise the built-in plan
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::builtin()?.clone()),
        }
    }

    pub fn find_phase(&self, date: NaiveDate) -> Option<&Phase> {
        self.phases.iter().find(|p| p.contains(date))
    }

    pub fn find_week(&self, date: NaiveDate) -> Option<&WeekConfig> {
        self.weeks.iter().find(|w| w.range.contains(date))
    }

    /// Resolve the phase and week for a date, or fail with `OutOfRange`
    pub fn resolve(&self, date: NaiveDate) -> Result<(&Phase, &WeekConfig)> {
        match (self.find_phase(date), self.find_week(date)) {
            (Some(phase), Some(week)) => Ok((phase, week)),
            _ => Err(Error::OutOfRange(date)),
        }
    }

    /// Exact-date override, if one was authored
    pub fn override_for(&self, date: NaiveDate) -> Option<&DailyOverride> {
        self.overrides.get(&date)
    }

    /// First and last date covered by the phases
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.phases.iter().map(|p| p.date_from).min()?;
        let end = self.phases.iter().map(|p| p.date_to).max()?;
        Some((start, end))
    }

    /// Validate the plan for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.phases.is_empty() {
            errors.push("Plan has no phases".to_string());
        }
        if self.weeks.is_empty() {
            errors.push("Plan has no weeks".to_string());
        }

        for phase in &self.phases {
            if phase.key.is_empty() {
                errors.push(format!("Phase '{}' has empty key", phase.label));
            }
            if phase.date_from > phase.date_to {
                errors.push(format!(
                    "Phase '{}' ends ({}) before it starts ({})",
                    phase.key, phase.date_to, phase.date_from
                ));
            }
            for (weekday, template) in phase.weekday_templates.iter() {
                if let DurationSpec::Range { min, max } = template.dur_min {
                    if min > max {
                        errors.push(format!(
                            "Phase '{}' {:?} has min {} above max {}",
                            phase.key, weekday, min, max
                        ));
                    }
                }
            }
        }

        let mut phase_ranges: Vec<_> = self.phases.iter().map(|p| (p.date_from, p.date_to)).collect();
        check_contiguous("Phase", &mut phase_ranges, &mut errors);

        for week in &self.weeks {
            if week.range.start > week.range.end {
                errors.push(format!("Week {} ends before it starts", week.range));
            }
            for (name, bounds) in [("long_sat", week.long_sat), ("b2b_sun", week.b2b_sun)] {
                if let Some([min, max]) = bounds {
                    if min > max {
                        errors.push(format!(
                            "Week {} {} has min {} above max {}",
                            week.range, name, min, max
                        ));
                    }
                }
            }
        }

        let mut week_ranges: Vec<_> = self.weeks.iter().map(|w| (w.range.start, w.range.end)).collect();
        check_contiguous("Week", &mut week_ranges, &mut errors);

        let phase_span = span_of(&phase_ranges);
        let week_span = span_of(&week_ranges);
        if let (Some(p), Some(w)) = (phase_span, week_span) {
            if p != w {
                errors.push(format!(
                    "Phases cover {}..{} but weeks cover {}..{}",
                    p.0, p.1, w.0, w.1
                ));
            }
        }

        if let Some((start, end)) = phase_span {
            for date in self.overrides.keys() {
                if *date < start || *date > end {
                    errors.push(format!("Override {} lies outside the plan", date));
                }
            }
        }

        errors
    }
}

fn span_of(ranges: &[(NaiveDate, NaiveDate)]) -> Option<(NaiveDate, NaiveDate)> {
    let start = ranges.iter().map(|r| r.0).min()?;
    let end = ranges.iter().map(|r| r.1).max()?;
    Some((start, end))
}

/// Ranges sorted by start must abut exactly: no gaps, no overlaps
fn check_contiguous(kind: &str, ranges: &mut [(NaiveDate, NaiveDate)], errors: &mut Vec<String>) {
    ranges.sort();
    for pair in ranges.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let expected = prev.1 + Duration::days(1);
        if next.0 < expected {
            errors.push(format!(
                "{} ranges overlap: {}..{} and {}..{}",
                kind, prev.0, prev.1, next.0, next.1
            ));
        } else if next.0 > expected {
            errors.push(format!(
                "{} ranges leave a gap between {} and {}",
                kind, prev.1, next.0
            ));
        }
    }
}
