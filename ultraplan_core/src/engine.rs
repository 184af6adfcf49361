//! Suggestion engine: turns a date (and optionally the sport actually done)
//! into the planned session, an alternative and the day's prehab block.
//!
//! Generation follows a fixed cascade:
//! - Exact-date override from the plan
//! - Special week mode (4x4x48, mini expedition, race week) when active
//! - Phase weekday template resolved against the week config

use crate::classify::{classify_sport, is_compatible};
use crate::convert::convert_duration;
use crate::history::aggregate_for_date;
use crate::{
    monday_of, DayPlan, DurationSpec, Error, HistoryEntry, Phase, Plan, Result, SpecialMode,
    SportCategory, SuggestionOutput, TrainingSession, WeekConfig, WeekdayTemplate,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

const DEFAULT_B2B_RATIO: f64 = 0.6;

/// Generate everything shown for one day.
///
/// `sport_text` is what the user did or intends to do instead; an empty string
/// means no alternative is requested. `history` is only used to attach the
/// day's logged activity as `actual`.
pub fn generate_suggestion(
    plan: &Plan,
    date: NaiveDate,
    sport_text: &str,
    history: &[HistoryEntry],
) -> Result<SuggestionOutput> {
    let (phase, week) = plan.resolve(date)?;
    let weekday = date.weekday();

    let (primary, mut alternative, is_special) = match plan.override_for(date) {
        Some(ov) => {
            tracing::debug!("Using override for {}: {}", date, ov.primary.label);
            (ov.primary.clone(), ov.alternative.clone(), false)
        }
        None => match week.special.filter(|mode| mode.is_active_on(weekday)) {
            Some(mode) => {
                tracing::debug!("Special mode {:?} active on {}", mode, date);
                (special_session(mode, weekday), None, true)
            }
            None => (standard_session(phase, week, weekday), None, false),
        },
    };

    // Race week skips prehab on every day, other special weeks only on active days
    let prehab = if !is_special && week.special != Some(SpecialMode::RaceWeek) {
        prehab_session(weekday)
    } else {
        None
    };

    let sport_text = sport_text.trim();
    if !sport_text.is_empty() {
        if let Some(alt) = alternative_for(&primary, sport_text) {
            alternative = Some(alt);
        }
    }

    Ok(SuggestionOutput {
        date,
        phase: phase.clone(),
        week: week.clone(),
        primary,
        alternative,
        prehab,
        is_special,
        actual: aggregate_for_date(date, history),
    })
}

/// Planned session for every day Monday..Sunday of the week containing `date`.
///
/// Days outside the plan get an "Out of plan" placeholder instead of failing
/// the whole week.
pub fn full_week_plan(plan: &Plan, date: NaiveDate, history: &[HistoryEntry]) -> Vec<DayPlan> {
    let monday = monday_of(date);

    (0..7)
        .map(|offset| {
            let day = monday + Duration::days(offset);
            let session = match generate_suggestion(plan, day, "", &[]) {
                Ok(suggestion) => suggestion.primary,
                Err(Error::OutOfRange(_)) => out_of_plan(),
                Err(e) => {
                    tracing::warn!("Failed to generate plan for {}: {}", day, e);
                    out_of_plan()
                }
            };

            DayPlan {
                date: day,
                weekday: day.weekday(),
                session,
                actual: aggregate_for_date(day, history),
            }
        })
        .collect()
}

fn out_of_plan() -> TrainingSession {
    TrainingSession::new("Out of plan", "-", "-", "-", &[])
}

// ============================================================================
// Session builders
// ============================================================================

fn special_session(mode: SpecialMode, weekday: Weekday) -> TrainingSession {
    match mode {
        SpecialMode::FourByFourByFortyEight => TrainingSession::new(
            "4x4x48 Challenge",
            "Run/Walk",
            "Every 4h -> 6.4 km (4 miles)",
            "Z1-Z2",
            &["Start Fri 20:00, finish Sun 20:00", "Consistency beats pace."],
        ),
        SpecialMode::MiniExpedition if weekday == Weekday::Sun => TrainingSession::new(
            "Mini expedition day 3",
            "Hike/Pulka",
            "3h (180 min)",
            "Z1",
            &["March back"],
        ),
        SpecialMode::MiniExpedition => TrainingSession::new(
            "Mini expedition day 1/2",
            "Hike/Pulka",
            "6h (360 min)",
            "Z1-Z2",
            &["Test bivouac gear"],
        ),
        SpecialMode::RaceWeek => TrainingSession::new(
            "RACE WEEK",
            "Rest/Mobility",
            "Max 30 min",
            "Very Low",
            &["Feet up", "Mental prep"],
        ),
    }
}

fn standard_session(phase: &Phase, week: &WeekConfig, weekday: Weekday) -> TrainingSession {
    let template = phase.weekday_templates.get(weekday);
    let duration_text = template_duration(template, week, weekday);
    let (intensity, notes) = intensity_and_notes(&template.kind);

    TrainingSession {
        label: format!("Plan: {}", template.kind.replace('_', " ").to_uppercase()),
        discipline: template
            .kind
            .split('_')
            .next()
            .unwrap_or_default()
            .to_string(),
        duration_text,
        intensity: intensity.to_string(),
        notes: notes.into_iter().map(String::from).collect(),
    }
}

/// Resolve a template's duration against the week config
fn template_duration(template: &WeekdayTemplate, week: &WeekConfig, weekday: Weekday) -> String {
    if weekday == Weekday::Sat && template.dur_min == DurationSpec::ByWeekCalendar {
        return match week.long_sat {
            Some([min, max]) if min == max => format!("{} min", min),
            Some([min, max]) => format!("{}-{} min", min, max),
            None => "See week plan".to_string(),
        };
    }

    if weekday == Weekday::Sun && template.kind.contains("b2b") {
        if let Some([min, max]) = week.b2b_sun {
            return format!("{}-{} min", min, max);
        }
        if let Some([_, sat_max]) = week.long_sat {
            let ratio = template.ratio_of_sat.unwrap_or(DEFAULT_B2B_RATIO);
            return format!("~{} min", (f64::from(sat_max) * ratio).round() as u32);
        }
    }

    match template.dur_min {
        DurationSpec::Range { max: 0, .. } => "Rest".to_string(),
        DurationSpec::Range { min, max } => format!("{}-{} min", min, max),
        DurationSpec::ByWeekCalendar => "Variable".to_string(),
    }
}

/// Intensity and coaching notes keyed by substrings of the template type.
///
/// Later matches replace the intensity and add their note.
const INTENSITY_RULES: &[(&str, &str, &str)] = &[
    ("recovery", "Z1 / Active Recovery", "Very easy, focus on circulation."),
    (
        "quality",
        "Steady (Z3) or Hills",
        "If last week was hard: steady. Otherwise short intervals or hills.",
    ),
    ("pulka", "Muscular endurance", "Keep technique clean. Hips stable."),
    ("strength", "RPE 7-8", "Full body, kettlebell, mace. Brace the trunk."),
    ("longrun", "Z1-Z2 (Endurance)", "Test fueling. Keep the pace low."),
    ("b2b", "Z1 / Hike", "Simulate tired legs. Plenty of walking allowed."),
    ("very_easy", "Z0-Z1", "Taper! Movement only, no training effect."),
];

fn intensity_and_notes(kind: &str) -> (&'static str, Vec<&'static str>) {
    INTENSITY_RULES
        .iter()
        .filter(|(keyword, _, _)| kind.contains(*keyword))
        .fold(("Z1-Z2 (aerobic)", Vec::new()), |(_, mut notes), &(_, intensity, note)| {
            notes.push(note);
            (intensity, notes)
        })
}

fn prehab_session(weekday: Weekday) -> Option<TrainingSession> {
    match weekday {
        Weekday::Mon => Some(TrainingSession::new(
            "Mandatory: PREHAB A (stability & anti-rotation)",
            "strength",
            "30-35 min",
            "Quality",
            &["Hip-hinge drill", "McGill Big-3", "Pallof press (static)", "Suitcase carry"],
        )),
        Weekday::Fri => Some(TrainingSession::new(
            "Mandatory: PREHAB B (strength endurance)",
            "strength",
            "35-40 min",
            "Quality",
            &["Banded hinge", "McGill Big-3 (long)", "Pallof press (repetitive)", "Farmer carry"],
        )),
        _ => None,
    }
}

/// Build a substitute for `primary` when `sport_text` doesn't fit the plan
fn alternative_for(primary: &TrainingSession, sport_text: &str) -> Option<TrainingSession> {
    let category = classify_sport(sport_text);
    if is_compatible(&primary.discipline, category) {
        tracing::debug!("'{}' ({}) fits {}", sport_text, category, primary.discipline);
        return None;
    }

    let label = format!("Alternative: {}", sport_text);
    let session = if category == SportCategory::Other {
        TrainingSession {
            label,
            discipline: category.to_string(),
            duration_text: primary.duration_text.clone(),
            intensity: "By feel".into(),
            notes: vec!["Sport not recognised. Duration carried over.".into()],
        }
    } else {
        let converted = convert_duration(&primary.duration_text, &primary.discipline, category);
        TrainingSession {
            label,
            discipline: category.to_string(),
            duration_text: converted.text,
            intensity: primary.intensity.clone(),
            notes: vec![converted.note],
        }
    };

    tracing::info!("Alternative for {}: {} {}", primary.label, session.discipline, session.duration_text);
    Some(session)
}
