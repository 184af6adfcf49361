//! Cross-discipline duration conversion.
//!
//! When a different sport is done instead of the planned one, the planned
//! duration is rescaled by a factor chosen per (from, to) pair, clamped, and
//! rounded to 5 minutes for display.

use crate::classify::discipline_category;
use crate::duration::parse_duration_min;
use crate::SportCategory;

/// How to rescale a duration between two modalities
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionRule {
    pub factor: f64,
    pub max_cap: Option<u32>,
    pub min_floor: Option<u32>,
    pub explanation: &'static str,
}

impl ConversionRule {
    fn scaled(factor: f64, explanation: &'static str) -> Self {
        Self {
            factor,
            max_cap: None,
            min_floor: None,
            explanation,
        }
    }

    fn capped(mut self, cap: u32) -> Self {
        self.max_cap = Some(cap);
        self
    }

    fn floored(mut self, floor: u32) -> Self {
        self.min_floor = Some(floor);
        self
    }

    /// Apply factor, cap, floor and 5-minute rounding
    pub fn apply(&self, minutes: u32) -> u32 {
        let mut converted = (f64::from(minutes) * self.factor).round() as u32;
        if let Some(cap) = self.max_cap {
            converted = converted.min(cap);
        }
        if let Some(floor) = self.min_floor {
            converted = converted.max(floor);
        }
        round_to_five(converted)
    }
}

fn round_to_five(minutes: u32) -> u32 {
    ((f64::from(minutes) / 5.0).round() as u32) * 5
}

/// Look up the rule for converting `from` into `to`
pub fn conversion_rule(from: SportCategory, to: SportCategory) -> ConversionRule {
    use SportCategory::*;

    let weight_bearing = matches!(from, Hike | Pulka);

    if to == Strength {
        return if weight_bearing {
            ConversionRule::scaled(0.35, "Volume reduced (strength vs. endurance)")
                .capped(75)
                .floored(30)
        } else {
            ConversionRule::scaled(0.8, "Adjusted to a strength session")
                .capped(75)
                .floored(30)
        };
    }

    match (from, to) {
        (Hike | Pulka, Run) => ConversionRule::scaled(0.5, "Factor 0.5 (impact adjustment)").capped(90),
        (Hike | Pulka, Bike | VirtualRide | Row | AirBike) => {
            ConversionRule::scaled(0.6, "Factor 0.6 (intensity adjustment)").capped(120)
        }
        (Run, Bike | VirtualRide) => ConversionRule::scaled(1.5, "Factor 1.5 (metabolic equivalence)"),
        (Run, Hike | Pulka) => ConversionRule::scaled(2.0, "Factor 2.0 (reduced intensity)"),
        (Bike | VirtualRide, Run) => ConversionRule::scaled(0.7, "Factor 0.7 (higher impact)"),
        _ => ConversionRule::scaled(1.0, "Time carried over"),
    }
}

/// A rescaled duration ready for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedDuration {
    pub text: String,
    /// Empty when there was nothing to convert
    pub note: String,
    pub minutes: u32,
}

/// Rescale a planned duration string into the `to` modality.
///
/// `from_discipline` is the planned session's discipline tag.
pub fn convert_duration(
    duration_text: &str,
    from_discipline: &str,
    to: SportCategory,
) -> ConvertedDuration {
    let minutes = parse_duration_min(duration_text);
    if minutes == 0 {
        return ConvertedDuration {
            text: "Free choice".into(),
            note: String::new(),
            minutes: 0,
        };
    }

    let from = discipline_category(from_discipline);
    let rule = conversion_rule(from, to);
    let converted = rule.apply(minutes);

    tracing::debug!(
        "Converted {}m {} -> {}m {} (factor {})",
        minutes,
        from,
        converted,
        to,
        rule.factor
    );

    ConvertedDuration {
        text: format!("~{} min", converted),
        note: format!("Duration adjusted: {} (orig: {}m)", rule.explanation, minutes),
        minutes: converted,
    }
}
