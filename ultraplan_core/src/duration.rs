//! Parsing of human-written duration strings into minutes.
//!
//! The plan tables use a small vocabulary of hand-authored strings such as
//! `"60-90 min"`, `"1h30"`, `"2x45"` or `"45m + 20m"`. The rules below are
//! applied in a fixed order; changing the order changes the minutes computed
//! for existing plan entries.

use once_cell::sync::Lazy;
use regex::Regex;

static HOURS_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)h(\d+)?").expect("hours pattern is valid"));

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("number pattern is valid"));

/// Estimate the minutes described by a duration string.
///
/// Precedence:
/// 1. anything mentioning "rest" is 0
/// 2. `<h>h<m>` tokens become total minutes
/// 3. with a `+` every number is summed
/// 4. with an `x`, a first number below 10 and a second above 10 are
///    multiplied (reps x minutes)
/// 5. two or more numbers are a range and average to the rounded midpoint
/// 6. otherwise the single number
///
/// Values too large for `u32` saturate instead of wrapping.
pub fn parse_duration_min(text: &str) -> u32 {
    let lower = text.to_lowercase();
    if lower.is_empty() || lower.contains("rest") {
        return 0;
    }

    let normalized = HOURS_MINUTES.replace_all(text, |caps: &regex::Captures<'_>| {
        let hours: u32 = caps[1].parse().unwrap_or(0);
        let minutes: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        hours.saturating_mul(60).saturating_add(minutes).to_string()
    });

    let numbers: Vec<u32> = NUMBER
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let Some(&first) = numbers.first() else {
        return 0;
    };

    if text.contains('+') {
        return numbers.iter().fold(0u32, |total, n| total.saturating_add(*n));
    }

    if lower.contains('x') {
        if let Some(&second) = numbers.get(1) {
            if first < 10 && second > 10 {
                return first.saturating_mul(second);
            }
        }
    }

    if let Some(&second) = numbers.get(1) {
        // Half rounds up
        let midpoint = (u64::from(first) + u64::from(second) + 1) / 2;
        return u32::try_from(midpoint).unwrap_or(u32::MAX);
    }

    first
}
