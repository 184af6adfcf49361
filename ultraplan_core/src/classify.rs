//! Sport classification for free-text input and plan discipline tags.

use crate::SportCategory;

/// Keyword lists, tested in this order; the first hit wins.
///
/// The lists overlap ("indoor bike" vs "bike", "lastmarsch" vs "marsch"), so
/// the order is part of the contract.
const SPORT_KEYWORDS: &[(SportCategory, &[&str])] = &[
    (
        SportCategory::Pulka,
        &["pulka", "reifen", "reifenziehen", "zug", "gewichtsweste", "lastmarsch"],
    ),
    (
        SportCategory::Run,
        &["run", "laufen", "jog", "trail", "trailrun", "lauf", "tempo", "hügel"],
    ),
    (
        SportCategory::Hike,
        &["hike", "wandern", "gehen", "marsch", "ruck"],
    ),
    (
        SportCategory::VirtualRide,
        &["virtualride", "zwift", "rolle", "rollentrainer", "trainerroad", "indoor bike"],
    ),
    (
        SportCategory::Bike,
        &["bike", "rad", "ride", "rennrad", "mtb", "ebike"],
    ),
    (
        SportCategory::Row,
        &["c2", "rudern", "rowing", "concept2"],
    ),
    (SportCategory::AirBike, &["airbike", "assault"]),
    (
        SportCategory::Strength,
        &["kb", "kettlebell", "mace", "club", "clubbell", "kraft", "crossfit", "wod", "stabi"],
    ),
];

const REST_KEYWORDS: &[&str] = &["rest", "pause"];
const MOBILITY_KEYWORDS: &[&str] = &["mobility", "yoga", "stret"];

/// Map arbitrary user text to a sport category. Never fails; unknown text is
/// `Other`.
pub fn classify_sport(text: &str) -> SportCategory {
    let lower = text.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if let Some((category, _)) = SPORT_KEYWORDS.iter().find(|(_, keywords)| hit(keywords)) {
        return *category;
    }
    if hit(REST_KEYWORDS) {
        return SportCategory::Rest;
    }
    if hit(MOBILITY_KEYWORDS) {
        return SportCategory::Mobility;
    }
    SportCategory::Other
}

/// Map a plan discipline tag to the category a conversion starts from.
///
/// Rucking is weighted hiking, so `ruck` resolves to `Hike` here exactly as it
/// does in [`classify_sport`].
pub fn discipline_category(discipline: &str) -> SportCategory {
    let lower = discipline.to_lowercase();
    let any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if any(&["ruck", "hike", "walk", "marsch"]) {
        SportCategory::Hike
    } else if any(&["run", "lauf"]) {
        SportCategory::Run
    } else if any(&["rad", "bike", "zwift"]) {
        SportCategory::Bike
    } else if any(&["kraft", "strength"]) {
        SportCategory::Strength
    } else if any(&["pulka", "reifen"]) {
        SportCategory::Pulka
    } else {
        SportCategory::Other
    }
}

/// Whether doing `input` on a day planned as `discipline` counts as following
/// the plan.
pub fn is_compatible(discipline: &str, input: SportCategory) -> bool {
    let plan = discipline.to_lowercase();
    let matches_tag = |tag: &str, category: SportCategory| plan.contains(tag) && input == category;

    matches_tag("run", SportCategory::Run)
        || matches_tag("hike", SportCategory::Hike)
        || matches_tag("ruck", SportCategory::Hike)
        || matches_tag("pulka", SportCategory::Pulka)
        || matches_tag("strength", SportCategory::Strength)
        || (plan.contains("recovery")
            && matches!(input, SportCategory::Mobility | SportCategory::Rest))
        || plan.contains(input.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_inputs() {
        assert_eq!(classify_sport("Trailrun"), SportCategory::Run);
        assert_eq!(classify_sport("Zwift"), SportCategory::VirtualRide);
        assert_eq!(classify_sport("KB Kraft"), SportCategory::Strength);
        assert_eq!(classify_sport("Concept2 Rudern"), SportCategory::Row);
        assert_eq!(classify_sport("Assault Bike"), SportCategory::Bike);
        assert_eq!(classify_sport("Airbike"), SportCategory::Bike);
        assert_eq!(classify_sport("Yoga"), SportCategory::Mobility);
        assert_eq!(classify_sport("Pause"), SportCategory::Rest);
        assert_eq!(classify_sport("Schwimmen"), SportCategory::Other);
    }

    #[test]
    fn test_priority_order() {
        // virtualride is tested before bike
        assert_eq!(classify_sport("Indoor Bike"), SportCategory::VirtualRide);
        // pulka is tested before hike
        assert_eq!(classify_sport("Lastmarsch"), SportCategory::Pulka);
        // run is tested before hike
        assert_eq!(classify_sport("Hügel gehen"), SportCategory::Run);
    }

    #[test]
    fn test_ruck_is_hike() {
        assert_eq!(classify_sport("Ruck"), SportCategory::Hike);
        assert_eq!(discipline_category("ruck"), SportCategory::Hike);
    }

    #[test]
    fn test_discipline_category() {
        assert_eq!(discipline_category("longrun"), SportCategory::Run);
        assert_eq!(discipline_category("virtualride"), SportCategory::Other);
        assert_eq!(discipline_category("Hike/Pulka"), SportCategory::Hike);
        assert_eq!(discipline_category("strength"), SportCategory::Strength);
        assert_eq!(discipline_category("mixed"), SportCategory::Other);
    }

    #[test]
    fn test_compatibility() {
        assert!(is_compatible("longrun", SportCategory::Run));
        assert!(is_compatible("recovery", SportCategory::Mobility));
        assert!(is_compatible("virtualride", SportCategory::VirtualRide));
        assert!(is_compatible("Hike/Pulka", SportCategory::Pulka));
        assert!(is_compatible("ruck", SportCategory::Hike));
        assert!(!is_compatible("ruck", SportCategory::VirtualRide));
        assert!(!is_compatible("pulka", SportCategory::Run));
    }
}
