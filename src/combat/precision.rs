//! Precision scoring of free-text actions
//!
//! Players describe their moves in plain French. The more concrete the
//! description (distances, targets, named techniques), the less likely the
//! move is to fail. Scoring is a pure function of the text.

use serde::{Deserialize, Serialize};

const METRIC_UNITS: &[&str] = &["mètre", "cm", "degré", "angle", "seconde"];
const DIRECTION_TERMS: &[&str] = &[
    "gauche",
    "droite",
    "devant",
    "derrière",
    "diagonal",
    "vertical",
    "horizontal",
];
const TARGET_TERMS: &[&str] = &[
    "tête", "jambe", "bras", "torse", "cou", "épaule", "genou", "cheville",
];
const TECHNIQUE_TERMS: &[&str] = &[
    "uppercut", "crochet", "direct", "jab", "cross", "feinte", "esquive", "parade", "riposte",
];
const EQUIPMENT_TERMS: &[&str] = &[
    "épée", "dague", "bouclier", "lance", "arc", "bâton", "masse", "hache",
];
const STANCE_TERMS: &[&str] = &[
    "accroupi",
    "debout",
    "en garde",
    "en position",
    "en appui",
    "en équilibre",
];

/// How detailed an action description is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl PrecisionLevel {
    pub fn all() -> [PrecisionLevel; 5] {
        [
            PrecisionLevel::VeryLow,
            PrecisionLevel::Low,
            PrecisionLevel::Medium,
            PrecisionLevel::High,
            PrecisionLevel::VeryHigh,
        ]
    }

    /// Baseline chance that an action at this level fails
    pub fn base_risk(&self) -> f64 {
        match self {
            PrecisionLevel::VeryHigh => 0.0,
            PrecisionLevel::High => 0.1,
            PrecisionLevel::Medium => 0.3,
            PrecisionLevel::Low => 0.7,
            PrecisionLevel::VeryLow => 0.9,
        }
    }

    /// Staircase from raw score to level
    pub fn from_score(score: u32) -> Self {
        match score {
            8.. => PrecisionLevel::VeryHigh,
            6..=7 => PrecisionLevel::High,
            4..=5 => PrecisionLevel::Medium,
            2..=3 => PrecisionLevel::Low,
            _ => PrecisionLevel::VeryLow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrecisionLevel::VeryLow => "very_low",
            PrecisionLevel::Low => "low",
            PrecisionLevel::Medium => "medium",
            PrecisionLevel::High => "high",
            PrecisionLevel::VeryHigh => "very_high",
        }
    }
}

/// Which kinds of detail an action mentions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detectors {
    /// A number followed by a unit ("2 mètres", "45 degrés")
    pub metric: bool,
    pub direction: bool,
    /// A specific body part
    pub target: bool,
    /// A named combat technique
    pub technique: bool,
    pub equipment: bool,
    pub stance: bool,
}

/// Full breakdown of a precision evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionReport {
    pub level: PrecisionLevel,
    pub score: u32,
    /// Tokens longer than two characters
    pub word_count: usize,
    pub detectors: Detectors,
}

/// Score an action description
///
/// Empty or unrecognizable text lands on [`PrecisionLevel::VeryLow`].
pub fn evaluate(action: &str) -> PrecisionReport {
    let lower = action.to_lowercase();
    let word_count = count_words(action);

    let detectors = Detectors {
        metric: has_metric(&lower),
        direction: contains_any(&lower, DIRECTION_TERMS),
        target: contains_any(&lower, TARGET_TERMS),
        technique: contains_any(&lower, TECHNIQUE_TERMS),
        equipment: contains_any(&lower, EQUIPMENT_TERMS),
        stance: contains_any(&lower, STANCE_TERMS),
    };

    let mut score = length_points(word_count, detectors.metric);
    if detectors.direction {
        score += 1;
    }
    if detectors.target {
        score += 1;
    }
    if detectors.technique {
        score += 2;
    }
    if detectors.equipment {
        score += 1;
    }
    if detectors.stance {
        score += 1;
    }
    if detectors.metric {
        score += 2;
    }

    PrecisionReport {
        level: PrecisionLevel::from_score(score),
        score,
        word_count,
        detectors,
    }
}

/// Shorthand for `evaluate(action).level`
pub fn precision_level(action: &str) -> PrecisionLevel {
    evaluate(action).level
}

fn length_points(word_count: usize, has_metric: bool) -> u32 {
    if word_count >= 25 && has_metric {
        4
    } else if word_count >= 15 {
        3
    } else if word_count >= 8 {
        2
    } else if word_count >= 5 {
        1
    } else {
        0
    }
}

fn count_words(action: &str) -> usize {
    action
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .count()
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

/// Find a digit run followed, after optional whitespace, by a unit
fn has_metric(text: &str) -> bool {
    let mut rest = text;
    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let after_digits = rest[start..].trim_start_matches(|c: char| c.is_ascii_digit());
        let after_space = after_digits.trim_start();
        if METRIC_UNITS.iter().any(|unit| after_space.starts_with(unit)) {
            return true;
        }
        rest = after_digits;
    }
    false
}

/// Distance mentioned in an action ("3 mètres" → "3mètre", "40cm" → "40cm")
pub fn extract_distance(action: &str) -> Option<String> {
    find_number_with_unit(&action.to_lowercase(), &["mètre", "cm", "m"])
        .map(|(number, unit)| format!("{}{}", number, unit))
}

/// Angle mentioned in an action, numeric or descriptive
pub fn extract_angle(action: &str) -> Option<String> {
    let lower = action.to_lowercase();
    if let Some((number, _)) = find_number_with_unit(&lower, &["degré", "°"]) {
        return Some(format!("{}°", number));
    }
    if lower.contains("circulaire") {
        return Some("circulaire (180°)".to_string());
    }
    if lower.contains("latéral") {
        return Some("latéral (90°)".to_string());
    }
    if lower.contains("frontal") || lower.contains("direct") {
        return Some("frontal (0°)".to_string());
    }
    None
}

fn find_number_with_unit<'a>(text: &'a str, units: &[&'static str]) -> Option<(&'a str, &'static str)> {
    let mut rest = text;
    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let from_digits = &rest[start..];
        let after_digits = from_digits.trim_start_matches(|c: char| c.is_ascii_digit());
        let number = &from_digits[..from_digits.len() - after_digits.len()];
        let after_space = after_digits.trim_start();
        if let Some(unit) = units.iter().find(|unit| after_space.starts_with(**unit)) {
            return Some((number, unit));
        }
        rest = after_digits;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAILED_ATTACK: &str = "Je me place en garde, pied gauche devant, puis je recule \
        de 2 mètres avant de lancer un uppercut puissant vers la tête de mon adversaire \
        en gardant mon poids bien réparti sur mes deux jambes fléchies pour rester stable \
        pendant tout le mouvement";

    #[test]
    fn test_risk_grows_as_precision_drops() {
        let risks: Vec<f64> = PrecisionLevel::all().iter().map(|l| l.base_risk()).collect();
        // all() is ordered from very_low to very_high
        assert!(risks.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(risks.iter().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn test_bare_attack_is_very_low() {
        let report = evaluate("j'attaque");
        assert_eq!(report.word_count, 1);
        assert_eq!(report.score, 0);
        assert_eq!(report.level, PrecisionLevel::VeryLow);
        assert_eq!(report.level.base_risk(), 0.9);
    }

    #[test]
    fn test_empty_text_is_very_low() {
        assert_eq!(precision_level(""), PrecisionLevel::VeryLow);
        assert_eq!(precision_level("   \n\t"), PrecisionLevel::VeryLow);
        assert_eq!(precision_level("?!"), PrecisionLevel::VeryLow);
    }

    #[test]
    fn test_detailed_attack_is_very_high() {
        let report = evaluate(DETAILED_ATTACK);
        assert!(report.word_count >= 25);
        assert!(report.detectors.metric);
        assert!(report.detectors.technique);
        assert!(report.detectors.target);
        assert!(report.detectors.stance);
        assert_eq!(report.level, PrecisionLevel::VeryHigh);
        assert_eq!(report.level.base_risk(), 0.0);
    }

    #[test]
    fn test_metric_needs_number_and_unit() {
        assert!(has_metric("je recule de 3 mètres"));
        assert!(has_metric("rotation de 45degrés"));
        assert!(has_metric("pendant 2   secondes"));
        assert!(!has_metric("je recule de quelques mètres"));
        assert!(!has_metric("j'ai 3 épées"));
    }

    #[test]
    fn test_detectors_are_case_insensitive() {
        let report = evaluate("FEINTE vers la GAUCHE avec mon ÉPÉE");
        assert!(report.detectors.technique);
        assert!(report.detectors.direction);
        assert!(report.detectors.equipment);
    }

    #[test]
    fn test_score_staircase() {
        assert_eq!(PrecisionLevel::from_score(0), PrecisionLevel::VeryLow);
        assert_eq!(PrecisionLevel::from_score(1), PrecisionLevel::VeryLow);
        assert_eq!(PrecisionLevel::from_score(2), PrecisionLevel::Low);
        assert_eq!(PrecisionLevel::from_score(4), PrecisionLevel::Medium);
        assert_eq!(PrecisionLevel::from_score(6), PrecisionLevel::High);
        assert_eq!(PrecisionLevel::from_score(8), PrecisionLevel::VeryHigh);
        assert_eq!(PrecisionLevel::from_score(12), PrecisionLevel::VeryHigh);
    }

    #[test]
    fn test_medium_action() {
        // 5 long words (+1), technique (+2), target (+1)
        let report = evaluate("Je tente un crochet rapide vers son genou");
        assert_eq!(report.score, 4);
        assert_eq!(report.level, PrecisionLevel::Medium);
    }

    #[test]
    fn test_extract_distance_and_angle() {
        assert_eq!(extract_distance("je bondis de 3 mètres"), Some("3mètre".to_string()));
        assert_eq!(extract_distance("recul de 40cm"), Some("40cm".to_string()));
        assert_eq!(extract_distance("je frappe"), None);

        assert_eq!(extract_angle("coup à 45 degrés"), Some("45°".to_string()));
        assert_eq!(extract_angle("un balayage circulaire"), Some("circulaire (180°)".to_string()));
        assert_eq!(extract_angle("un direct au visage"), Some("frontal (0°)".to_string()));
        assert_eq!(extract_angle("je frappe"), None);
    }
}
