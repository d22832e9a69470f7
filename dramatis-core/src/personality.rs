//! Personality analytics: trait ranking, intensity classification,
//! cross-character trait frequency and personality comparison.
//!
//! Every function here is a pure read over one or more [`Character`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DramatisError, Result};
use crate::stats;
use crate::types::{Character, Intensity, PersonalityTrait};

/// Default number of traits reported as dominant.
pub const DEFAULT_DOMINANT_COUNT: usize = 3;

/// Minimum number of characters for a personality comparison.
pub const MIN_COMPARISON_SIZE: usize = 2;

// ---------------------------------------------------------------------------
// Ranking & classification
// ---------------------------------------------------------------------------

/// Traits sorted by weight descending. Ties keep insertion order.
#[must_use]
pub fn rank_traits(character: &Character) -> Vec<&PersonalityTrait> {
    let mut ranked: Vec<&PersonalityTrait> = character.personality_traits.iter().collect();
    ranked.sort_by(|a, b| b.weight.cmp(&a.weight));
    ranked
}

/// The top `k` ranked traits.
#[must_use]
pub fn dominant_traits(character: &Character, k: usize) -> Vec<&PersonalityTrait> {
    let mut ranked = rank_traits(character);
    ranked.truncate(k);
    ranked
}

/// Classify a raw weight into High / Medium / Low.
#[must_use]
pub fn classify(weight: u8) -> Intensity {
    Intensity::from_weight(weight)
}

/// Aggregate weight figures for one character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensitySummary {
    /// Sum of all trait weights.
    pub total_weight: u32,
    /// Mean weight, one decimal place, rounded half-up.
    pub average_weight: f64,
    /// Name of the highest-ranked trait.
    pub dominant_trait: String,
}

/// Total, average and dominant trait of a character.
///
/// # Errors
/// Returns [`DramatisError::EmptyTraits`] when the character has no traits;
/// the average is undefined in that case.
pub fn intensity_summary(character: &Character) -> Result<IntensitySummary> {
    let Some(dominant) = rank_traits(character).first().copied() else {
        return Err(DramatisError::EmptyTraits(character.name.clone()));
    };
    let total_weight = character.total_weight();
    let count = character.personality_traits.len() as u64;

    Ok(IntensitySummary {
        total_weight,
        average_weight: stats::one_decimal(u64::from(total_weight), count),
        dominant_trait: dominant.name.clone(),
    })
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

/// How many facets a personality has, by trait count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitComplexity {
    /// Three traits or fewer.
    Focused,
    /// Four to six traits.
    Balanced,
    /// More than six traits.
    Complex,
}

impl TraitComplexity {
    /// Tier for a trait count.
    #[must_use]
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=3 => Self::Focused,
            4..=6 => Self::Balanced,
            _ => Self::Complex,
        }
    }
}

/// Overall strength of a personality, by average trait weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityTone {
    /// Average weight of 7 or more.
    Strong,
    /// Average weight of 5 up to 7.
    Balanced,
    /// Average weight below 5.
    Subtle,
}

impl IntensityTone {
    /// Tier for the exact average `total / count`. `count` must be non-zero.
    #[must_use]
    pub fn from_totals(total: u32, count: usize) -> Self {
        let total = u64::from(total);
        let count = count as u64;
        if total >= 7 * count {
            Self::Strong
        } else if total >= 5 * count {
            Self::Balanced
        } else {
            Self::Subtle
        }
    }
}

/// One deterministic statement about a character's personality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PersonalityInsight {
    /// Traits weighted 8 or more.
    StrongTraits(Vec<String>),
    /// Traits weighted 5 to 7.
    ModerateTraits(Vec<String>),
    /// Traits weighted below 5.
    SubtleTraits(Vec<String>),
    /// Trait-count tier.
    Complexity(TraitComplexity),
    /// Average-weight tier.
    Intensity(IntensityTone),
}

impl fmt::Display for PersonalityInsight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongTraits(names) => write!(
                f,
                "Strong Traits: {} - These are defining characteristics that strongly influence behavior.",
                names.join(", ")
            ),
            Self::ModerateTraits(names) => write!(
                f,
                "Moderate Traits: {} - These traits provide balance and nuance to the character.",
                names.join(", ")
            ),
            Self::SubtleTraits(names) => write!(
                f,
                "Subtle Traits: {} - These are background characteristics that may emerge in specific situations.",
                names.join(", ")
            ),
            Self::Complexity(TraitComplexity::Focused) => f.write_str(
                "Personality: This character has a focused, well-defined personality with clear dominant traits.",
            ),
            Self::Complexity(TraitComplexity::Balanced) => f.write_str(
                "Personality: This character has a balanced personality with good depth and variety.",
            ),
            Self::Complexity(TraitComplexity::Complex) => f.write_str(
                "Personality: This character has a complex personality with many facets and potential for growth.",
            ),
            Self::Intensity(IntensityTone::Strong) => {
                f.write_str("Intensity: This character has strong, pronounced personality traits.")
            }
            Self::Intensity(IntensityTone::Balanced) => f.write_str(
                "Intensity: This character has balanced personality traits with moderate intensity.",
            ),
            Self::Intensity(IntensityTone::Subtle) => {
                f.write_str("Intensity: This character has subtle, understated personality traits.")
            }
        }
    }
}

/// Insight statements in fixed order: strong, moderate and subtle trait
/// buckets (each only when non-empty), then complexity, then intensity.
///
/// A character without traits yields no insights.
#[must_use]
pub fn insights(character: &Character) -> Vec<PersonalityInsight> {
    let traits = &character.personality_traits;
    if traits.is_empty() {
        return Vec::new();
    }

    let bucket = |level: Intensity| -> Vec<String> {
        traits
            .iter()
            .filter(|t| t.intensity() == level)
            .map(|t| t.name.clone())
            .collect()
    };

    let mut out = Vec::with_capacity(5);
    let high = bucket(Intensity::High);
    if !high.is_empty() {
        out.push(PersonalityInsight::StrongTraits(high));
    }
    let medium = bucket(Intensity::Medium);
    if !medium.is_empty() {
        out.push(PersonalityInsight::ModerateTraits(medium));
    }
    let low = bucket(Intensity::Low);
    if !low.is_empty() {
        out.push(PersonalityInsight::SubtleTraits(low));
    }
    out.push(PersonalityInsight::Complexity(TraitComplexity::from_count(traits.len())));
    out.push(PersonalityInsight::Intensity(IntensityTone::from_totals(
        character.total_weight(),
        traits.len(),
    )));
    out
}

// ---------------------------------------------------------------------------
// Cross-character aggregation
// ---------------------------------------------------------------------------

/// Number of characters carrying each trait name, in first-seen order.
///
/// Names match exactly (case-sensitive); weights are ignored.
#[must_use]
pub fn trait_frequency<'a>(characters: impl IntoIterator<Item = &'a Character>) -> IndexMap<String, usize> {
    let mut frequency: IndexMap<String, usize> = IndexMap::new();
    for character in characters {
        for t in &character.personality_traits {
            *frequency.entry(t.name.clone()).or_default() += 1;
        }
    }
    frequency
}

/// A trait shared by more than one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitOverlap {
    /// Trait name.
    pub name: String,
    /// Number of characters carrying it.
    pub count: usize,
}

/// Trait statistics across a group of characters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityComparison {
    /// Number of characters compared.
    pub total_characters: usize,
    /// Characters per trait name, first-seen order.
    pub trait_frequency: IndexMap<String, usize>,
    /// Mean weight per trait over the characters that have it, one decimal.
    pub average_weights: IndexMap<String, f64>,
    /// Traits held by more than one character, most common first, then by
    /// name.
    pub overlap: Vec<TraitOverlap>,
}

/// Outcome of [`compare_personalities`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    /// Enough characters were supplied.
    Compared(PersonalityComparison),
    /// Fewer than [`MIN_COMPARISON_SIZE`] characters were supplied.
    Insufficient {
        /// Number of characters supplied.
        supplied: usize,
    },
}

impl Comparison {
    /// The comparison, if one was made.
    #[must_use]
    pub fn as_compared(&self) -> Option<&PersonalityComparison> {
        match self {
            Self::Compared(c) => Some(c),
            Self::Insufficient { .. } => None,
        }
    }

    /// Convert the sentinel into [`DramatisError::InsufficientData`].
    ///
    /// # Errors
    /// Returns the error when fewer than two characters were compared.
    pub fn into_result(self) -> Result<PersonalityComparison> {
        match self {
            Self::Compared(c) => Ok(c),
            Self::Insufficient { supplied } => Err(DramatisError::InsufficientData {
                required: MIN_COMPARISON_SIZE,
                supplied,
            }),
        }
    }
}

/// Compare trait usage across characters.
#[must_use]
pub fn compare_personalities<'a>(characters: impl IntoIterator<Item = &'a Character>) -> Comparison {
    let characters: Vec<&Character> = characters.into_iter().collect();
    if characters.len() < MIN_COMPARISON_SIZE {
        return Comparison::Insufficient {
            supplied: characters.len(),
        };
    }

    // name -> (characters carrying it, summed weight)
    let mut tally: IndexMap<String, (usize, u64)> = IndexMap::new();
    for character in &characters {
        for t in &character.personality_traits {
            let entry = tally.entry(t.name.clone()).or_default();
            entry.0 += 1;
            entry.1 += u64::from(t.weight.value());
        }
    }

    let trait_frequency: IndexMap<String, usize> =
        tally.iter().map(|(name, (count, _))| (name.clone(), *count)).collect();
    let average_weights: IndexMap<String, f64> = tally
        .iter()
        .map(|(name, (count, total))| (name.clone(), stats::one_decimal(*total, *count as u64)))
        .collect();

    let mut overlap: Vec<TraitOverlap> = trait_frequency
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(name, count)| TraitOverlap {
            name: name.clone(),
            count: *count,
        })
        .collect();
    overlap.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    Comparison::Compared(PersonalityComparison {
        total_characters: characters.len(),
        trait_frequency,
        average_weights,
        overlap,
    })
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// One trait with its weight as a share of the maximum weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitShare {
    /// Trait name.
    pub name: String,
    /// Raw weight.
    pub weight: u8,
    /// `weight / 10 × 100`, one decimal place.
    pub percentage: f64,
}

/// Machine-friendly personality digest of one character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityProfile {
    /// Character name.
    pub character_name: String,
    /// Number of traits.
    pub total_traits: usize,
    /// Highest-ranked trait, if any.
    pub dominant_trait: Option<String>,
    /// Ranked traits.
    pub breakdown: Vec<TraitShare>,
    /// One-paragraph summary.
    pub summary: String,
}

/// Build the personality profile of a character.
#[must_use]
pub fn personality_profile(character: &Character) -> PersonalityProfile {
    let ranked = rank_traits(character);
    let breakdown = ranked
        .iter()
        .map(|t| TraitShare {
            name: t.name.clone(),
            weight: t.weight.value(),
            percentage: stats::percentage(u64::from(t.weight.value()), 10),
        })
        .collect();

    PersonalityProfile {
        character_name: character.name.clone(),
        total_traits: ranked.len(),
        dominant_trait: ranked.first().map(|t| t.name.clone()),
        breakdown,
        summary: personality_summary(character),
    }
}

/// A short prose summary of a character's personality.
#[must_use]
pub fn personality_summary(character: &Character) -> String {
    let traits = &character.personality_traits;
    let Some(dominant) = rank_traits(character).first().copied() else {
        return "No personality traits defined.".to_string();
    };

    let tone = match IntensityTone::from_totals(character.total_weight(), traits.len()) {
        IntensityTone::Strong => "Overall, this character has strong, well-defined personality traits.",
        IntensityTone::Balanced => "This character has a balanced personality with moderate trait intensity.",
        IntensityTone::Subtle => "This character has subtle, understated personality traits.",
    };
    let shape = match TraitComplexity::from_count(traits.len()) {
        TraitComplexity::Focused => "The personality is focused and straightforward.",
        TraitComplexity::Balanced => "The personality shows good depth and complexity.",
        TraitComplexity::Complex => "The personality is complex and multifaceted.",
    };

    format!(
        "{} is primarily characterized by being {} ({}/10). {tone} {shape}",
        character.name, dominant.name, dominant.weight
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_traits(name: &str, traits: &[(&str, i64)]) -> Character {
        let mut c = Character::new(name, "");
        for (t, w) in traits {
            c.upsert_trait(t, *w).expect("valid trait");
        }
        c
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let c = with_traits("A", &[("Calm", 5), ("Brave", 9), ("Kind", 5), ("Wry", 2)]);
        let names: Vec<&str> = rank_traits(&c).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Brave", "Calm", "Kind", "Wry"]);

        let top: Vec<&str> = dominant_traits(&c, 2).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(top, ["Brave", "Calm"]);
    }

    #[test]
    fn brave_and_cautious_scenario() {
        let c = with_traits("A", &[("Brave", 9), ("Cautious", 3)]);
        assert_eq!(classify(9), Intensity::High);
        assert_eq!(classify(3), Intensity::Low);

        let summary = intensity_summary(&c).expect("has traits");
        assert_eq!(summary.total_weight, 12);
        assert!((summary.average_weight - 6.0).abs() < f64::EPSILON);
        assert_eq!(summary.dominant_trait, "Brave");

        let got = insights(&c);
        assert_eq!(
            got,
            vec![
                PersonalityInsight::StrongTraits(vec!["Brave".into()]),
                PersonalityInsight::SubtleTraits(vec!["Cautious".into()]),
                PersonalityInsight::Complexity(TraitComplexity::Focused),
                PersonalityInsight::Intensity(IntensityTone::Balanced),
            ]
        );
        assert!(got[0].to_string().starts_with("Strong Traits: Brave"));
    }

    #[test]
    fn average_rounds_half_up() {
        // 20 / 3 = 6.666..
        let c = with_traits("A", &[("a", 7), ("b", 7), ("c", 6)]);
        let summary = intensity_summary(&c).expect("traits");
        assert!((summary.average_weight - 6.7).abs() < 1e-9);
    }

    #[test]
    fn empty_traits_are_reported() {
        let c = Character::new("Empty", "");
        assert!(matches!(
            intensity_summary(&c),
            Err(DramatisError::EmptyTraits(name)) if name == "Empty"
        ));
        assert!(insights(&c).is_empty());
        assert_eq!(personality_summary(&c), "No personality traits defined.");
    }

    #[test]
    fn complexity_and_tone_thresholds() {
        assert_eq!(TraitComplexity::from_count(3), TraitComplexity::Focused);
        assert_eq!(TraitComplexity::from_count(4), TraitComplexity::Balanced);
        assert_eq!(TraitComplexity::from_count(6), TraitComplexity::Balanced);
        assert_eq!(TraitComplexity::from_count(7), TraitComplexity::Complex);

        assert_eq!(IntensityTone::from_totals(14, 2), IntensityTone::Strong);
        assert_eq!(IntensityTone::from_totals(13, 2), IntensityTone::Balanced);
        assert_eq!(IntensityTone::from_totals(10, 2), IntensityTone::Balanced);
        assert_eq!(IntensityTone::from_totals(9, 2), IntensityTone::Subtle);
    }

    #[test]
    fn frequency_counts_characters_not_weights() {
        let a = with_traits("A", &[("Brave", 8)]);
        let b = with_traits("B", &[("Brave", 4), ("Kind", 6)]);
        let freq = trait_frequency([&a, &b]);
        assert_eq!(freq.get("Brave"), Some(&2));
        assert_eq!(freq.get("Kind"), Some(&1));
        assert_eq!(freq.get("brave"), None);
        assert_eq!(freq.keys().collect::<Vec<_>>(), ["Brave", "Kind"]);
    }

    #[test]
    fn comparison_needs_two_characters() {
        let a = with_traits("A", &[("Brave", 8)]);
        let result = compare_personalities([&a]);
        assert_eq!(result, Comparison::Insufficient { supplied: 1 });
        assert!(matches!(
            result.into_result(),
            Err(DramatisError::InsufficientData { required: 2, supplied: 1 })
        ));
    }

    #[test]
    fn comparison_overlap_and_averages() {
        let a = with_traits("A", &[("Kind", 4), ("Brave", 8), ("Wise", 3)]);
        let b = with_traits("B", &[("Brave", 5), ("Kind", 6)]);
        let c = with_traits("C", &[("Brave", 7), ("Wise", 2)]);

        let cmp = compare_personalities([&a, &b, &c]).into_result().expect("compared");
        assert_eq!(cmp.total_characters, 3);
        assert!((cmp.average_weights["Brave"] - 6.7).abs() < 1e-9);
        assert!((cmp.average_weights["Kind"] - 5.0).abs() < 1e-9);
        assert!((cmp.average_weights["Wise"] - 2.5).abs() < 1e-9);

        let overlap: Vec<(&str, usize)> = cmp.overlap.iter().map(|o| (o.name.as_str(), o.count)).collect();
        assert_eq!(overlap, [("Brave", 3), ("Kind", 2), ("Wise", 2)]);
    }

    #[test]
    fn profile_percentages_and_summary() {
        let c = with_traits("Mira", &[("Curious", 6), ("Loyal", 9)]);
        let profile = personality_profile(&c);
        assert_eq!(profile.dominant_trait.as_deref(), Some("Loyal"));
        assert!((profile.breakdown[0].percentage - 90.0).abs() < 1e-9);
        assert_eq!(
            profile.summary,
            "Mira is primarily characterized by being Loyal (9/10). Overall, this character has strong, \
             well-defined personality traits. The personality is focused and straightforward."
        );
    }
}
