//! Relationship analytics: per-character breakdowns and insights, and
//! network-level statistics over a whole [`Registry`].
//!
//! Relationship targets are plain names. A target that is not (or no
//! longer) registered is never an error here; it simply has no outgoing
//! links of its own.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::registry::Registry;
use crate::stats;
use crate::types::{Character, RelationshipType};

/// Notes longer than this many characters mark a relationship as complex.
pub const COMPLEX_NOTES_THRESHOLD: usize = 20;

// ---------------------------------------------------------------------------
// Per-character breakdown
// ---------------------------------------------------------------------------

/// Relationship count per type. Iterates in canonical type order and only
/// holds types that occur.
#[must_use]
pub fn breakdown_by_type(character: &Character) -> BTreeMap<RelationshipType, usize> {
    let mut breakdown = BTreeMap::new();
    for rel in &character.relationships {
        *breakdown.entry(rel.kind).or_default() += 1;
    }
    breakdown
}

/// The most frequent relationship type and its count. Ties go to the type
/// that comes first in canonical order.
#[must_use]
pub fn dominant_type(character: &Character) -> Option<(RelationshipType, usize)> {
    breakdown_by_type(character)
        .into_iter()
        .fold(None, |best, (kind, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((kind, count)),
        })
}

/// Size of a character's social circle, by relationship count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleSize {
    /// Two relationships or fewer.
    Small,
    /// Three to five relationships.
    Moderate,
    /// More than five relationships.
    Large,
}

impl CircleSize {
    /// Tier for a relationship count.
    #[must_use]
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=2 => Self::Small,
            3..=5 => Self::Moderate,
            _ => Self::Large,
        }
    }
}

/// How many different kinds of relationship a character has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diversity {
    /// A single type.
    Focused,
    /// Two or three types.
    Varied,
    /// Four or more types.
    HighlyDiverse,
}

impl Diversity {
    /// Tier for a number of distinct types.
    #[must_use]
    pub fn from_distinct(distinct: usize) -> Self {
        match distinct {
            0 | 1 => Self::Focused,
            2 | 3 => Self::Varied,
            _ => Self::HighlyDiverse,
        }
    }
}

/// One deterministic statement about a character's relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationshipInsight {
    /// The most common relationship type.
    PrimaryType {
        /// Character the insight is about.
        character: String,
        /// Dominant type.
        relationship: RelationshipType,
        /// Number of relationships of that type.
        count: usize,
    },
    /// Social circle size.
    SocialCircle {
        /// Size tier.
        size: CircleSize,
    },
    /// Spread of relationship types.
    Diversity {
        /// Diversity tier.
        diversity: Diversity,
    },
    /// At least one relationship carries detailed notes.
    Complex,
}

impl fmt::Display for RelationshipInsight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryType {
                character,
                relationship,
                count,
            } => write!(
                f,
                "Primary Relationship Type: {} ({count} connections) - This suggests {character} primarily forms {} relationships.",
                relationship.label(),
                relationship.label().to_lowercase()
            ),
            Self::SocialCircle { size } => f.write_str(match size {
                CircleSize::Small => {
                    "Social Circle: This character has a small, intimate social circle with few close connections."
                }
                CircleSize::Moderate => {
                    "Social Circle: This character has a moderate social network with balanced connections."
                }
                CircleSize::Large => {
                    "Social Circle: This character has a large social network with many connections."
                }
            }),
            Self::Diversity { diversity } => f.write_str(match diversity {
                Diversity::Focused => {
                    "Relationship Diversity: This character tends to form similar types of relationships, suggesting a focused social approach."
                }
                Diversity::Varied => {
                    "Relationship Diversity: This character has a varied social life with different types of connections."
                }
                Diversity::HighlyDiverse => {
                    "Relationship Diversity: This character has a highly diverse social network with many different relationship types."
                }
            }),
            Self::Complex => f.write_str(
                "Relationship Complexity: Some relationships have detailed notes, indicating complex or nuanced connections.",
            ),
        }
    }
}

/// Relationship insights in fixed order: primary type, social circle,
/// diversity, then the complexity flag when any notes exceed
/// [`COMPLEX_NOTES_THRESHOLD`] characters.
///
/// A character without relationships yields no insights.
#[must_use]
pub fn relationship_insights(character: &Character) -> Vec<RelationshipInsight> {
    let Some((relationship, count)) = dominant_type(character) else {
        return Vec::new();
    };
    let distinct = breakdown_by_type(character).len();

    let mut out = vec![
        RelationshipInsight::PrimaryType {
            character: character.name.clone(),
            relationship,
            count,
        },
        RelationshipInsight::SocialCircle {
            size: CircleSize::from_count(character.relationships.len()),
        },
        RelationshipInsight::Diversity {
            diversity: Diversity::from_distinct(distinct),
        },
    ];
    if character
        .relationships
        .iter()
        .any(|r| r.notes.chars().count() > COMPLEX_NOTES_THRESHOLD)
    {
        out.push(RelationshipInsight::Complex);
    }
    out
}

// ---------------------------------------------------------------------------
// Per-character profile
// ---------------------------------------------------------------------------

/// One relationship as presented in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipEntry {
    /// Target name.
    pub target: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Display label of the type.
    pub type_label: &'static str,
    /// Notes.
    pub notes: String,
    /// Length of the notes in characters.
    pub complexity: usize,
}

/// The dominant relationship type of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DominantType {
    /// The type.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Its display label.
    pub label: &'static str,
    /// Number of relationships of that type.
    pub count: usize,
}

/// Machine-friendly relationship digest of one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipProfile {
    /// Character name.
    pub character_name: String,
    /// Number of outgoing relationships.
    pub total_relationships: usize,
    /// Types present, canonical order.
    pub relationship_types: Vec<RelationshipType>,
    /// Relationships grouped by type, canonical order.
    pub relationships_by_type: BTreeMap<RelationshipType, Vec<RelationshipEntry>>,
    /// Dominant type, if any relationships exist.
    pub dominant: Option<DominantType>,
    /// One-paragraph summary.
    pub summary: String,
}

/// Build the relationship profile of a character.
#[must_use]
pub fn relationship_profile(character: &Character) -> RelationshipProfile {
    let mut by_type: BTreeMap<RelationshipType, Vec<RelationshipEntry>> = BTreeMap::new();
    for rel in &character.relationships {
        by_type.entry(rel.kind).or_default().push(RelationshipEntry {
            target: rel.target.clone(),
            kind: rel.kind,
            type_label: rel.kind.label(),
            notes: rel.notes.clone(),
            complexity: rel.notes.chars().count(),
        });
    }

    RelationshipProfile {
        character_name: character.name.clone(),
        total_relationships: character.relationships.len(),
        relationship_types: by_type.keys().copied().collect(),
        relationships_by_type: by_type,
        dominant: dominant_type(character).map(|(kind, count)| DominantType {
            kind,
            label: kind.label(),
            count,
        }),
        summary: relationship_summary(character),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// A short prose summary of a character's relationships.
#[must_use]
pub fn relationship_summary(character: &Character) -> String {
    let total = character.relationships.len();
    let Some((kind, count)) = dominant_type(character) else {
        return "No relationships defined.".to_string();
    };

    let circle = match CircleSize::from_count(total) {
        CircleSize::Small => "This suggests a focused, intimate social circle.",
        CircleSize::Moderate => "This indicates a balanced social network.",
        CircleSize::Large => "This shows a broad, extensive social network.",
    };
    format!(
        "{} has {total} relationship{}. The primary relationship type is {} ({count} connection{}). {circle}",
        character.name,
        plural(total),
        kind.label().to_lowercase(),
        plural(count),
    )
}

// ---------------------------------------------------------------------------
// Network-level analysis
// ---------------------------------------------------------------------------

/// Two characters that each list the other as a relationship target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutualRelationship {
    /// The character discovered first in registry order.
    pub character_a: String,
    /// The other character.
    pub character_b: String,
    /// How `character_a` sees `character_b`.
    pub type_a: RelationshipType,
    /// How `character_b` sees `character_a`.
    pub type_b: RelationshipType,
}

/// Every mutually linked pair, reported once, in discovery order.
///
/// Targets that are not registered produce no record, and a character's
/// relationship to itself is never mutual.
#[must_use]
pub fn find_mutual(registry: &Registry) -> Vec<MutualRelationship> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut mutual = Vec::new();

    for character in registry {
        for rel in &character.relationships {
            if rel.target == character.name {
                continue;
            }
            let Some(target) = registry.find(&rel.target) else {
                continue;
            };
            let Some(back) = target.relationship_to(&character.name) else {
                continue;
            };

            let key = if character.name <= target.name {
                (character.name.as_str(), target.name.as_str())
            } else {
                (target.name.as_str(), character.name.as_str())
            };
            if seen.insert(key) {
                mutual.push(MutualRelationship {
                    character_a: character.name.clone(),
                    character_b: target.name.clone(),
                    type_a: rel.kind,
                    type_b: back.kind,
                });
            }
        }
    }
    mutual
}

/// Names of characters with no outgoing relationships, registry order.
#[must_use]
pub fn find_isolated(registry: &Registry) -> Vec<String> {
    registry
        .iter()
        .filter(|c| c.relationships.is_empty())
        .map(|c| c.name.clone())
        .collect()
}

/// Relationships that point at another registered character. Self links and
/// dangling targets are not edges of the network.
#[must_use]
pub fn resolved_relationship_count(registry: &Registry) -> usize {
    registry
        .iter()
        .map(|c| {
            c.relationships
                .iter()
                .filter(|r| r.target != c.name && registry.contains(&r.target))
                .count()
        })
        .sum()
}

fn density_thousandths(registry: &Registry) -> u64 {
    let n = registry.len() as u64;
    if n <= 1 {
        return 0;
    }
    let max_links = n * (n - 1);
    stats::round_half_up(resolved_relationship_count(registry) as u64, max_links, 1000)
}

/// Directed links between registered characters divided by `n × (n − 1)`,
/// rounded half-up to three decimals. Zero when `n <= 1`.
#[must_use]
pub fn network_density(registry: &Registry) -> f64 {
    stats::unscale(density_thousandths(registry), 1000)
}

/// Qualitative reading of the network density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityLevel {
    /// Density of 0.5 or more.
    Dense,
    /// Density of 0.2 up to 0.5.
    Moderate,
    /// Density below 0.2.
    Sparse,
}

impl DensityLevel {
    /// Tier for a density given in thousandths.
    #[must_use]
    pub fn from_thousandths(thousandths: u64) -> Self {
        match thousandths {
            t if t >= 500 => Self::Dense,
            t if t >= 200 => Self::Moderate,
            _ => Self::Sparse,
        }
    }

    /// One-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Dense => "This is a dense network with many interconnected relationships.",
            Self::Moderate => "This is a moderately connected network.",
            Self::Sparse => "This is a sparse network with few connections.",
        }
    }
}

/// Network-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkReport {
    /// Number of registered characters.
    pub total_characters: usize,
    /// Every declared relationship, including dangling ones.
    pub total_relationships: usize,
    /// Relationships between registered characters, the density numerator.
    pub resolved_relationships: usize,
    /// Relationship count per type across all characters.
    pub relationship_types: BTreeMap<RelationshipType, usize>,
    /// Mutually linked pairs.
    pub mutual: Vec<MutualRelationship>,
    /// Characters without relationships.
    pub isolated: Vec<String>,
    /// Network density, three decimals.
    pub density: f64,
    /// Qualitative density reading.
    pub density_insight: DensityLevel,
}

/// Compute every network statistic in one pass over the registry.
#[must_use]
pub fn network_report(registry: &Registry) -> NetworkReport {
    let mut relationship_types: BTreeMap<RelationshipType, usize> = BTreeMap::new();
    let mut total_relationships = 0;
    for character in registry {
        total_relationships += character.relationships.len();
        for rel in &character.relationships {
            *relationship_types.entry(rel.kind).or_default() += 1;
        }
    }

    let thousandths = density_thousandths(registry);
    NetworkReport {
        total_characters: registry.len(),
        total_relationships,
        resolved_relationships: resolved_relationship_count(registry),
        relationship_types,
        mutual: find_mutual(registry),
        isolated: find_isolated(registry),
        density: stats::unscale(thousandths, 1000),
        density_insight: DensityLevel::from_thousandths(thousandths),
    }
}
