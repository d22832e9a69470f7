//! Core type definitions: characters, personality traits and relationships.
//!
//! All types serialize with the camelCase field names of the roster payload
//! (`personalityTraits`, `createdAt`, `type`), so snapshots written by older
//! hosts load unchanged.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DramatisError, Result};

// ---------------------------------------------------------------------------
// Trait weight
// ---------------------------------------------------------------------------

/// Intensity of a personality trait, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct TraitWeight(u8);

impl TraitWeight {
    /// Lowest valid weight.
    pub const MIN: u8 = 1;
    /// Highest valid weight.
    pub const MAX: u8 = 10;

    /// Validate a raw weight. Returns `None` outside `1..=10`.
    #[must_use]
    pub fn new(weight: i64) -> Option<Self> {
        u8::try_from(weight)
            .ok()
            .filter(|w| (Self::MIN..=Self::MAX).contains(w))
            .map(Self)
    }

    /// The raw weight.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TraitWeight {
    type Error = String;

    fn try_from(weight: i64) -> std::result::Result<Self, Self::Error> {
        Self::new(weight).ok_or_else(|| format!("trait weight {weight} outside 1..=10"))
    }
}

impl From<TraitWeight> for u8 {
    fn from(weight: TraitWeight) -> Self {
        weight.0
    }
}

impl fmt::Display for TraitWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Intensity buckets
// ---------------------------------------------------------------------------

/// Three-tier classification of a trait weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Weight 8 and above.
    High,
    /// Weight 5 to 7.
    Medium,
    /// Weight below 5.
    Low,
}

impl Intensity {
    /// Classify a weight: `>= 8` High, `5..8` Medium, `< 5` Low.
    #[must_use]
    pub fn from_weight(weight: u8) -> Self {
        match weight {
            w if w >= 8 => Self::High,
            w if w >= 5 => Self::Medium,
            _ => Self::Low,
        }
    }
}

// ---------------------------------------------------------------------------
// Personality traits
// ---------------------------------------------------------------------------

/// A named personality attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    /// Trait name, unique within one character.
    pub name: String,
    /// Trait intensity.
    pub weight: TraitWeight,
}

impl PersonalityTrait {
    /// Intensity bucket of this trait.
    #[must_use]
    pub fn intensity(&self) -> Intensity {
        Intensity::from_weight(self.weight.value())
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Kind of social link. Declaration order is the canonical order used by
/// every breakdown and tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Friendship.
    Friend,
    /// Hostility.
    Enemy,
    /// Romance.
    Lover,
    /// Kinship.
    Family,
    /// Working relationship.
    Colleague,
    /// Anything else, including unrecognised types in imported data.
    #[serde(other)]
    Other,
}

impl RelationshipType {
    /// All types in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Friend,
        Self::Enemy,
        Self::Lover,
        Self::Family,
        Self::Colleague,
        Self::Other,
    ];

    /// Stored identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Enemy => "enemy",
            Self::Lover => "lover",
            Self::Family => "family",
            Self::Colleague => "colleague",
            Self::Other => "other",
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::Enemy => "Enemy",
            Self::Lover => "Lover",
            Self::Family => "Family",
            Self::Colleague => "Colleague",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = Infallible;

    /// Unknown identifiers map to [`RelationshipType::Other`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .unwrap_or(Self::Other))
    }
}

/// A directed, typed link from one character to a named target.
///
/// The target is a plain name: it need not exist in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the other character.
    pub target: String,
    /// Kind of link.
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Free-form notes, possibly empty.
    #[serde(default)]
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A fictional character in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique name. Immutable once the character is registered.
    pub name: String,
    /// Narrative role, possibly empty.
    #[serde(default)]
    pub role: String,
    /// Traits in insertion order.
    #[serde(default)]
    pub personality_traits: Vec<PersonalityTrait>,
    /// Outgoing relationships in insertion order.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// When the character was created.
    pub created_at: DateTime<Utc>,
}

impl Character {
    /// Create a character with no traits or relationships, stamped now.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new_at(name, role, Utc::now())
    }

    /// Create a character with an explicit creation time.
    #[must_use]
    pub fn new_at(name: impl Into<String>, role: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            personality_traits: Vec::new(),
            relationships: Vec::new(),
            notes: String::new(),
            created_at,
        }
    }

    /// Add a trait, or overwrite the weight of an existing trait with the
    /// same name in place.
    ///
    /// # Errors
    /// Returns [`DramatisError::InvalidWeight`] for an empty name or a weight
    /// outside `1..=10`.
    pub fn upsert_trait(&mut self, name: &str, weight: i64) -> Result<()> {
        let name = name.trim();
        let weight = match TraitWeight::new(weight) {
            Some(w) if !name.is_empty() => w,
            _ => {
                return Err(DramatisError::InvalidWeight {
                    name: name.to_string(),
                    weight,
                });
            }
        };

        if let Some(existing) = self.personality_traits.iter_mut().find(|t| t.name == name) {
            existing.weight = weight;
        } else {
            self.personality_traits.push(PersonalityTrait {
                name: name.to_string(),
                weight,
            });
        }
        Ok(())
    }

    /// Remove the trait at `index`.
    ///
    /// # Errors
    /// Returns [`DramatisError::IndexOutOfRange`] if `index` is invalid.
    pub fn remove_trait(&mut self, index: usize) -> Result<PersonalityTrait> {
        let len = self.personality_traits.len();
        if index >= len {
            return Err(DramatisError::IndexOutOfRange {
                collection: "personality traits",
                index,
                len,
            });
        }
        Ok(self.personality_traits.remove(index))
    }

    /// Add a relationship, or overwrite type and notes of the existing
    /// relationship to the same target in place.
    ///
    /// # Errors
    /// Returns [`DramatisError::EmptyTarget`] if `target` is blank.
    pub fn upsert_relationship(&mut self, target: &str, kind: RelationshipType, notes: &str) -> Result<()> {
        let target = target.trim();
        if target.is_empty() {
            return Err(DramatisError::EmptyTarget);
        }
        let notes = notes.trim().to_string();

        if let Some(existing) = self.relationships.iter_mut().find(|r| r.target == target) {
            existing.kind = kind;
            existing.notes = notes;
        } else {
            self.relationships.push(Relationship {
                target: target.to_string(),
                kind,
                notes,
            });
        }
        Ok(())
    }

    /// Remove the relationship at `index`.
    ///
    /// # Errors
    /// Returns [`DramatisError::IndexOutOfRange`] if `index` is invalid.
    pub fn remove_relationship(&mut self, index: usize) -> Result<Relationship> {
        let len = self.relationships.len();
        if index >= len {
            return Err(DramatisError::IndexOutOfRange {
                collection: "relationships",
                index,
                len,
            });
        }
        Ok(self.relationships.remove(index))
    }

    /// Look up a trait by exact name.
    #[must_use]
    pub fn trait_named(&self, name: &str) -> Option<&PersonalityTrait> {
        self.personality_traits.iter().find(|t| t.name == name)
    }

    /// Look up the relationship pointing at `target`.
    #[must_use]
    pub fn relationship_to(&self, target: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.target == target)
    }

    /// Sum of all trait weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.personality_traits
            .iter()
            .map(|t| u32::from(t.weight.value()))
            .sum()
    }
}
