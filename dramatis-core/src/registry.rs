//! The character registry: every [`Character`] keyed by its unique name,
//! in insertion order.
//!
//! The registry is plain data. It does not persist itself; the
//! [`Tracker`](crate::tracker::Tracker) owns a registry together with a
//! snapshot store and saves after each mutation.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{DramatisError, Result};
use crate::types::{Character, PersonalityTrait, Relationship, RelationshipType};

/// Serializable registry contents: `(name, character)` pairs in registry
/// order.
pub type Snapshot = Vec<(String, Character)>;

/// All characters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    characters: IndexMap<String, Character>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a snapshot. See [`Registry::import_snapshot`].
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut registry = Self::new();
        registry.import_snapshot(snapshot);
        registry
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the registry holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Whether a character with this name exists. Surrounding whitespace is
    /// ignored, as it is on [`Registry::create`].
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.characters.contains_key(key(name))
    }

    /// Character names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.characters.keys().map(String::as_str)
    }

    /// Characters in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Look up a character without treating absence as an error.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Character> {
        self.characters.get(key(name))
    }

    /// Look up a character.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] if no character has this name.
    pub fn get(&self, name: &str) -> Result<&Character> {
        let name = key(name);
        self.characters
            .get(name)
            .ok_or_else(|| DramatisError::NotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Character> {
        let name = key(name);
        self.characters
            .get_mut(name)
            .ok_or_else(|| DramatisError::NotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Character lifecycle
    // ------------------------------------------------------------------

    /// Register a new character stamped with the current time.
    ///
    /// # Errors
    /// Returns [`DramatisError::DuplicateName`] if `name` is blank or taken.
    pub fn create(&mut self, name: &str, role: &str) -> Result<&Character> {
        self.create_at(name, role, Utc::now())
    }

    /// Register a new character with an explicit creation time.
    ///
    /// # Errors
    /// Returns [`DramatisError::DuplicateName`] if `name` is blank or taken.
    pub fn create_at(&mut self, name: &str, role: &str, created_at: DateTime<Utc>) -> Result<&Character> {
        let name = key(name);
        if name.is_empty() || self.characters.contains_key(name) {
            return Err(DramatisError::DuplicateName(name.to_string()));
        }

        debug!(character = name, role = role.trim(), "Creating character");
        let entry = self
            .characters
            .entry(name.to_string())
            .or_insert_with(|| Character::new_at(name, role.trim(), created_at));
        Ok(&*entry)
    }

    /// Remove a character. Relationships that other characters hold towards
    /// it are left in place.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] if no character has this name.
    pub fn delete(&mut self, name: &str) -> Result<Character> {
        let name = key(name);
        let removed = self
            .characters
            .shift_remove(name)
            .ok_or_else(|| DramatisError::NotFound(name.to_string()))?;
        debug!(character = name, "Deleted character");
        Ok(removed)
    }

    /// Edit the role and/or notes of a character. `None` leaves a field
    /// unchanged.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] if no character has this name.
    pub fn update(&mut self, name: &str, role: Option<&str>, notes: Option<&str>) -> Result<()> {
        let character = self.get_mut(name)?;
        if let Some(role) = role {
            character.role = role.trim().to_string();
        }
        if let Some(notes) = notes {
            character.notes = notes.trim().to_string();
        }
        debug!(character = name, "Updated character details");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Traits & relationships
    // ------------------------------------------------------------------

    /// Add or overwrite a trait on `character`.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] for an unknown character, or
    /// [`DramatisError::InvalidWeight`] for a blank name or a weight outside
    /// `1..=10`.
    pub fn upsert_trait(&mut self, character: &str, name: &str, weight: i64) -> Result<()> {
        self.get_mut(character)?.upsert_trait(name, weight)?;
        debug!(character, trait_name = name.trim(), weight, "Upserted trait");
        Ok(())
    }

    /// Remove the trait at `index` from `character`.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or
    /// [`DramatisError::IndexOutOfRange`].
    pub fn remove_trait(&mut self, character: &str, index: usize) -> Result<PersonalityTrait> {
        let removed = self.get_mut(character)?.remove_trait(index)?;
        debug!(character, trait_name = %removed.name, "Removed trait");
        Ok(removed)
    }

    /// Add or overwrite the relationship from `character` to `target`.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] for an unknown character, or
    /// [`DramatisError::EmptyTarget`] for a blank target.
    pub fn upsert_relationship(
        &mut self,
        character: &str,
        target: &str,
        kind: RelationshipType,
        notes: &str,
    ) -> Result<()> {
        self.get_mut(character)?.upsert_relationship(target, kind, notes)?;
        debug!(character, target = target.trim(), kind = %kind, "Upserted relationship");
        Ok(())
    }

    /// Remove the relationship at `index` from `character`.
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or
    /// [`DramatisError::IndexOutOfRange`].
    pub fn remove_relationship(&mut self, character: &str, index: usize) -> Result<Relationship> {
        let removed = self.get_mut(character)?.remove_relationship(index)?;
        debug!(character, target = %removed.target, "Removed relationship");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Copy the registry out as `(name, character)` pairs.
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        self.characters
            .iter()
            .map(|(name, character)| (name.clone(), character.clone()))
            .collect()
    }

    /// Replace the whole registry with `snapshot`.
    ///
    /// The pair's key is authoritative for the character's name; if a key
    /// repeats, the later entry wins but keeps the first entry's position.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        self.characters.clear();
        for (name, mut character) in snapshot {
            if character.name != name {
                debug!(key = %name, stored = %character.name, "Snapshot key overrides stored name");
                character.name.clone_from(&name);
            }
            self.characters.insert(name, character);
        }
        debug!(characters = self.characters.len(), "Imported snapshot");
    }
}

/// Registry key for a caller-supplied name.
fn key(name: &str) -> &str {
    name.trim()
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Character;
    type IntoIter = indexmap::map::Values<'a, String, Character>;

    fn into_iter(self) -> Self::IntoIter {
        self.characters.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry {
        let mut registry = Registry::new();
        registry.create("Alice", "Knight").expect("alice");
        registry.create("Bob", "Squire").expect("bob");
        registry.upsert_trait("Alice", "Brave", 9).expect("trait");
        registry
            .upsert_relationship("Alice", "Bob", RelationshipType::Friend, "sworn allies")
            .expect("rel");
        registry
    }

    #[test]
    fn create_rejects_duplicates_and_blank_names() {
        let mut registry = sample();
        assert!(matches!(
            registry.create("Alice", "Bard"),
            Err(DramatisError::DuplicateName(name)) if name == "Alice"
        ));
        assert!(matches!(registry.create("  ", ""), Err(DramatisError::DuplicateName(_))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn create_initialises_empty_lists() {
        let mut registry = Registry::new();
        let c = registry.create(" Carol ", " Mage ").expect("carol");
        assert_eq!(c.name, "Carol");
        assert_eq!(c.role, "Mage");
        assert!(c.personality_traits.is_empty());
        assert!(c.relationships.is_empty());
        assert!(c.notes.is_empty());
    }

    #[test]
    fn get_reports_missing_characters() {
        let registry = sample();
        assert!(registry.get("Alice").is_ok());
        assert!(matches!(registry.get("Zed"), Err(DramatisError::NotFound(_))));
        assert!(registry.find("Zed").is_none());
    }

    #[test]
    fn delete_keeps_dangling_relationships() {
        let mut registry = sample();
        registry.delete("Bob").expect("delete");
        assert!(!registry.contains("Bob"));
        let alice = registry.get("Alice").expect("alice");
        assert_eq!(alice.relationships[0].target, "Bob");
        assert!(matches!(registry.delete("Bob"), Err(DramatisError::NotFound(_))));
    }

    #[test]
    fn delete_preserves_order_of_the_rest() {
        let mut registry = sample();
        registry.create("Carol", "").expect("carol");
        registry.delete("Alice").expect("delete");
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Bob", "Carol"]);
    }

    #[test]
    fn update_edits_role_and_notes() {
        let mut registry = sample();
        registry
            .update("Bob", Some("Knight"), Some("  Promoted after the siege. "))
            .expect("update");
        let bob = registry.get("Bob").expect("bob");
        assert_eq!(bob.role, "Knight");
        assert_eq!(bob.notes, "Promoted after the siege.");

        registry.update("Bob", None, Some("")).expect("clear notes");
        assert_eq!(registry.get("Bob").expect("bob").role, "Knight");
    }

    #[test]
    fn mutations_on_unknown_character_fail() {
        let mut registry = sample();
        assert!(matches!(
            registry.upsert_trait("Zed", "Brave", 5),
            Err(DramatisError::NotFound(_))
        ));
        assert!(matches!(
            registry.remove_relationship("Alice", 3),
            Err(DramatisError::IndexOutOfRange { len: 1, .. })
        ));
    }

    #[test]
    fn padded_names_resolve_to_the_trimmed_key() {
        let mut registry = Registry::new();
        registry.create(" Alice ", "Knight").expect("create");
        registry.upsert_trait(" Alice ", "Brave", 5).expect("trait");
        registry
            .upsert_relationship(" Alice ", "Bob", RelationshipType::Friend, "")
            .expect("rel");
        registry.update(" Alice ", None, Some("padded")).expect("update");

        assert!(registry.contains(" Alice "));
        assert!(registry.find("\tAlice\n").is_some());
        let alice = registry.get(" Alice ").expect("get");
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.personality_traits.len(), 1);
        assert!(matches!(registry.create("Alice  ", ""), Err(DramatisError::DuplicateName(_))));

        assert_eq!(registry.delete(" Alice ").expect("delete").name, "Alice");
        assert!(matches!(
            registry.get(" Alice "),
            Err(DramatisError::NotFound(name)) if name == "Alice"
        ));
    }

    #[test]
    fn snapshot_round_trip_is_identical() {
        let registry = sample();
        let restored = Registry::from_snapshot(registry.export_snapshot());
        assert_eq!(restored, registry);
    }

    #[test]
    fn import_replaces_instead_of_merging() {
        let mut registry = sample();
        let other = Character::new("Zed", "Villain");
        registry.import_snapshot(vec![("Zed".to_string(), other)]);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Zed"]);
    }

    #[test]
    fn import_uses_key_as_name() {
        let mut registry = Registry::new();
        let c = Character::new("Old", "");
        registry.import_snapshot(vec![("New".to_string(), c)]);
        assert_eq!(registry.get("New").expect("new").name, "New");
    }
}
