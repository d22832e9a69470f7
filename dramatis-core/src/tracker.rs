//! The tracker session: a [`Registry`] bound to a [`SnapshotStore`].
//!
//! Lifecycle:
//! 1. [`Tracker::open`] loads the stored snapshot. A missing snapshot gives
//!    an empty roster; an unreadable one is logged and also gives an empty
//!    roster.
//! 2. Every successful mutation saves the full snapshot. A failed save is
//!    logged and remembered, never returned from the mutation itself.
//! 3. [`Tracker::close`] performs a final save and reports any failure.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::DramatisConfig;
use crate::error::{DramatisError, Result};
use crate::persistence::{self, ExportDocument, MemoryStore, SnapshotStore};
use crate::registry::{Registry, Snapshot};
use crate::report::{self, ReportOptions};
use crate::types::{Character, PersonalityTrait, Relationship, RelationshipType};

/// Owner of the roster and its store.
pub struct Tracker {
    registry: Registry,
    store: Box<dyn SnapshotStore>,
    report_options: ReportOptions,
    last_save_error: Option<String>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("store", &self.store.describe())
            .field("characters", &self.registry.len())
            .field("last_save_error", &self.last_save_error)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Load the roster from `store`.
    #[must_use]
    pub fn open(store: Box<dyn SnapshotStore>) -> Self {
        let registry = match store.load() {
            Ok(Some(snapshot)) => Registry::from_snapshot(snapshot),
            Ok(None) => {
                debug!(store = %store.describe(), "No stored roster, starting empty");
                Registry::new()
            }
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "Failed to load roster, starting empty");
                Registry::new()
            }
        };
        info!(store = %store.describe(), characters = registry.len(), "Roster opened");

        Self {
            registry,
            store,
            report_options: ReportOptions::default(),
            last_save_error: None,
        }
    }

    /// A tracker backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    /// Open the store described by `config` and load the roster from it.
    ///
    /// # Errors
    /// Returns an error if the configured store cannot be opened. A store
    /// that opens but holds unreadable data is not an error.
    pub fn from_config(config: &DramatisConfig) -> Result<Self> {
        let store = persistence::open_store(&config.persistence)?;
        let mut tracker = Self::open(store);
        tracker.report_options = ReportOptions::from_config(config);
        Ok(tracker)
    }

    /// The current roster.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Options used by [`Tracker::report`].
    #[must_use]
    pub fn report_options(&self) -> &ReportOptions {
        &self.report_options
    }

    /// Message of the most recent failed save, cleared by the next
    /// successful one.
    #[must_use]
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    fn persist(&mut self) {
        match self.store.save(&self.registry.export_snapshot()) {
            Ok(()) => self.last_save_error = None,
            Err(e) => {
                warn!(store = %self.store.describe(), error = %e, "Failed to save roster");
                self.last_save_error = Some(e.to_string());
            }
        }
    }

    /// Run a registry mutation and save if it succeeded.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut Registry) -> Result<T>) -> Result<T> {
        let value = op(&mut self.registry)?;
        self.persist();
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// See [`Registry::create`].
    ///
    /// # Errors
    /// Returns [`DramatisError::DuplicateName`].
    pub fn create_character(&mut self, name: &str, role: &str) -> Result<Character> {
        self.mutate(|r| r.create(name, role).cloned())
    }

    /// See [`Registry::delete`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`].
    pub fn delete_character(&mut self, name: &str) -> Result<Character> {
        self.mutate(|r| r.delete(name))
    }

    /// See [`Registry::update`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`].
    pub fn update_character(&mut self, name: &str, role: Option<&str>, notes: Option<&str>) -> Result<()> {
        self.mutate(|r| r.update(name, role, notes))
    }

    /// See [`Registry::upsert_trait`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or [`DramatisError::InvalidWeight`].
    pub fn upsert_trait(&mut self, character: &str, name: &str, weight: i64) -> Result<()> {
        self.mutate(|r| r.upsert_trait(character, name, weight))
    }

    /// See [`Registry::remove_trait`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or
    /// [`DramatisError::IndexOutOfRange`].
    pub fn remove_trait(&mut self, character: &str, index: usize) -> Result<PersonalityTrait> {
        self.mutate(|r| r.remove_trait(character, index))
    }

    /// See [`Registry::upsert_relationship`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or [`DramatisError::EmptyTarget`].
    pub fn upsert_relationship(
        &mut self,
        character: &str,
        target: &str,
        kind: RelationshipType,
        notes: &str,
    ) -> Result<()> {
        self.mutate(|r| r.upsert_relationship(character, target, kind, notes))
    }

    /// See [`Registry::remove_relationship`].
    ///
    /// # Errors
    /// Returns [`DramatisError::NotFound`] or
    /// [`DramatisError::IndexOutOfRange`].
    pub fn remove_relationship(&mut self, character: &str, index: usize) -> Result<Relationship> {
        self.mutate(|r| r.remove_relationship(character, index))
    }

    /// Replace the roster with `snapshot` and save.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        self.registry.import_snapshot(snapshot);
        self.persist();
    }

    /// Replace the roster with the contents of an export file (either an
    /// export document or a bare snapshot list). Returns the number of
    /// characters imported.
    ///
    /// # Errors
    /// Returns [`DramatisError::Serialization`] if the payload is malformed;
    /// the roster is left untouched in that case.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let snapshot = persistence::parse_import(json)?;
        let count = snapshot.len();
        self.import_snapshot(snapshot);
        info!(characters = count, "Imported roster");
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Export & reports
    // ------------------------------------------------------------------

    /// See [`Registry::export_snapshot`].
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        self.registry.export_snapshot()
    }

    /// The roster wrapped in a versioned, timestamped export document.
    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.export_snapshot())
    }

    /// Write an export document to `path`.
    ///
    /// # Errors
    /// Returns [`DramatisError::Serialization`] or [`DramatisError::Io`].
    pub fn export_to(&self, path: &Path) -> Result<()> {
        self.export_document().write_to(path)
    }

    /// The character report, laid out per this tracker's options.
    #[must_use]
    pub fn report(&self) -> String {
        report::format_report_with(&self.registry, &self.report_options)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Save now and report the outcome.
    ///
    /// # Errors
    /// Returns [`DramatisError::Persistence`] if the save fails.
    pub fn flush(&mut self) -> Result<()> {
        self.persist();
        match &self.last_save_error {
            None => Ok(()),
            Some(message) => Err(DramatisError::Persistence(message.clone())),
        }
    }

    /// Final save, consuming the tracker.
    ///
    /// # Errors
    /// Returns [`DramatisError::Persistence`] if the save fails.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        info!(store = %self.store.describe(), characters = self.registry.len(), "Roster closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// Shares one `MemoryStore` between the test and the tracker.
    struct SharedStore(Arc<MemoryStore>);

    impl SnapshotStore for SharedStore {
        fn load(&self) -> Result<Option<Snapshot>> {
            self.0.load()
        }
        fn save(&self, snapshot: &Snapshot) -> Result<()> {
            self.0.save(snapshot)
        }
        fn describe(&self) -> String {
            "shared-memory".to_string()
        }
    }

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self) -> Result<Option<Snapshot>> {
            Err(DramatisError::Persistence("storage offline".into()))
        }
        fn save(&self, _snapshot: &Snapshot) -> Result<()> {
            Err(DramatisError::Persistence("storage offline".into()))
        }
        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn mutations_are_saved_immediately() {
        let backing = Arc::new(MemoryStore::new());
        let mut tracker = Tracker::open(Box::new(SharedStore(Arc::clone(&backing))));

        tracker.create_character("Alice", "Knight").expect("create");
        tracker.upsert_trait("Alice", "Brave", 9).expect("trait");

        let reopened = Tracker::open(Box::new(SharedStore(Arc::clone(&backing))));
        assert_eq!(reopened.registry(), tracker.registry());
    }

    #[test]
    fn failed_validation_does_not_save() {
        let backing = Arc::new(MemoryStore::new());
        let mut tracker = Tracker::open(Box::new(SharedStore(Arc::clone(&backing))));
        assert!(tracker.upsert_trait("Nobody", "Brave", 5).is_err());
        assert!(backing.raw().is_none());
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let tracker = Tracker::open(Box::new(MemoryStore::with_raw("[[\"Alice\", 42]]")));
        assert!(tracker.registry().is_empty());
    }

    #[test]
    fn save_failures_are_recorded_not_returned() {
        let mut tracker = Tracker::open(Box::new(FailingStore));
        assert!(tracker.registry().is_empty());

        tracker.create_character("Alice", "").expect("mutation still succeeds");
        assert_eq!(tracker.last_save_error(), Some("Persistence error: storage offline"));
        assert!(matches!(tracker.flush(), Err(DramatisError::Persistence(_))));
        assert!(tracker.close().is_err());
    }

    #[test]
    fn padded_name_round_trips_through_the_tracker() {
        let mut tracker = Tracker::in_memory();
        tracker.create_character(" Alice ", "Knight").expect("create");
        tracker.upsert_trait(" Alice ", "Brave", 5).expect("trait");
        assert_eq!(tracker.registry().get(" Alice ").expect("get").personality_traits.len(), 1);
        tracker.delete_character(" Alice ").expect("delete");
        assert!(tracker.registry().is_empty());
    }

    #[test]
    fn import_json_replaces_roster() {
        let mut source = Tracker::in_memory();
        source.create_character("Bob", "Squire").expect("bob");
        let json = source.export_document().to_json_pretty().expect("json");

        let mut tracker = Tracker::in_memory();
        tracker.create_character("Alice", "").expect("alice");
        assert_eq!(tracker.import_json(&json).expect("import"), 1);
        assert_eq!(tracker.registry().names().collect::<Vec<_>>(), ["Bob"]);

        assert!(tracker.import_json("not json").is_err());
        assert!(tracker.registry().contains("Bob"));
    }

    #[test]
    fn from_config_uses_file_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roster.json");
        let config = DramatisConfig::from_toml(&format!(
            "[persistence]\nbackend = \"json\"\npath = {path:?}\n\n[report]\ninclude_network = true\n"
        ))
        .expect("config");

        let mut tracker = Tracker::from_config(&config).expect("open");
        assert!(tracker.report_options().include_network);
        tracker.create_character("Alice", "Knight").expect("create");
        tracker.close().expect("close");

        let reopened = Tracker::from_config(&config).expect("reopen");
        assert!(reopened.registry().contains("Alice"));
    }
}
