//! Snapshot stores: where the registry lives between sessions.
//!
//! A store only knows how to load and save a [`Snapshot`], the ordered list
//! of `(name, character)` pairs. It is encoded as JSON everywhere, matching
//! the payload the roster has always used:
//!
//! ```json
//! [["Alice", {"name": "Alice", "role": "Knight", "personalityTraits": [], ...}]]
//! ```
//!
//! Three backends are provided:
//! - [`MemoryStore`]: in-process, for tests and embedding hosts.
//! - [`JsonFileStore`]: a single JSON file, replaced atomically on save.
//! - [`SqliteStore`]: one row per slot in an SQLite table, with an optional
//!   CRC-32 checksum to detect corruption.
//!
//! The schema used by [`SqliteStore`]:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS roster_snapshots (
//!     slot       TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{PersistenceBackend, PersistenceConfig};
use crate::error::{DramatisError, Result};
use crate::registry::Snapshot;

/// Version string written into export documents.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Slot used by [`SqliteStore`] unless another is chosen.
pub const DEFAULT_SLOT: &str = "default";

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a snapshot as compact JSON.
///
/// # Errors
/// Returns [`DramatisError::Serialization`] if encoding fails.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string(snapshot).map_err(|e| DramatisError::Serialization(e.to_string()))
}

/// Decode a snapshot from JSON.
///
/// # Errors
/// Returns [`DramatisError::Serialization`] if the payload is malformed.
pub fn decode_snapshot(json: &str) -> Result<Snapshot> {
    serde_json::from_str(json).map_err(|e| DramatisError::Serialization(e.to_string()))
}

/// A file export: the snapshot plus when and by which format version it was
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Registry contents.
    pub characters: Snapshot,
    /// When the export was produced.
    pub export_date: DateTime<Utc>,
    /// Format version, [`EXPORT_VERSION`] for documents written here.
    pub version: String,
}

impl ExportDocument {
    /// Wrap a snapshot, stamped now.
    #[must_use]
    pub fn new(characters: Snapshot) -> Self {
        Self::new_at(characters, Utc::now())
    }

    /// Wrap a snapshot with an explicit export time.
    #[must_use]
    pub fn new_at(characters: Snapshot, export_date: DateTime<Utc>) -> Self {
        Self {
            characters,
            export_date,
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`DramatisError::Serialization`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DramatisError::Serialization(e.to_string()))
    }

    /// Write the document to `path`.
    ///
    /// # Errors
    /// Returns [`DramatisError::Serialization`] or [`DramatisError::Io`].
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_json_pretty()?.as_bytes())?;
        info!(
            path = %path.display(),
            characters = self.characters.len(),
            "Exported roster"
        );
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Document(ExportDocument),
    Bare(Snapshot),
}

/// Parse an import file: either an [`ExportDocument`] or a bare snapshot
/// list.
///
/// # Errors
/// Returns [`DramatisError::Serialization`] if neither shape matches.
pub fn parse_import(json: &str) -> Result<Snapshot> {
    match serde_json::from_str::<ImportPayload>(json) {
        Ok(ImportPayload::Document(doc)) => {
            if doc.version != EXPORT_VERSION {
                warn!(version = %doc.version, expected = EXPORT_VERSION, "Importing export of another version");
            }
            Ok(doc.characters)
        }
        Ok(ImportPayload::Bare(snapshot)) => Ok(snapshot),
        Err(e) => Err(DramatisError::Serialization(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Somewhere a [`Snapshot`] can be loaded from and saved to.
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, or `None` if nothing was ever saved.
    ///
    /// # Errors
    /// Returns an error if the stored data cannot be read or decoded.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be encoded or written.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Build the store selected by `config`.
///
/// # Errors
/// Returns [`DramatisError::Config`] if a file-backed store has no path, or
/// [`DramatisError::Database`] if the SQLite database cannot be opened.
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn SnapshotStore>> {
    let require_path = || {
        config
            .path
            .clone()
            .ok_or_else(|| DramatisError::Config(format!("persistence.path is required for the {:?} backend", config.backend)))
    };

    let store: Box<dyn SnapshotStore> = match config.backend {
        PersistenceBackend::Memory => Box::new(MemoryStore::new()),
        PersistenceBackend::Json => Box::new(JsonFileStore::new(require_path()?)),
        PersistenceBackend::Sqlite => Box::new(SqliteStore::open(require_path()?, config)?),
    };
    Ok(store)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Keeps the encoded snapshot in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with raw JSON, which need not be valid.
    #[must_use]
    pub fn with_raw(json: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(json.into())),
        }
    }

    /// The raw JSON currently stored.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.data.lock().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.data.lock().as_deref().map(decode_snapshot).transpose()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = encode_snapshot(snapshot)?;
        *self.data.lock() = Some(json);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// Stores the snapshot as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the file at `path`. Nothing is touched until the first load/save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write via a sibling temp file and rename, so readers never see a
/// half-written file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let start = Instant::now();
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = decode_snapshot(&json)?;
        debug!(
            path = %self.path.display(),
            characters = snapshot.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded roster file"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let start = Instant::now();
        let json = encode_snapshot(snapshot)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!(
            path = %self.path.display(),
            characters = snapshot.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved roster file"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS roster_snapshots (
    slot       TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// Stores the snapshot in an SQLite database, one row per slot.
///
/// # Usage
///
/// ```no_run
/// # use dramatis_core::persistence::{SnapshotStore, SqliteStore};
/// # use dramatis_core::config::PersistenceConfig;
/// let store = SqliteStore::open("roster.db", &PersistenceConfig::default())?;
/// store.save(&Vec::new())?;
/// let loaded = store.load()?;
/// # Ok::<(), dramatis_core::error::DramatisError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    slot: String,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("slot", &self.slot)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path`, using the default slot.
    ///
    /// # Errors
    /// Returns [`DramatisError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), "Roster database opened");
        Ok(Self {
            conn: Mutex::new(conn),
            slot: DEFAULT_SLOT.to_string(),
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`DramatisError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            slot: DEFAULT_SLOT.to_string(),
            checksum_enabled: config.checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Use another slot, so several rosters can share one database.
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Slots that currently hold a snapshot.
    ///
    /// # Errors
    /// Returns [`DramatisError::Database`] on SQLite failures.
    pub fn list_slots(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT slot FROM roster_snapshots ORDER BY slot")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut slots = Vec::new();
        for row in rows {
            slots.push(row?);
        }
        Ok(slots)
    }

    /// Delete this store's slot. Returns `true` if a row was removed.
    ///
    /// # Errors
    /// Returns [`DramatisError::Database`] on SQLite failures.
    pub fn clear(&self) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM roster_snapshots WHERE slot = ?1", params![self.slot])?;
        Ok(deleted > 0)
    }

    /// Run an integrity check on the database.
    ///
    /// # Errors
    /// Returns [`DramatisError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let start = Instant::now();
        let row: Option<(Vec<u8>, Option<String>)> = self
            .conn
            .lock()
            .prepare_cached("SELECT data, checksum FROM roster_snapshots WHERE slot = ?1")?
            .query_row(params![self.slot], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum.as_deref() {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        slot = %self.slot,
                        expected,
                        actual = %actual,
                        "Checksum mismatch, possible snapshot corruption"
                    );
                }
            }
        }

        let snapshot: Snapshot =
            serde_json::from_slice(&data).map_err(|e| DramatisError::Serialization(e.to_string()))?;
        debug!(
            slot = %self.slot,
            characters = snapshot.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded roster snapshot"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let start = Instant::now();
        let json = encode_snapshot(snapshot)?.into_bytes();
        let checksum = self.checksum_enabled.then(|| crc32_hex(&json));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO roster_snapshots (slot, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(slot) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![self.slot, json, now, checksum],
        )?;

        debug!(
            slot = %self.slot,
            characters = snapshot.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved roster snapshot"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}#{}", self.db_path.display(), self.slot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
