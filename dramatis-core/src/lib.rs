//! # Dramatis Core Library
//!
//! Character roster analytics for writers and narrative tools.
//!
//! A [`Registry`] holds every [`Character`] by unique name, each with
//! weighted personality traits and directed, typed relationships. On top of
//! it sit three read-only layers:
//!
//! - [`personality`]: trait ranking, intensity tiers, insight statements and
//!   cross-character comparison.
//! - [`network`]: relationship breakdowns, mutual pairs, isolated
//!   characters and network density.
//! - [`report`]: deterministic Markdown reports built from the two above.
//!
//! A [`Tracker`] binds the registry to a [`persistence::SnapshotStore`]
//! (memory, JSON file or SQLite), loading on open and saving after every
//! mutation. [`SharedTracker`] puts it behind a read-write lock for
//! multi-threaded hosts.
//!
//! ```
//! use dramatis_core::{network, personality, RelationshipType, Tracker};
//!
//! let mut tracker = Tracker::in_memory();
//! tracker.create_character("Alice", "Knight")?;
//! tracker.create_character("Bob", "Squire")?;
//! tracker.upsert_trait("Alice", "Brave", 9)?;
//! tracker.upsert_relationship("Alice", "Bob", RelationshipType::Friend, "")?;
//! tracker.upsert_relationship("Bob", "Alice", RelationshipType::Enemy, "")?;
//!
//! let alice = tracker.registry().get("Alice")?;
//! assert_eq!(personality::dominant_traits(alice, 3)[0].name, "Brave");
//! assert_eq!(network::find_mutual(tracker.registry()).len(), 1);
//! assert!((network::network_density(tracker.registry()) - 1.0).abs() < f64::EPSILON);
//! # Ok::<(), dramatis_core::DramatisError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod network;
pub mod persistence;
pub mod personality;
pub mod registry;
pub mod report;
pub mod shared;
pub mod tracker;
pub mod types;

pub(crate) mod stats;

pub use config::DramatisConfig;
pub use error::DramatisError;
pub use registry::{Registry, Snapshot};
pub use shared::SharedTracker;
pub use tracker::Tracker;
pub use types::*;
