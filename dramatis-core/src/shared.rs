//! Thread-safe handle to a [`Tracker`].
//!
//! Readers share a `parking_lot::RwLock`; every mutation (and its save)
//! runs under the exclusive lock, so readers never see a half-applied
//! change.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::network::{self, NetworkReport};
use crate::registry::Registry;
use crate::tracker::Tracker;

/// Cloneable, `Send + Sync` handle around a [`Tracker`].
#[derive(Debug, Clone)]
pub struct SharedTracker {
    inner: Arc<RwLock<Tracker>>,
}

impl SharedTracker {
    /// Wrap a tracker.
    #[must_use]
    pub fn new(tracker: Tracker) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tracker)),
        }
    }

    /// Run `f` against the registry under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(self.inner.read().registry())
    }

    /// Run `f` against the tracker under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Tracker) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// A consistent copy of the registry, detached from the lock.
    #[must_use]
    pub fn snapshot(&self) -> Registry {
        self.read(Registry::clone)
    }

    /// Network statistics computed under the shared lock.
    #[must_use]
    pub fn network_report(&self) -> NetworkReport {
        self.read(network::network_report)
    }

    /// Save now; see [`Tracker::flush`].
    ///
    /// # Errors
    /// Returns [`crate::DramatisError::Persistence`] if the save fails.
    pub fn flush(&self) -> Result<()> {
        self.write(Tracker::flush)
    }
}

impl From<Tracker> for SharedTracker {
    fn from(tracker: Tracker) -> Self {
        Self::new(tracker)
    }
}
