//! # Schematic Cache
//!
//! Decodes each template file at most once while it stays cached.
//! Assembly places the same handful of templates over and over, so the
//! payload is shared behind an `Arc` instead of being decoded per room.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use catacomb_core::{LruMap, RoomPayload};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::StoreResult;
use crate::schematic::RoomSchematic;

/// Bounded cache of decoded template payloads, keyed by file path.
pub struct SchematicCache {
    entries: Mutex<LruMap<PathBuf, Arc<RoomPayload>>>,
}

impl SchematicCache {
    /// Creates a cache holding at most `capacity` payloads.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruMap::new(capacity)),
        }
    }

    /// Returns the payload of the template file at `path`, decoding it on
    /// first use.
    ///
    /// The lock is held across the decode, so concurrent callers asking for
    /// the same file wait for one decode instead of racing.
    ///
    /// # Errors
    ///
    /// [`StoreError::Asset`](crate::StoreError::Asset) if the file cannot be
    /// read or decoded. Failures are not cached.
    pub fn get(&self, path: impl AsRef<Path>) -> StoreResult<Arc<RoomPayload>> {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        if let Some(payload) = entries.get(path) {
            trace!(path = %path.display(), "schematic cache hit");
            return Ok(Arc::clone(payload));
        }

        let payload = Arc::new(RoomSchematic::read_from(path)?.payload);
        for (evicted, _) in entries.insert(path.to_path_buf(), Arc::clone(&payload)) {
            debug!(path = %evicted.display(), "schematic evicted");
        }
        Ok(payload)
    }

    /// Drops one cached payload, e.g. after the file was rewritten.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.entries.lock().remove(path.as_ref()).is_some()
    }

    /// Drops every cached payload.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of cached payloads.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }
}

impl std::fmt::Debug for SchematicCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchematicCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
