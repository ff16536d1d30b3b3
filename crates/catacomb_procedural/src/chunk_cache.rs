//! # Chunk Cache Manager
//!
//! Process-local owner of the canonical chunk per coordinate, in front of
//! the Data Manager.
//!
//! ## Lookup Order
//!
//! ```text
//! get(key) -> cache hit?            -> return
//!          -> stored?               -> load, cache, return
//!          -> [generation lock]
//!             cache hit / stored?   -> someone beat us to it
//!             assemble, save, cache -> return
//! ```
//!
//! ## Concurrency
//!
//! Entries are whole `Arc<Chunk>` values swapped under a write lock, so a
//! reader never sees a half-updated chunk and the last writer wins.
//! Generation holds a separate mutex: two adjacent chunks are never
//! assembled against each other's missing state at the same time.
//!
//! A load-through fill never replaces an entry that appeared while the
//! store was being read: a fill is not a write. Evicted chunks with unsaved
//! edits are saved before the cache lock is released, and a fill that raced
//! such a save reads the store again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use catacomb_core::{Chunk, ChunkKey, LruMap, Room, RoomKey};
use catacomb_store::StoreResult;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::CatacombConfig;
use crate::data_manager::{DataManager, NeighborLookup};

/// Bounded cache of chunks with load-or-generate on miss.
pub struct ChunkCacheManager {
    data: Arc<DataManager>,
    chunks: RwLock<LruMap<String, Arc<Chunk>>>,
    /// Bumped under the write lock after each evicted chunk is saved.
    evictions: AtomicU64,
    generation: Mutex<()>,
}

impl ChunkCacheManager {
    /// Creates a cache holding at most `capacity` chunks.
    #[must_use]
    pub fn new(data: Arc<DataManager>, capacity: usize) -> Self {
        Self {
            data,
            chunks: RwLock::new(LruMap::new(capacity)),
            evictions: AtomicU64::new(0),
            generation: Mutex::new(()),
        }
    }

    /// Opens the configured store and builds the whole stack.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](catacomb_store::StoreError::Get) if the database
    /// cannot be opened.
    pub fn open(config: &CatacombConfig) -> StoreResult<Self> {
        let data = DataManager::open(config)?;
        Ok(Self::new(Arc::new(data), config.chunk_cache_capacity))
    }

    /// The Data Manager behind the cache.
    #[must_use]
    pub fn data(&self) -> &Arc<DataManager> {
        &self.data
    }

    /// Returns the chunk at `key`, loading or assembling it on a miss.
    ///
    /// A newly assembled chunk is saved before it is cached. `None` means
    /// assembly failed and the caller should fall back to its own layout.
    pub fn get(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        if let Some(chunk) = self.touch(key) {
            return Some(chunk);
        }
        if let Some(chunk) = self.load_through(key) {
            return Some(chunk);
        }

        let _generating = self.generation.lock();
        if let Some(chunk) = self.touch(key) {
            return Some(chunk);
        }
        if let Some(chunk) = self.load_through(key) {
            return Some(chunk);
        }

        match self.data.assemble_chunk(key, self) {
            Ok(mut chunk) => {
                if self.data.save_chunk(&chunk) {
                    chunk.modified = false;
                } else {
                    warn!(chunk = %key, "assembled chunk kept in memory unsaved");
                }
                Some(self.fill(chunk))
            }
            Err(err) => {
                warn!(chunk = %key, error = %err, "chunk assembly failed");
                None
            }
        }
    }

    /// Cached chunk without loading, generating or touching recency.
    #[must_use]
    pub fn peek(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        self.chunks.read().peek(&key.cache_key()).cloned()
    }

    /// Replaces the cached entry for the chunk's coordinate.
    pub fn put(&self, chunk: Chunk) -> Arc<Chunk> {
        let mut chunks = self.chunks.write();
        self.insert_locked(&mut chunks, chunk)
    }

    /// Applies `edit` to a copy of the cached chunk and swaps it in.
    ///
    /// `edit` runs under the cache write lock, so concurrent updates to one
    /// coordinate never lose each other's changes. Returns `None` when the
    /// chunk is not cached.
    pub fn update<F>(&self, key: &ChunkKey, edit: F) -> Option<Arc<Chunk>>
    where
        F: FnOnce(&mut Chunk),
    {
        let cache_key = key.cache_key();
        let mut chunks = self.chunks.write();
        let mut chunk = Chunk::clone(chunks.peek(&cache_key)?);
        edit(&mut chunk);
        Some(self.insert_locked(&mut chunks, chunk))
    }

    /// Drops the cached entry without saving. Returns true if it existed.
    pub fn invalidate(&self, key: &ChunkKey) -> bool {
        self.chunks.write().remove(&key.cache_key()).is_some()
    }

    /// Saves the cached chunk now. Returns false if it is not cached or
    /// the save failed.
    pub fn flush(&self, key: &ChunkKey) -> bool {
        let Some(chunk) = self.peek(key) else {
            return false;
        };
        if !self.data.save_chunk(&chunk) {
            return false;
        }
        if chunk.modified {
            self.mark_saved(key, &chunk);
        }
        true
    }

    /// Saves every cached chunk with unsaved edits. Returns how many were
    /// saved.
    pub fn flush_all(&self) -> usize {
        let dirty: Vec<Arc<Chunk>> = {
            let chunks = self.chunks.read();
            chunks
                .keys()
                .filter_map(|k| chunks.peek(k))
                .filter(|chunk| chunk.modified)
                .cloned()
                .collect()
        };

        let mut saved = 0;
        for chunk in dirty {
            if self.data.save_chunk(&chunk) {
                self.mark_saved(chunk.key(), &chunk);
                saved += 1;
            }
        }
        debug!(saved, "dirty chunks flushed");
        saved
    }

    /// One room, through [`ChunkCacheManager::get`].
    pub fn room(&self, key: &RoomKey) -> Option<Room> {
        self.get(&key.chunk())?.room(key.y).cloned()
    }

    /// True once the chunk has been durably saved.
    pub fn is_generated(&self, key: &ChunkKey) -> bool {
        self.data.is_generated(key)
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Maximum number of cached chunks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.read().capacity()
    }

    /// Cache hit, marking it recently used.
    fn touch(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        self.chunks.write().get(&key.cache_key()).cloned()
    }

    /// Loads a stored chunk and caches it, unless an entry appeared while
    /// the store was being read.
    fn load_through(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        let seen = self.evictions.load(Ordering::Acquire);
        let loaded = self.data.load_chunk(key)?;

        let mut chunks = self.chunks.write();
        if let Some(current) = chunks.get(&key.cache_key()) {
            return Some(Arc::clone(current));
        }
        // An eviction since the read may have saved a newer copy.
        let loaded = if self.evictions.load(Ordering::Acquire) == seen {
            loaded
        } else {
            self.data.load_chunk(key).unwrap_or(loaded)
        };
        Some(self.insert_locked(&mut chunks, loaded))
    }

    /// Caches `chunk` unless its coordinate is already cached.
    fn fill(&self, chunk: Chunk) -> Arc<Chunk> {
        let mut chunks = self.chunks.write();
        if let Some(current) = chunks.get(&chunk.key().cache_key()) {
            return Arc::clone(current);
        }
        self.insert_locked(&mut chunks, chunk)
    }

    /// Inserts under a held write lock and saves what falls out.
    fn insert_locked(&self, chunks: &mut LruMap<String, Arc<Chunk>>, chunk: Chunk) -> Arc<Chunk> {
        let chunk = Arc::new(chunk);
        let evicted = chunks.insert(chunk.key().cache_key(), Arc::clone(&chunk));
        self.save_evicted(evicted);
        chunk
    }

    /// Clears the dirty flag, unless the entry was replaced meanwhile.
    fn mark_saved(&self, key: &ChunkKey, saved: &Arc<Chunk>) {
        let cache_key = key.cache_key();
        let mut chunks = self.chunks.write();
        if chunks.peek(&cache_key).is_some_and(|current| Arc::ptr_eq(current, saved)) {
            let mut clean = Chunk::clone(saved);
            clean.modified = false;
            // Replacing an existing key never evicts.
            let _ = chunks.insert(cache_key, Arc::new(clean));
        }
    }

    fn save_evicted(&self, evicted: Vec<(String, Arc<Chunk>)>) {
        for (cache_key, chunk) in evicted {
            if !chunk.modified {
                debug!(chunk = %cache_key, "chunk evicted");
            } else if self.data.save_chunk(&chunk) {
                self.evictions.fetch_add(1, Ordering::AcqRel);
                debug!(chunk = %cache_key, "dirty chunk saved on eviction");
            } else {
                warn!(chunk = %cache_key, "evicted chunk lost unsaved edits");
            }
        }
    }
}

impl NeighborLookup for ChunkCacheManager {
    /// Cache first, then the store. Never generates.
    fn chunk(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        if let Some(chunk) = self.peek(key) {
            return Some(chunk);
        }
        self.load_through(key)
    }
}

impl std::fmt::Debug for ChunkCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkCacheManager")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
