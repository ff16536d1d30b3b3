//! # Data Manager
//!
//! Orchestrates the store and the schematic cache, and owns the assembly
//! algorithm.
//!
//! ## Doorway Matching
//!
//! Each neighbor contributes only the doorways on the side that faces back
//! toward us: the room to the north is read for S, SSE and SSW. Those are
//! kept as-is in the adjacency results and mirrored across the shared face
//! when they become requirements (a neighbor's S needs our N).
//!
//! ## Assembly
//!
//! ```text
//! buckets = facing-back doorways of the 4 horizontal neighbors, per height
//! for y in 0..16:
//!     required = mirror(buckets[y])  (+ DOWN if room y-1 has UP)
//!     template = store.random_template(required)   none -> abort
//!     payload  = schematics.get(library_dir / template.filename)
//!     chunk[y] = room(template, payload)
//! ```
//!
//! ## Failure Policy
//!
//! Store faults stop at this boundary: they are logged with reason and
//! location and turned into `None` / `false`. Assembly is the exception and
//! reports [`AssemblyError`] so the caller can choose a fallback layout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use catacomb_core::{
    Chunk, ChunkKey, Direction, DoorwaySet, Room, RoomKey, Side, TemplateRecord, ROOMS_PER_CHUNK,
};
use catacomb_store::{
    RoomSchematic, RoomStore, SchematicCache, SqliteStore, StoreError, StoreResult,
};
use tracing::{debug, info, warn};

use crate::config::CatacombConfig;
use crate::error::AssemblyError;

/// Resolves neighbor chunks by coordinate.
///
/// Implementations must never generate: a neighbor that does not exist yet
/// simply imposes no constraint.
pub trait NeighborLookup {
    /// The chunk at `key`, if it is cached or stored.
    fn chunk(&self, key: &ChunkKey) -> Option<Arc<Chunk>>;
}

/// Facing-back doorways of a room's neighbors, grouped by the side of the
/// room each neighbor sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdjacentDoorways {
    by_side: [DoorwaySet; 6],
}

impl AdjacentDoorways {
    /// Doorways of the neighbor on `side`, as that neighbor has them.
    #[must_use]
    pub fn from_side(&self, side: Side) -> DoorwaySet {
        self.by_side[side_slot(side)]
    }

    /// Every neighbor doorway, as the neighbors have them.
    #[must_use]
    pub fn all(&self) -> DoorwaySet {
        self.by_side
            .iter()
            .fold(DoorwaySet::empty(), |acc, set| acc.union(*set))
    }

    /// Doorways this room must expose to meet its neighbors.
    #[must_use]
    pub fn required(&self) -> DoorwaySet {
        self.all().mirrored()
    }

    /// True when no neighbor imposes anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_side.iter().all(|set| set.is_empty())
    }
}

#[inline]
const fn side_slot(side: Side) -> usize {
    match side {
        Side::North => 0,
        Side::East => 1,
        Side::South => 2,
        Side::West => 3,
        Side::Top => 4,
        Side::Bottom => 5,
    }
}

/// Logs a store fault at the degrade boundary.
fn log_fault(what: &str, err: &StoreError) {
    warn!(
        kind = err.kind(),
        reason = err.reason(),
        location = err.location(),
        "{what} failed"
    );
}

/// Seconds since the epoch, for template metadata.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Store plus schematic cache, with the assembly algorithm on top.
pub struct DataManager {
    store: Arc<dyn RoomStore>,
    schematics: SchematicCache,
    library_dir: PathBuf,
}

impl DataManager {
    /// Creates a manager over an existing store.
    #[must_use]
    pub fn new(
        store: Arc<dyn RoomStore>,
        library_dir: impl Into<PathBuf>,
        schematic_capacity: usize,
    ) -> Self {
        Self {
            store,
            schematics: SchematicCache::new(schematic_capacity),
            library_dir: library_dir.into(),
        }
    }

    /// Opens the configured SQLite store and builds a manager over it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`] if the database cannot be opened.
    pub fn open(config: &CatacombConfig) -> StoreResult<Self> {
        let store = SqliteStore::open(&config.database_path)?;
        let store = match config.seed {
            Some(seed) => store.with_seed(seed),
            None => store,
        };
        info!(
            database = %config.database_path.display(),
            library = %config.library_dir.display(),
            seeded = config.seed.is_some(),
            "data manager ready"
        );
        Ok(Self::new(
            Arc::new(store),
            config.library_dir.clone(),
            config.schematic_cache_capacity,
        ))
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    /// Decoded template payloads.
    #[must_use]
    pub fn schematics(&self) -> &SchematicCache {
        &self.schematics
    }

    /// Directory template filenames are resolved against.
    #[must_use]
    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// Full path of a template file.
    #[must_use]
    pub fn template_path(&self, filename: &str) -> PathBuf {
        self.library_dir.join(filename)
    }

    // ------------------------------------------------------------------
    // Load / save
    // ------------------------------------------------------------------

    /// Gives a stored room its template payload. A missing or broken file
    /// leaves the room with empty blocks.
    fn attach_payload(&self, room: &mut Room) {
        if room.filename().is_empty() {
            return;
        }
        match self.schematics.get(self.template_path(room.filename())) {
            Ok(payload) => room.set_payload(payload),
            Err(err) => log_fault("payload load", &err),
        }
    }

    /// Loads a stored chunk with its room payloads. `None` if the chunk was
    /// never saved or the store failed.
    pub fn load_chunk(&self, key: &ChunkKey) -> Option<Chunk> {
        let mut chunk = match self.store.load_chunk(key) {
            Ok(chunk) => chunk?,
            Err(err) => {
                log_fault("chunk load", &err);
                return None;
            }
        };
        for y in (0u8..).take(ROOMS_PER_CHUNK) {
            if let Some(room) = chunk.room_mut(y).filter(|room| room.is_loaded()) {
                self.attach_payload(room);
            }
        }
        chunk.modified = false;
        Some(chunk)
    }

    /// Saves a chunk and its loaded rooms. Returns false on failure.
    pub fn save_chunk(&self, chunk: &Chunk) -> bool {
        match self.store.save_chunk(chunk) {
            Ok(()) => true,
            Err(err) => {
                log_fault("chunk save", &err);
                false
            }
        }
    }

    /// Loads one stored room with its payload.
    pub fn load_room(&self, key: &RoomKey) -> Option<Room> {
        match self.store.load_room(key) {
            Ok(room) => room.map(|mut room| {
                self.attach_payload(&mut room);
                room
            }),
            Err(err) => {
                log_fault("room load", &err);
                None
            }
        }
    }

    /// Saves one room. Returns false on failure.
    pub fn save_room(&self, room: &Room) -> bool {
        match self.store.save_room(room) {
            Ok(()) => true,
            Err(err) => {
                log_fault("room save", &err);
                false
            }
        }
    }

    /// True once the chunk has been durably saved. A store fault reads as
    /// not generated.
    pub fn is_generated(&self, key: &ChunkKey) -> bool {
        self.store.chunk_exists(key).unwrap_or_else(|err| {
            log_fault("generated check", &err);
            false
        })
    }

    // ------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------

    /// Facing-back doorways of the up to 6 neighbors of an existing room.
    pub fn adjacent_doorways_for_room(
        &self,
        key: &RoomKey,
        lookup: &dyn NeighborLookup,
    ) -> AdjacentDoorways {
        let mut adjacent = AdjacentDoorways::default();
        for side in Side::ALL {
            let Some(neighbor) = key.neighbor(side.center()) else {
                continue;
            };
            let Some(chunk) = lookup.chunk(&neighbor.chunk()) else {
                continue;
            };
            if let Some(room) = chunk.room(neighbor.y).filter(|room| room.is_loaded()) {
                adjacent.by_side[side_slot(side)] =
                    DoorwaySet::of(&room.doorways_on_side(side.opposite()));
            }
        }
        adjacent
    }

    /// Facing-back doorways of the 4 horizontal neighbors, bucketed by
    /// room height, for a chunk that does not exist yet.
    pub fn adjacent_doorways_for_new_chunk(
        &self,
        key: &ChunkKey,
        lookup: &dyn NeighborLookup,
    ) -> [DoorwaySet; ROOMS_PER_CHUNK] {
        let mut buckets = [DoorwaySet::empty(); ROOMS_PER_CHUNK];
        for (side, neighbor) in key.neighbors() {
            let Some(chunk) = lookup.chunk(&neighbor) else {
                continue;
            };
            for room in chunk.loaded_rooms() {
                if let Some(bucket) = buckets.get_mut(usize::from(room.y())) {
                    bucket.extend(room.doorways_on_side(side.opposite()));
                }
            }
        }
        buckets
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    /// Fills all 16 rooms of a new chunk from the library, bottom to top.
    ///
    /// The chunk is returned unsaved; persisting it is the caller's step.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::NoRoomsAvailable`] when the library is empty, and
    /// [`AssemblyError::Store`] on a store fault or an unreadable template
    /// file. No partial chunk is returned in either case.
    pub fn assemble_chunk(
        &self,
        key: &ChunkKey,
        lookup: &dyn NeighborLookup,
    ) -> Result<Chunk, AssemblyError> {
        let buckets = self.adjacent_doorways_for_new_chunk(key, lookup);
        let mut chunk = Chunk::new(key.clone());
        let mut below_has_up = false;

        for (y, bucket) in (0u8..).zip(buckets) {
            let mut required = bucket.mirrored();
            if below_has_up {
                required.insert(Direction::Down);
            }

            let template = self.pick(key, y, required)?;
            let payload = self
                .schematics
                .get(self.template_path(&template.filename))
                .map_err(|source| {
                    log_fault("template payload", &source);
                    AssemblyError::Store {
                        chunk: key.clone(),
                        source,
                    }
                })?;

            let mut room = Room::from_template(key.room(y), &template);
            room.set_payload(payload);
            below_has_up = room.has_doorway(Direction::Up);
            chunk.set_room(room);
        }

        debug!(chunk = %key, "chunk assembled");
        Ok(chunk)
    }

    fn pick(
        &self,
        key: &ChunkKey,
        height: u8,
        required: DoorwaySet,
    ) -> Result<TemplateRecord, AssemblyError> {
        match self.store.random_template_for(required) {
            Ok(Some(template)) => {
                if !template.satisfies(required) {
                    debug!(chunk = %key, height, required = %required, "constraints relaxed");
                }
                Ok(template)
            }
            Ok(None) => {
                warn!(chunk = %key, height, "no rooms available");
                Err(AssemblyError::NoRoomsAvailable {
                    chunk: key.clone(),
                    height,
                })
            }
            Err(source) => {
                log_fault("template pick", &source);
                Err(AssemblyError::Store {
                    chunk: key.clone(),
                    source,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Library files
    // ------------------------------------------------------------------

    /// Decodes a template file and upserts its library record, keyed by
    /// filename. Files under the library directory are recorded by their
    /// relative path, others by file name.
    pub fn import_template(&self, path: impl AsRef<Path>) -> Option<TemplateRecord> {
        let path = path.as_ref();
        let schematic = match RoomSchematic::read_from(path) {
            Ok(schematic) => schematic,
            Err(err) => {
                log_fault("template import", &err);
                return None;
            }
        };

        let filename = path
            .strip_prefix(&self.library_dir)
            .ok()
            .or_else(|| path.file_name().map(Path::new))?
            .to_string_lossy()
            .into_owned();
        let name = path
            .file_stem()
            .map_or_else(|| filename.clone(), |stem| stem.to_string_lossy().into_owned());

        let mut record = schematic.to_template(&filename, &name);
        let saved = self
            .store
            .template_by_filename(&filename)
            .and_then(|existing| {
                record.id = existing.and_then(|t| t.id);
                self.store.save_template(&record)
            });
        match saved {
            Ok(id) => {
                record.id = Some(id);
                self.schematics.invalidate(self.template_path(&filename));
                info!(template = %id, filename = %filename, doorways = %record.doorways, "template imported");
                Some(record)
            }
            Err(err) => {
                log_fault("template import", &err);
                None
            }
        }
    }

    /// Writes a room's current blocks and metadata as a template file.
    /// Returns false on failure.
    pub fn export_template(&self, room: &Room, path: impl AsRef<Path>, author: &str) -> bool {
        let path = path.as_ref();
        match RoomSchematic::from_room(room, author, unix_now()).write_to(path) {
            Ok(()) => {
                self.schematics.invalidate(path);
                debug!(room = %room.key(), path = %path.display(), "template exported");
                true
            }
            Err(err) => {
                log_fault("template export", &err);
                false
            }
        }
    }
}

impl NeighborLookup for DataManager {
    /// Store-only lookup: doorways without payloads.
    fn chunk(&self, key: &ChunkKey) -> Option<Arc<Chunk>> {
        match self.store.load_chunk(key) {
            Ok(chunk) => chunk.map(Arc::new),
            Err(err) => {
                log_fault("neighbor load", &err);
                None
            }
        }
    }
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("library_dir", &self.library_dir)
            .field("schematics", &self.schematics)
            .finish_non_exhaustive()
    }
}
