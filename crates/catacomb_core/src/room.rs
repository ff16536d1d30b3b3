//! # Rooms
//!
//! One 16x16x8 cell of a chunk, the unit of doorway matching.
//!
//! ## Block Payload
//!
//! A room's blocks come from one of two places:
//! - the live world, while a ready [`WorldBacking`] is attached
//! - an in-memory payload (usually a decoded template, shared through `Arc`)
//!
//! The assembly builds rooms fully in memory, before any world exists, and
//! attaches them later. Accessors hide which source is active.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::blocks::{RoomBlocks, RoomOrigin, RoomPayload, TileEntities, WorldBacking};
use crate::chunk::{ChunkKey, ROOMS_PER_CHUNK};
use crate::direction::{Direction, Side, DIRECTION_COUNT};
use crate::doorway::DoorwaySet;
use crate::records::{TemplateId, TemplateRecord};
use crate::themes::Themes;

/// Identity of a room: world, chunk X, vertical index, chunk Z.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RoomKey {
    /// World name.
    pub world: String,
    /// Chunk X.
    pub x: i32,
    /// Vertical index (0-15).
    pub y: u8,
    /// Chunk Z.
    pub z: i32,
}

impl RoomKey {
    /// Creates a room key.
    #[must_use]
    pub fn new(world: impl Into<String>, x: i32, y: u8, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Key of the chunk holding this room.
    #[must_use]
    pub fn chunk(&self) -> ChunkKey {
        ChunkKey::new(self.world.clone(), self.x, self.z)
    }

    /// Position of the room slot.
    #[must_use]
    pub const fn origin(&self) -> RoomOrigin {
        RoomOrigin {
            chunk_x: self.x,
            y: self.y,
            chunk_z: self.z,
        }
    }

    /// Key of the room in `direction`.
    ///
    /// Horizontal directions resolve to the center direction's side, so NNE
    /// and N both lead north. Returns `None` above index 15 and below 0.
    #[must_use]
    pub fn neighbor(&self, direction: Direction) -> Option<Self> {
        match direction.side() {
            Side::Top => {
                let y = self.y.checked_add(1).filter(|&y| usize::from(y) < ROOMS_PER_CHUNK)?;
                Some(Self::new(self.world.clone(), self.x, y, self.z))
            }
            Side::Bottom => {
                let y = self.y.checked_sub(1)?;
                Some(Self::new(self.world.clone(), self.x, y, self.z))
            }
            side => {
                let chunk = self.chunk().neighbor(side)?;
                Some(Self::new(chunk.world, chunk.x, self.y, chunk.z))
            }
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{},{},{}", self.world, self.x, self.y, self.z)
    }
}

/// One room of a chunk.
#[derive(Clone)]
pub struct Room {
    key: RoomKey,
    loaded: bool,
    doorways: DoorwaySet,
    template_id: Option<TemplateId>,
    name: String,
    filename: String,
    themes: Themes,
    payload: Arc<RoomPayload>,
    backing: Option<Arc<dyn WorldBacking>>,
}

impl Room {
    /// Creates an empty, unloaded room.
    #[must_use]
    pub fn new(key: RoomKey) -> Self {
        Self {
            key,
            loaded: false,
            doorways: DoorwaySet::empty(),
            template_id: None,
            name: String::new(),
            filename: String::new(),
            themes: Themes::default(),
            payload: Arc::new(RoomPayload::default()),
            backing: None,
        }
    }

    /// Creates a loaded room from a library template.
    #[must_use]
    pub fn from_template(key: RoomKey, template: &TemplateRecord) -> Self {
        let mut room = Self::new(key);
        room.apply_template(template);
        room
    }

    /// Room identity.
    #[must_use]
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Vertical index (0-15).
    #[must_use]
    pub fn y(&self) -> u8 {
        self.key.y
    }

    /// Returns true once the room holds data (from the store or assembly).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Marks the room as loaded or not.
    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    // ------------------------------------------------------------------
    // Doorways
    // ------------------------------------------------------------------

    /// Returns true if the doorway on `direction` is present.
    #[must_use]
    pub fn has_doorway(&self, direction: Direction) -> bool {
        self.doorways.contains(direction)
    }

    /// The doorway on `direction`, if present.
    #[must_use]
    pub fn doorway(&self, direction: Direction) -> Option<Direction> {
        self.has_doorway(direction).then_some(direction)
    }

    /// Adds or removes a doorway.
    pub fn set_doorway(&mut self, direction: Direction, present: bool) {
        self.doorways.set(direction, present);
    }

    /// Removes every doorway.
    pub fn reset_doorways(&mut self) {
        self.doorways.clear();
    }

    /// Present doorways on `side`, clockwise.
    #[must_use]
    pub fn doorways_on_side(&self, side: Side) -> Vec<Direction> {
        self.doorways.on_side(side)
    }

    /// All present doorways.
    #[must_use]
    pub fn doorways(&self) -> DoorwaySet {
        self.doorways
    }

    /// Replaces the doorway set.
    pub fn set_doorways(&mut self, doorways: DoorwaySet) {
        self.doorways = doorways;
    }

    /// 14-byte presence vector indexed by direction code.
    #[must_use]
    pub fn doorways_raw(&self) -> [u8; DIRECTION_COUNT] {
        self.doorways.to_raw()
    }

    /// Replaces the doorway set from a presence vector.
    pub fn set_doorways_raw(&mut self, raw: &[u8]) {
        self.doorways = DoorwaySet::from_raw(raw);
    }

    /// Key of the neighboring room in `direction`.
    #[must_use]
    pub fn neighbor(&self, direction: Direction) -> Option<RoomKey> {
        self.key.neighbor(direction)
    }

    // ------------------------------------------------------------------
    // Library linkage and themes
    // ------------------------------------------------------------------

    /// Library template this room was built from.
    #[must_use]
    pub fn template_id(&self) -> Option<TemplateId> {
        self.template_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Sets the library linkage without touching doorways or themes.
    pub fn set_template(&mut self, id: Option<TemplateId>, name: &str, filename: &str) {
        self.template_id = id;
        self.name = name.to_string();
        self.filename = filename.to_string();
    }

    /// Copies linkage, doorways and themes from a template and marks the
    /// room loaded. The block payload is attached separately.
    pub fn apply_template(&mut self, template: &TemplateRecord) {
        self.template_id = template.id;
        self.name.clone_from(&template.name);
        self.filename.clone_from(&template.filename);
        self.doorways = template.doorways;
        self.themes = template.themes.clone();
        self.loaded = true;
    }

    /// Allowed themes.
    #[must_use]
    pub fn themes(&self) -> &Themes {
        &self.themes
    }

    /// Mutable access to the themes.
    pub fn themes_mut(&mut self) -> &mut Themes {
        &mut self.themes
    }

    /// Replaces the themes.
    pub fn set_themes(&mut self, themes: Themes) {
        self.themes = themes;
    }

    /// Changes the default theme. Returns false if `theme` is not allowed.
    pub fn set_default_theme(&mut self, theme: &str) -> bool {
        self.themes.set_default(theme)
    }

    // ------------------------------------------------------------------
    // Block payload
    // ------------------------------------------------------------------

    /// Attaches the room to a live world.
    pub fn attach(&mut self, backing: Arc<dyn WorldBacking>) {
        self.backing = Some(backing);
    }

    /// Detaches from the live world, keeping the in-memory payload.
    pub fn detach(&mut self) {
        self.backing = None;
    }

    fn live_backing(&self) -> Option<&Arc<dyn WorldBacking>> {
        self.backing.as_ref().filter(|b| b.is_ready(&self.key.world))
    }

    /// Returns true while a ready world backs the blocks.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live_backing().is_some()
    }

    /// Block payload: read from the live world when it is ready, otherwise
    /// the last assigned in-memory payload.
    #[must_use]
    pub fn blocks(&self) -> Cow<'_, RoomBlocks> {
        match self.live_backing() {
            Some(world) => Cow::Owned(world.capture(&self.key.world, self.key.origin())),
            None => Cow::Borrowed(&self.payload.blocks),
        }
    }

    /// Special blocks, with the same source rule as [`Room::blocks`].
    #[must_use]
    pub fn tile_entities(&self) -> Cow<'_, TileEntities> {
        match self.live_backing() {
            Some(world) => Cow::Owned(world.tile_entities(&self.key.world, self.key.origin())),
            None => Cow::Borrowed(&self.payload.tile_entities),
        }
    }

    /// Shared in-memory payload.
    #[must_use]
    pub fn payload(&self) -> &Arc<RoomPayload> {
        &self.payload
    }

    /// Assigns the in-memory payload.
    pub fn set_payload(&mut self, payload: Arc<RoomPayload>) {
        self.payload = payload;
    }

    /// Assigns in-memory blocks, keeping the special blocks.
    pub fn set_blocks(&mut self, blocks: RoomBlocks) {
        Arc::make_mut(&mut self.payload).blocks = blocks;
    }

    /// Writes one block to the live world when ready, else to memory.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block_type: u8, modifier: u8) {
        if let Some(world) = self.live_backing() {
            world.write_block(&self.key.world, self.key.origin(), x, y, z, block_type, modifier);
        } else {
            Arc::make_mut(&mut self.payload).blocks.set(x, y, z, block_type, modifier);
        }
    }

    /// Pushes the in-memory payload into the live world. Returns false when
    /// no ready world is attached.
    pub fn materialize(&self) -> bool {
        match self.live_backing() {
            Some(world) => {
                world.apply(&self.key.world, self.key.origin(), &self.payload.blocks);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("key", &self.key)
            .field("loaded", &self.loaded)
            .field("doorways", &self.doorways)
            .field("template_id", &self.template_id)
            .field("name", &self.name)
            .field("live", &self.backing.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakeWorld;

    /// Minimal in-memory world for payload source tests.
    mod fake {
        use std::collections::HashMap;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Mutex;

        use crate::blocks::{RoomOrigin, TileEntities, WorldBacking};

        #[derive(Default)]
        pub struct FakeWorld {
            pub ready: AtomicBool,
            pub blocks: Mutex<HashMap<(i32, u8, i32, usize, usize, usize), (u8, u8)>>,
        }

        impl WorldBacking for FakeWorld {
            fn is_ready(&self, _world: &str) -> bool {
                self.ready.load(Ordering::SeqCst)
            }

            fn read_block(&self, _world: &str, o: RoomOrigin, x: usize, y: usize, z: usize) -> (u8, u8) {
                let blocks = self.blocks.lock().unwrap();
                blocks.get(&(o.chunk_x, o.y, o.chunk_z, x, y, z)).copied().unwrap_or((0, 0))
            }

            fn write_block(&self, _world: &str, o: RoomOrigin, x: usize, y: usize, z: usize, t: u8, m: u8) {
                let mut blocks = self.blocks.lock().unwrap();
                blocks.insert((o.chunk_x, o.y, o.chunk_z, x, y, z), (t, m));
            }

            fn tile_entities(&self, _world: &str, _origin: RoomOrigin) -> TileEntities {
                let mut map = TileEntities::new();
                map.insert("chest".to_string(), vec![1, 2, 3]);
                map
            }
        }
    }

    fn room() -> Room {
        Room::new(RoomKey::new("test", 0, 3, 0))
    }

    #[test]
    fn test_doorway_contract() {
        let mut room = room();
        room.set_doorway(Direction::N, true);
        room.set_doorway(Direction::Sse, true);
        room.set_doorway(Direction::Up, true);

        let raw = room.doorways_raw();
        assert_eq!(raw.len(), 14);
        for d in Direction::ALL {
            assert_eq!(room.has_doorway(d), raw[d.index()] == 1);
        }
        assert_eq!(room.doorway(Direction::N), Some(Direction::N));
        assert_eq!(room.doorway(Direction::E), None);
        assert_eq!(room.doorways_on_side(Side::South), vec![Direction::Sse]);

        room.reset_doorways();
        assert!(room.doorways().is_empty());
        room.set_doorways_raw(&raw);
        assert!(room.has_doorway(Direction::Up));
    }

    #[test]
    fn test_neighbors() {
        let room = room();
        assert_eq!(room.neighbor(Direction::N), Some(RoomKey::new("test", -1, 3, 0)));
        assert_eq!(room.neighbor(Direction::Nne), Some(RoomKey::new("test", -1, 3, 0)));
        assert_eq!(room.neighbor(Direction::S), Some(RoomKey::new("test", 1, 3, 0)));
        assert_eq!(room.neighbor(Direction::E), Some(RoomKey::new("test", 0, 3, 1)));
        assert_eq!(room.neighbor(Direction::W), Some(RoomKey::new("test", 0, 3, -1)));
        assert_eq!(room.neighbor(Direction::Up), Some(RoomKey::new("test", 0, 4, 0)));
        assert_eq!(room.neighbor(Direction::Down), Some(RoomKey::new("test", 0, 2, 0)));

        let top = Room::new(RoomKey::new("test", 0, 15, 0));
        assert_eq!(top.neighbor(Direction::Up), None);
        let bottom = Room::new(RoomKey::new("test", 0, 0, 0));
        assert_eq!(bottom.neighbor(Direction::Down), None);

        let edge = RoomKey::new("test", i32::MIN, 3, i32::MAX);
        assert_eq!(edge.neighbor(Direction::Nnw), None);
        assert_eq!(edge.neighbor(Direction::E), None);
        assert_eq!(edge.neighbor(Direction::S), Some(RoomKey::new("test", i32::MIN + 1, 3, i32::MAX)));
    }

    #[test]
    fn test_apply_template() {
        let mut template = TemplateRecord::new(
            "crypt.room",
            "Crypt",
            DoorwaySet::of(&[Direction::E, Direction::Down]),
        );
        template.id = Some(TemplateId(4));

        let room = Room::from_template(RoomKey::new("test", 0, 1, 0), &template);
        assert!(room.is_loaded());
        assert_eq!(room.template_id(), Some(TemplateId(4)));
        assert_eq!(room.name(), "Crypt");
        assert_eq!(room.filename(), "crypt.room");
        assert!(room.has_doorway(Direction::Down));
    }

    #[test]
    fn test_default_theme_must_be_allowed() {
        let mut room = room();
        room.set_themes(Themes::new(["stone", "moss"], "stone"));
        assert!(room.set_default_theme("moss"));
        assert!(!room.set_default_theme("lava"));
        assert_eq!(room.themes().default_theme(), "moss");
    }

    #[test]
    fn test_payload_source_follows_backing() {
        let world = Arc::new(FakeWorld::default());
        let mut room = room();

        room.set_block(1, 2, 3, 44, 1);
        assert_eq!(room.blocks().get(1, 2, 3), (44, 1));
        assert!(room.tile_entities().is_empty());

        room.attach(world.clone());
        // Attached but not ready: still memory.
        assert!(!room.is_live());
        assert_eq!(room.blocks().get(1, 2, 3), (44, 1));

        world.ready.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(room.is_live());
        assert_eq!(room.blocks().get(1, 2, 3), (0, 0));
        assert!(room.materialize());
        assert_eq!(room.blocks().get(1, 2, 3), (44, 1));
        assert_eq!(room.tile_entities().len(), 1);

        room.set_block(0, 0, 0, 9, 0);
        room.detach();
        assert_eq!(room.blocks().get(0, 0, 0), (0, 0));
    }

    #[test]
    fn test_clones_share_payload_until_written() {
        let mut a = room();
        a.set_block(0, 0, 0, 1, 0);
        let mut b = a.clone();
        assert!(Arc::ptr_eq(a.payload(), b.payload()));
        b.set_block(0, 0, 0, 2, 0);
        assert_eq!(a.blocks().get(0, 0, 0), (1, 0));
        assert_eq!(b.blocks().get(0, 0, 0), (2, 0));
    }
}
