//! # Chunk System
//!
//! The world is organized into chunk columns:
//! - 16x16 blocks horizontally
//! - 16 rooms stacked vertically (16x16x8 blocks each)
//!
//! ## Coordinates
//!
//! ```text
//!            North (x - 1)
//!                 ^
//!   West (z - 1) <+> East (z + 1)
//!                 v
//!            South (x + 1)
//! ```
//!
//! Neighbors are plain keys. Chunks never hold references to each other;
//! the chunk cache resolves a key to the canonical instance.

use std::fmt;

use crate::direction::Side;
use crate::room::{Room, RoomKey};

/// Rooms stacked in one chunk.
pub const ROOMS_PER_CHUNK: usize = 16;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Identity of a chunk: world name plus chunk coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    /// World name.
    pub world: String,
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkKey {
    /// Creates a new chunk key.
    #[must_use]
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }

    /// Converts world block coordinates to the key of the chunk holding them.
    #[must_use]
    pub fn from_block_pos(world: impl Into<String>, block_x: i32, block_z: i32) -> Self {
        Self::new(
            world,
            block_x.div_euclid(CHUNK_SIZE as i32),
            block_z.div_euclid(CHUNK_SIZE as i32),
        )
    }

    /// Offset of the neighbor on a horizontal side.
    #[must_use]
    pub const fn side_offset(side: Side) -> Option<(i32, i32)> {
        match side {
            Side::North => Some((-1, 0)),
            Side::South => Some((1, 0)),
            Side::East => Some((0, 1)),
            Side::West => Some((0, -1)),
            Side::Top | Side::Bottom => None,
        }
    }

    /// Key of the neighbor on a horizontal side. `None` for top and bottom,
    /// and past the edge of the coordinate space.
    #[must_use]
    pub fn neighbor(&self, side: Side) -> Option<Self> {
        let (dx, dz) = Self::side_offset(side)?;
        let x = self.x.checked_add(dx)?;
        let z = self.z.checked_add(dz)?;
        Some(Self::new(self.world.clone(), x, z))
    }

    /// Keys of the horizontal neighbors with the side they sit on. Sides
    /// past the edge of the coordinate space are skipped.
    #[must_use]
    pub fn neighbors(&self) -> Vec<(Side, Self)> {
        Side::HORIZONTAL
            .into_iter()
            .filter_map(|side| self.neighbor(side).map(|key| (side, key)))
            .collect()
    }

    /// Key of the room at vertical index `y` in this chunk.
    #[must_use]
    pub fn room(&self, y: u8) -> RoomKey {
        RoomKey::new(self.world.clone(), self.x, y, self.z)
    }

    /// Cache key: world name concatenated with the coordinates.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}@{},{}", self.world, self.x, self.z)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{},{}", self.world, self.x, self.z)
    }
}

/// A chunk column of 16 rooms.
#[derive(Clone, Debug)]
pub struct Chunk {
    key: ChunkKey,
    rooms: Vec<Room>,
    /// Whether this chunk has been changed since it was loaded or saved.
    pub modified: bool,
}

impl Chunk {
    /// Creates a chunk with 16 empty, unloaded rooms.
    #[must_use]
    pub fn new(key: ChunkKey) -> Self {
        let rooms = (0..ROOMS_PER_CHUNK as u8).map(|y| Room::new(key.room(y))).collect();
        Self {
            key,
            rooms,
            modified: false,
        }
    }

    /// Chunk identity.
    #[must_use]
    pub fn key(&self) -> &ChunkKey {
        &self.key
    }

    /// Room at vertical index `y`. `None` above 15.
    #[must_use]
    pub fn room(&self, y: u8) -> Option<&Room> {
        self.rooms.get(usize::from(y))
    }

    /// Mutable room at vertical index `y`. Marks the chunk modified.
    pub fn room_mut(&mut self, y: u8) -> Option<&mut Room> {
        let room = self.rooms.get_mut(usize::from(y))?;
        self.modified = true;
        Some(room)
    }

    /// All 16 rooms, bottom first.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Rooms that hold data, bottom first.
    pub fn loaded_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(|r| r.is_loaded())
    }

    /// Puts a room into its slot, replacing what was there.
    ///
    /// Returns false (and drops the room) if the room belongs to another
    /// chunk or its index is above 15.
    pub fn set_room(&mut self, room: Room) -> bool {
        let key = room.key();
        if key.world != self.key.world || key.x != self.key.x || key.z != self.key.z {
            return false;
        }
        match self.rooms.get_mut(usize::from(key.y)) {
            Some(slot) => {
                *slot = room;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Returns true once every room slot holds data.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rooms.iter().all(Room::is_loaded)
    }

    /// Key of the neighbor on a horizontal side.
    #[must_use]
    pub fn neighbor(&self, side: Side) -> Option<ChunkKey> {
        self.key.neighbor(side)
    }
}
