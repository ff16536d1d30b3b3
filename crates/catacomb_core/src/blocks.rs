//! # Room Block Payloads
//!
//! A room is a 16x16x8 volume. Its blocks are two parallel byte arrays:
//! block types and block modifiers. Both are opaque to the engine.
//!
//! ## Layout
//!
//! ```text
//! index = (x & 0xF) << 7 | (z & 0xF) << 3 | (y & 0x7)
//! ```
//!
//! The same layout is used in template files, so arrays move between the
//! live world, template files and memory without reshuffling.

use std::collections::BTreeMap;
use std::fmt;

/// Room width (X) in blocks.
pub const ROOM_WIDTH: usize = 16;

/// Room depth (Z) in blocks.
pub const ROOM_DEPTH: usize = 16;

/// Room height (Y) in blocks.
pub const ROOM_HEIGHT: usize = 8;

/// Blocks per room.
pub const ROOM_VOLUME: usize = ROOM_WIDTH * ROOM_DEPTH * ROOM_HEIGHT;

/// Opaque per-block payloads for special blocks (chests, signs, spawners),
/// keyed by an identifier the world engine chooses.
pub type TileEntities = BTreeMap<String, Vec<u8>>;

/// Array index of a local position.
#[inline]
#[must_use]
pub const fn block_index(x: usize, y: usize, z: usize) -> usize {
    (x & 0xF) << 7 | (z & 0xF) << 3 | (y & 0x7)
}

/// Block types and modifiers of one room.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomBlocks {
    types: Box<[u8; ROOM_VOLUME]>,
    modifiers: Box<[u8; ROOM_VOLUME]>,
}

impl RoomBlocks {
    /// An all-zero (air) payload.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: Box::new([0; ROOM_VOLUME]),
            modifiers: Box::new([0; ROOM_VOLUME]),
        }
    }

    /// Builds a payload from raw arrays.
    ///
    /// Returns `None` unless both slices hold exactly [`ROOM_VOLUME`] bytes.
    #[must_use]
    pub fn from_slices(types: &[u8], modifiers: &[u8]) -> Option<Self> {
        let types: [u8; ROOM_VOLUME] = types.try_into().ok()?;
        let modifiers: [u8; ROOM_VOLUME] = modifiers.try_into().ok()?;
        Some(Self {
            types: Box::new(types),
            modifiers: Box::new(modifiers),
        })
    }

    /// Block type and modifier at a local position.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> (u8, u8) {
        let i = block_index(x, y, z);
        (self.types[i], self.modifiers[i])
    }

    /// Sets block type and modifier at a local position.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block_type: u8, modifier: u8) {
        let i = block_index(x, y, z);
        self.types[i] = block_type;
        self.modifiers[i] = modifier;
    }

    /// Raw block-type array.
    #[must_use]
    pub fn types(&self) -> &[u8] {
        self.types.as_slice()
    }

    /// Raw block-modifier array.
    #[must_use]
    pub fn modifiers(&self) -> &[u8] {
        self.modifiers.as_slice()
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.types.iter().filter(|&&t| t != 0).count()
    }
}

impl Default for RoomBlocks {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RoomBlocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomBlocks")
            .field("solid", &self.solid_count())
            .finish()
    }
}

/// Block payload plus special blocks, as decoded from a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomPayload {
    /// Block types and modifiers.
    pub blocks: RoomBlocks,
    /// Special blocks.
    pub tile_entities: TileEntities,
}

/// Absolute position of a room slot in a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoomOrigin {
    /// Chunk X.
    pub chunk_x: i32,
    /// Vertical room index (0-15).
    pub y: u8,
    /// Chunk Z.
    pub chunk_z: i32,
}

/// The live world engine a room can be attached to.
///
/// The engine owns the blocks while it is ready; the room then reads through
/// it instead of its in-memory copy.
pub trait WorldBacking: Send + Sync {
    /// Returns true once the world for `world` is loaded and writable.
    fn is_ready(&self, world: &str) -> bool;

    /// Block type and modifier at a local offset inside a room slot.
    fn read_block(&self, world: &str, origin: RoomOrigin, x: usize, y: usize, z: usize) -> (u8, u8);

    /// Writes a block at a local offset inside a room slot.
    fn write_block(
        &self,
        world: &str,
        origin: RoomOrigin,
        x: usize,
        y: usize,
        z: usize,
        block_type: u8,
        modifier: u8,
    );

    /// Special blocks inside the room slot's vertical slice.
    fn tile_entities(&self, world: &str, origin: RoomOrigin) -> TileEntities;

    /// Reads the whole room slot.
    fn capture(&self, world: &str, origin: RoomOrigin) -> RoomBlocks {
        let mut blocks = RoomBlocks::empty();
        for x in 0..ROOM_WIDTH {
            for z in 0..ROOM_DEPTH {
                for y in 0..ROOM_HEIGHT {
                    let (t, m) = self.read_block(world, origin, x, y, z);
                    blocks.set(x, y, z, t, m);
                }
            }
        }
        blocks
    }

    /// Writes a whole payload into the room slot.
    fn apply(&self, world: &str, origin: RoomOrigin, blocks: &RoomBlocks) {
        for x in 0..ROOM_WIDTH {
            for z in 0..ROOM_DEPTH {
                for y in 0..ROOM_HEIGHT {
                    let (t, m) = blocks.get(x, y, z);
                    self.write_block(world, origin, x, y, z, t, m);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_layout() {
        assert_eq!(block_index(0, 0, 0), 0);
        assert_eq!(block_index(0, 1, 0), 1);
        assert_eq!(block_index(0, 0, 1), 8);
        assert_eq!(block_index(1, 0, 0), 128);
        assert_eq!(block_index(15, 7, 15), ROOM_VOLUME - 1);
        // Out-of-range coordinates wrap inside the room.
        assert_eq!(block_index(16, 8, 16), 0);
    }

    #[test]
    fn test_from_slices_checks_length() {
        assert!(RoomBlocks::from_slices(&[0; ROOM_VOLUME], &[0; ROOM_VOLUME]).is_some());
        assert!(RoomBlocks::from_slices(&[0; 10], &[0; ROOM_VOLUME]).is_none());
    }

    #[test]
    fn test_get_set() {
        let mut blocks = RoomBlocks::empty();
        blocks.set(3, 4, 5, 98, 2);
        assert_eq!(blocks.get(3, 4, 5), (98, 2));
        assert_eq!(blocks.types()[block_index(3, 4, 5)], 98);
        assert_eq!(blocks.solid_count(), 1);
    }
}
