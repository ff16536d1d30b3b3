//! # CATACOMB Core
//!
//! Geometry and entities for assembling worlds out of pre-authored rooms.
//!
//! ## Design Principles
//!
//! 1. **Closed geometry**: 14 doorway directions, 6 sides, no other states
//! 2. **Keys, not pointers**: chunks and rooms name their neighbors by key
//! 3. **Source-agnostic payloads**: a room reads blocks from the live world
//!    or from memory without the caller knowing which
//!
//! ## Core Components
//!
//! - `Direction` / `Side`: the doorway geometry model
//! - `DoorwaySet`: compact presence set, 14-byte raw vector for storage
//! - `Room` / `Chunk`: the entities assembled and persisted
//! - `TemplateRecord` / `RoomSet` / `Widget`: library catalog records
//! - `LruMap`: bounded map behind the caches
//!
//! ## Example
//!
//! ```rust
//! use catacomb_core::{ChunkKey, Direction, Side};
//!
//! let key = ChunkKey::new("test", 0, 0);
//! let mut chunk = catacomb_core::Chunk::new(key.clone());
//! if let Some(room) = chunk.room_mut(0) {
//!     room.set_doorway(Direction::S, true);
//! }
//!
//! assert_eq!(key.neighbor(Side::South), Some(ChunkKey::new("test", 1, 0)));
//! assert_eq!(Direction::S.mirror(), Direction::N);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod blocks;
pub mod chunk;
pub mod direction;
pub mod doorway;
pub mod lru;
pub mod records;
pub mod room;
pub mod themes;

pub use blocks::{
    block_index, RoomBlocks, RoomOrigin, RoomPayload, TileEntities, WorldBacking, ROOM_DEPTH,
    ROOM_HEIGHT, ROOM_VOLUME, ROOM_WIDTH,
};
pub use chunk::{Chunk, ChunkKey, CHUNK_SIZE, ROOMS_PER_CHUNK};
pub use direction::{Direction, Rotation, Side, DIRECTION_COUNT, HORIZONTAL_COUNT};
pub use doorway::DoorwaySet;
pub use lru::LruMap;
pub use records::{RoomSet, TemplateId, TemplateRecord, Widget};
pub use room::{Room, RoomKey};
pub use themes::{Themes, DEFAULT_THEME};
