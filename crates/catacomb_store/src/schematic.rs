//! # Room Template Files
//!
//! On-disk form of a library room: an NBT compound, LZ4 compressed with the
//! uncompressed size prepended.
//!
//! ```text
//! Metadata      { Author: string, Updated: long }
//! Blocks        byte[2048]   block types
//! Data          byte[2048]   block modifiers
//! Doorways      byte[14]     non-zero = doorway present, by direction code
//! Themes        string       comma-joined
//! DefaultTheme  string
//! TileEntities  { id: byte[] }   optional
//! ```
//!
//! Block arrays use the room index `(x & 0xF) << 7 | (z & 0xF) << 3 | (y & 0x7)`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use catacomb_core::{
    DoorwaySet, Room, RoomBlocks, RoomPayload, TemplateRecord, Themes, TileEntities,
    DIRECTION_COUNT, ROOM_VOLUME,
};
use fastnbt::ByteArray;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Metadata {
    author: String,
    updated: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SchematicFile {
    metadata: Metadata,
    blocks: ByteArray,
    data: ByteArray,
    doorways: ByteArray,
    themes: String,
    default_theme: String,
    #[serde(default)]
    tile_entities: HashMap<String, ByteArray>,
}

#[inline]
fn to_nbt_bytes(bytes: &[u8]) -> ByteArray {
    ByteArray::new(bytemuck::cast_slice::<u8, i8>(bytes).to_vec())
}

#[inline]
fn from_nbt_bytes(array: ByteArray) -> Vec<u8> {
    bytemuck::cast_slice::<i8, u8>(&array.into_inner()).to_vec()
}

/// A decoded room template file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomSchematic {
    /// Who last saved the file.
    pub author: String,
    /// Last save time, seconds since the epoch.
    pub updated: i64,
    /// Doorways the room exposes.
    pub doorways: DoorwaySet,
    /// Allowed themes.
    pub themes: Themes,
    /// Blocks and special blocks.
    pub payload: RoomPayload,
}

impl RoomSchematic {
    /// Captures a room's current blocks (live or in-memory) and metadata.
    #[must_use]
    pub fn from_room(room: &Room, author: &str, updated: i64) -> Self {
        Self {
            author: author.to_string(),
            updated,
            doorways: room.doorways(),
            themes: room.themes().clone(),
            payload: RoomPayload {
                blocks: room.blocks().into_owned(),
                tile_entities: room.tile_entities().into_owned(),
            },
        }
    }

    /// Library record for this file. The record is unsaved (`id: None`).
    #[must_use]
    pub fn to_template(&self, filename: &str, name: &str) -> TemplateRecord {
        TemplateRecord::new(filename, name, self.doorways).with_themes(self.themes.clone())
    }

    /// Encodes to the compressed file format.
    ///
    /// # Errors
    ///
    /// [`StoreError::Asset`] if NBT serialization fails.
    pub fn encode(&self, location: &str) -> StoreResult<Vec<u8>> {
        let file = SchematicFile {
            metadata: Metadata {
                author: self.author.clone(),
                updated: self.updated,
            },
            blocks: to_nbt_bytes(self.payload.blocks.types()),
            data: to_nbt_bytes(self.payload.blocks.modifiers()),
            doorways: to_nbt_bytes(&self.doorways.to_raw()),
            themes: self.themes.joined(),
            default_theme: self.themes.default_theme().to_string(),
            tile_entities: self
                .payload
                .tile_entities
                .iter()
                .map(|(id, data)| (id.clone(), to_nbt_bytes(data)))
                .collect(),
        };

        let nbt = fastnbt::to_bytes(&file).map_err(|e| StoreError::asset(e, location))?;
        Ok(lz4_flex::compress_prepend_size(&nbt))
    }

    /// Decodes the compressed file format.
    ///
    /// # Errors
    ///
    /// [`StoreError::Asset`] on bad compression, bad NBT, or block arrays
    /// that are not exactly one room long.
    pub fn decode(bytes: &[u8], location: &str) -> StoreResult<Self> {
        let nbt = lz4_flex::decompress_size_prepended(bytes)
            .map_err(|e| StoreError::asset(e, location))?;
        let file: SchematicFile =
            fastnbt::from_bytes(&nbt).map_err(|e| StoreError::asset(e, location))?;

        let types = from_nbt_bytes(file.blocks);
        let modifiers = from_nbt_bytes(file.data);
        let blocks = RoomBlocks::from_slices(&types, &modifiers).ok_or_else(|| {
            StoreError::asset(
                format!(
                    "expected {ROOM_VOLUME} blocks, found {} types and {} modifiers",
                    types.len(),
                    modifiers.len()
                ),
                location,
            )
        })?;

        let doorways = from_nbt_bytes(file.doorways);
        if doorways.len() > DIRECTION_COUNT {
            debug!(location, len = doorways.len(), "doorway vector longer than expected");
        }

        let tile_entities: TileEntities = file
            .tile_entities
            .into_iter()
            .map(|(id, data)| (id, from_nbt_bytes(data)))
            .collect();

        Ok(Self {
            author: file.metadata.author,
            updated: file.metadata.updated,
            doorways: DoorwaySet::from_raw(&doorways),
            themes: Themes::parse(&file.themes, &file.default_theme),
            payload: RoomPayload {
                blocks,
                tile_entities,
            },
        })
    }

    /// Reads and decodes a template file.
    ///
    /// # Errors
    ///
    /// [`StoreError::Asset`] if the file cannot be read or decoded.
    pub fn read_from(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| StoreError::asset(e, &location))?;
        Self::decode(&bytes, &location)
    }

    /// Encodes and writes a template file, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`StoreError::Asset`] if encoding or writing fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let bytes = self.encode(&location)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::asset(e, &location))?;
        }
        fs::write(path, bytes).map_err(|e| StoreError::asset(e, &location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catacomb_core::{Direction, RoomKey};

    fn sample() -> RoomSchematic {
        let mut blocks = RoomBlocks::empty();
        blocks.set(0, 0, 0, 4, 0);
        blocks.set(15, 7, 15, 200, 9);
        blocks.set(3, 2, 11, 98, 3);
        let mut tile_entities = TileEntities::new();
        tile_entities.insert("chest".to_string(), vec![1, 2, 255]);

        RoomSchematic {
            author: "mason".to_string(),
            updated: 1_700_000_000,
            doorways: DoorwaySet::of(&[Direction::N, Direction::E, Direction::Up]),
            themes: Themes::new(["stone", "moss"], "stone"),
            payload: RoomPayload {
                blocks,
                tile_entities,
            },
        }
    }

    #[test]
    fn test_encode_decode_preserves_payload() {
        let schematic = sample();
        let bytes = schematic.encode("sample.room").unwrap();
        let decoded = RoomSchematic::decode(&bytes, "sample.room").unwrap();
        assert_eq!(decoded, schematic);
        assert_eq!(decoded.payload.blocks.get(15, 7, 15), (200, 9));
    }

    #[test]
    fn test_garbage_is_asset_error() {
        let err = RoomSchematic::decode(&[1, 2, 3, 4, 5, 6], "junk.room").unwrap_err();
        assert_eq!(err.kind(), "asset");
        assert_eq!(err.location(), "junk.room");
    }

    #[test]
    fn test_short_block_array_is_asset_error() {
        let file = SchematicFile {
            metadata: Metadata {
                author: String::new(),
                updated: 0,
            },
            blocks: to_nbt_bytes(&[0; 10]),
            data: to_nbt_bytes(&[0; 10]),
            doorways: to_nbt_bytes(&[0; DIRECTION_COUNT]),
            themes: String::new(),
            default_theme: String::new(),
            tile_entities: HashMap::new(),
        };
        let bytes = lz4_flex::compress_prepend_size(&fastnbt::to_bytes(&file).unwrap());
        let err = RoomSchematic::decode(&bytes, "short.room").unwrap_err();
        assert!(err.reason().contains("2048"));
    }

    #[test]
    fn test_file_round_trip_and_template() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir()
            .join(format!("catacomb_schematic_{nanos}"))
            .join("hall.room");

        let mut room = Room::new(RoomKey::new("w", 0, 0, 0));
        room.set_doorways(DoorwaySet::of(&[Direction::S]));
        room.set_block(1, 1, 1, 7, 2);

        let schematic = RoomSchematic::from_room(&room, "mason", 42);
        schematic.write_to(&path).unwrap();
        let loaded = RoomSchematic::read_from(&path).unwrap();
        assert_eq!(loaded.payload.blocks.get(1, 1, 1), (7, 2));

        let record = loaded.to_template("hall.room", "Hall");
        assert_eq!(record.id, None);
        assert!(record.doorways.contains(Direction::S));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
