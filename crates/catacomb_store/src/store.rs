//! # Room Library Store Contract
//!
//! One contract for every record family the engine persists:
//!
//! | Family | Key | Notes |
//! |---|---|---|
//! | active chunks | (world, x, z) | existence marks "generated" |
//! | active rooms | (world, x, y, z) | links to a template |
//! | library templates | id | what assembly draws from |
//! | room sets | id | multi-room groupings |
//! | widgets | id | decorative structures |
//!
//! ## Error Policy
//!
//! Lookups of records that do not exist yet return `Ok(None)`. The error
//! channel is reserved for store faults, split into get / save / delete /
//! asset failures.

use catacomb_core::{
    Chunk, ChunkKey, Direction, DoorwaySet, Room, RoomKey, RoomSet, TemplateId, TemplateRecord,
    Widget,
};

use crate::error::StoreResult;

/// Persistence contract for chunks, rooms and the room library.
///
/// Implementations serialize their own writes; every method may be called
/// from several threads at once.
pub trait RoomStore: Send + Sync {
    // ------------------------------------------------------------------
    // Active chunks
    // ------------------------------------------------------------------

    /// Loads a chunk with every stored room. `Ok(None)` if the chunk was
    /// never saved.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn load_chunk(&self, key: &ChunkKey) -> StoreResult<Option<Chunk>>;

    /// Saves the chunk row and every loaded room as one transaction.
    ///
    /// # Errors
    ///
    /// [`StoreError::Save`](crate::StoreError::Save); nothing is written.
    fn save_chunk(&self, chunk: &Chunk) -> StoreResult<()>;

    /// Deletes a chunk and its rooms. Deleting a missing chunk succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::Delete`](crate::StoreError::Delete) on store faults.
    fn delete_chunk(&self, key: &ChunkKey) -> StoreResult<()>;

    /// Returns true if the chunk has been saved before.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn chunk_exists(&self, key: &ChunkKey) -> StoreResult<bool>;

    // ------------------------------------------------------------------
    // Active rooms
    // ------------------------------------------------------------------

    /// Loads one room. `Ok(None)` if it was never saved.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn load_room(&self, key: &RoomKey) -> StoreResult<Option<Room>>;

    /// Upserts one room.
    ///
    /// # Errors
    ///
    /// [`StoreError::Save`](crate::StoreError::Save) on store faults.
    fn save_room(&self, room: &Room) -> StoreResult<()>;

    /// Deletes one room.
    ///
    /// # Errors
    ///
    /// [`StoreError::Delete`](crate::StoreError::Delete) on store faults.
    fn delete_room(&self, key: &RoomKey) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Library templates
    // ------------------------------------------------------------------

    /// Inserts the template when it has no id, else upserts by id.
    /// Returns the id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Save`](crate::StoreError::Save), for example on a
    /// duplicate filename.
    fn save_template(&self, template: &TemplateRecord) -> StoreResult<TemplateId>;

    /// Loads a template by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn template(&self, id: TemplateId) -> StoreResult<Option<TemplateRecord>>;

    /// Loads a template by file name.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn template_by_filename(&self, filename: &str) -> StoreResult<Option<TemplateRecord>>;

    /// Deletes a template.
    ///
    /// # Errors
    ///
    /// [`StoreError::Delete`](crate::StoreError::Delete) on store faults.
    fn delete_template(&self, id: TemplateId) -> StoreResult<()>;

    /// Every template, ordered by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn templates(&self) -> StoreResult<Vec<TemplateRecord>>;

    /// Picks a template uniformly at random among those exposing every
    /// `required` doorway.
    ///
    /// With no match, retries once without requirements. `Ok(None)` means
    /// the library is empty: terminal for the caller's assembly attempt.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn random_template(&self, required: &[Direction]) -> StoreResult<Option<TemplateRecord>>;

    /// [`RoomStore::random_template`] for a doorway set.
    ///
    /// # Errors
    ///
    /// Same as [`RoomStore::random_template`].
    fn random_template_for(&self, required: DoorwaySet) -> StoreResult<Option<TemplateRecord>> {
        let required: Vec<Direction> = required.iter().collect();
        self.random_template(&required)
    }

    // ------------------------------------------------------------------
    // Room sets
    // ------------------------------------------------------------------

    /// Inserts or upserts a room set. Returns its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Save`](crate::StoreError::Save) on store faults.
    fn save_room_set(&self, set: &RoomSet) -> StoreResult<i64>;

    /// Loads a room set.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn room_set(&self, id: i64) -> StoreResult<Option<RoomSet>>;

    /// Deletes a room set.
    ///
    /// # Errors
    ///
    /// [`StoreError::Delete`](crate::StoreError::Delete) on store faults.
    fn delete_room_set(&self, id: i64) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Widgets
    // ------------------------------------------------------------------

    /// Inserts or upserts a widget. Returns its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Save`](crate::StoreError::Save) on store faults.
    fn save_widget(&self, widget: &Widget) -> StoreResult<i64>;

    /// Loads a widget.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn widget(&self, id: i64) -> StoreResult<Option<Widget>>;

    /// Deletes a widget.
    ///
    /// # Errors
    ///
    /// [`StoreError::Delete`](crate::StoreError::Delete) on store faults.
    fn delete_widget(&self, id: i64) -> StoreResult<()>;

    /// Every widget, ordered by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`](crate::StoreError::Get) on store faults.
    fn widgets(&self) -> StoreResult<Vec<Widget>>;
}
