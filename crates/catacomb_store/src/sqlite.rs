//! # SQLite Room Store
//!
//! Embedded relational backend for [`RoomStore`].
//!
//! ## Concurrency
//!
//! One connection, one lock. Every method takes the connection mutex for
//! its whole statement sequence, so a COUNT and the OFFSET query that
//! follows it always see the same library, and a chunk save is never
//! interleaved with another writer.
//!
//! ## Schema
//!
//! ```text
//! library_rooms  id PK | filename UNIQUE | name | door_n .. door_down | default_theme | themes
//! active_chunks  (world, x, z) UNIQUE | generated_at
//! active_rooms   (world, x, y, z) UNIQUE | template_id -> library_rooms.id | name | filename | doorways BLOB | themes
//! room_sets      id PK | name | world, x, y, z | size_x, size_y, size_z
//! widgets        id PK | name | filename | default_theme | themes
//! ```
//!
//! ## Random Pick
//!
//! The doorway predicate is built only from the closed
//! [`Direction`] to column table below. Caller strings never reach SQL.
//! The pick counts matching rows, draws an offset from a seedable RNG and
//! fetches that row in id order.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use catacomb_core::{
    Chunk, ChunkKey, Direction, DoorwaySet, Room, RoomKey, RoomSet, TemplateId, TemplateRecord,
    Themes, Widget, DIRECTION_COUNT,
};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::RoomStore;

/// Doorway flag column for each direction, indexed by direction code.
const DOOR_COLUMNS: [&str; DIRECTION_COUNT] = [
    "door_n", "door_nne", "door_ene", "door_e", "door_ese", "door_sse", "door_s", "door_ssw",
    "door_wsw", "door_w", "door_wnw", "door_nnw", "door_up", "door_down",
];

/// Column list shared by every template query. Order must match
/// [`template_from_row`].
const TEMPLATE_COLUMNS: &str = "id, filename, name, \
    door_n, door_nne, door_ene, door_e, door_ese, door_sse, door_s, door_ssw, \
    door_wsw, door_w, door_wnw, door_nnw, door_up, door_down, \
    default_theme, themes";

/// Active room columns, joined with the library for name and filename.
const ROOM_SELECT: &str = "SELECT r.y, r.template_id, COALESCE(l.name, r.name), \
    COALESCE(l.filename, r.filename), r.doorways, r.themes, r.default_theme \
    FROM active_rooms r LEFT JOIN library_rooms l ON l.id = r.template_id";

const BASE_SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS active_chunks (
        world        TEXT    NOT NULL,
        x            INTEGER NOT NULL,
        z            INTEGER NOT NULL,
        generated_at INTEGER NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS active_chunks_coord
        ON active_chunks (world, x, z);

    CREATE TABLE IF NOT EXISTS room_sets (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        name   TEXT    NOT NULL,
        world  TEXT    NOT NULL,
        x      INTEGER NOT NULL,
        y      INTEGER NOT NULL,
        z      INTEGER NOT NULL,
        size_x INTEGER NOT NULL,
        size_y INTEGER NOT NULL,
        size_z INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS widgets (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL,
        filename      TEXT NOT NULL,
        default_theme TEXT NOT NULL,
        themes        TEXT NOT NULL
    );
";

const ROOM_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS active_rooms (
        world         TEXT    NOT NULL,
        x             INTEGER NOT NULL,
        y             INTEGER NOT NULL,
        z             INTEGER NOT NULL,
        template_id   INTEGER REFERENCES library_rooms (id) ON DELETE SET NULL,
        name          TEXT    NOT NULL,
        filename      TEXT    NOT NULL DEFAULT '',
        doorways      BLOB    NOT NULL,
        themes        TEXT    NOT NULL,
        default_theme TEXT    NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS active_rooms_coord
        ON active_rooms (world, x, y, z);
";

/// Returns the flag column of a direction.
#[inline]
fn door_column(direction: Direction) -> &'static str {
    DOOR_COLUMNS[direction.index()]
}

/// `CREATE TABLE` for the library, one flag column per direction.
fn library_schema() -> String {
    let doors: String = DOOR_COLUMNS
        .iter()
        .map(|column| format!("{column} INTEGER NOT NULL DEFAULT 0,\n"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS library_rooms (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            filename      TEXT NOT NULL UNIQUE,
            name          TEXT NOT NULL,
            {doors}
            default_theme TEXT NOT NULL,
            themes        TEXT NOT NULL
        );"
    )
}

/// ` WHERE door_x = 1 AND ...` for the required set, or nothing.
fn doorway_predicate(required: DoorwaySet) -> String {
    if required.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = required
        .iter()
        .map(|direction| format!("{} = 1", door_column(direction)))
        .collect();
    format!(" WHERE {}", clauses.join(" AND "))
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<TemplateRecord> {
    let mut doorways = DoorwaySet::empty();
    for direction in Direction::ALL {
        let present: bool = row.get(3 + direction.index())?;
        doorways.set(direction, present);
    }
    let default_theme: String = row.get(3 + DIRECTION_COUNT)?;
    let themes: String = row.get(4 + DIRECTION_COUNT)?;
    Ok(TemplateRecord {
        id: TemplateId::from_stored(row.get(0)?),
        filename: row.get(1)?,
        name: row.get(2)?,
        doorways,
        themes: Themes::parse(&themes, &default_theme),
    })
}

/// Builds a room at `chunk` from a [`ROOM_SELECT`] row.
fn room_from_row(chunk: &ChunkKey, row: &Row<'_>) -> rusqlite::Result<Room> {
    let y: u8 = row.get(0)?;
    let template_id: Option<i64> = row.get(1)?;
    let name: String = row.get(2)?;
    let filename: String = row.get(3)?;
    let doorways: Vec<u8> = row.get(4)?;
    let themes: String = row.get(5)?;
    let default_theme: String = row.get(6)?;

    let mut room = Room::new(chunk.room(y));
    room.set_template(template_id.and_then(TemplateId::from_stored), &name, &filename);
    room.set_doorways_raw(&doorways);
    room.set_themes(Themes::parse(&themes, &default_theme));
    room.set_loaded(true);
    Ok(room)
}

fn room_set_from_row(row: &Row<'_>) -> rusqlite::Result<RoomSet> {
    Ok(RoomSet {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        origin: RoomKey::new(
            row.get::<_, String>(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ),
        size_x: row.get(6)?,
        size_y: row.get(7)?,
        size_z: row.get(8)?,
    })
}

fn widget_from_row(row: &Row<'_>) -> rusqlite::Result<Widget> {
    let default_theme: String = row.get(4)?;
    let themes: String = row.get(3)?;
    Ok(Widget {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        filename: row.get(2)?,
        themes: Themes::parse(&themes, &default_theme),
    })
}

/// Seconds since the epoch, saturating.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Upserts one room inside an open connection or transaction.
fn upsert_room(conn: &Connection, room: &Room) -> rusqlite::Result<usize> {
    let key = room.key();
    let raw = room.doorways_raw();
    conn.execute(
        "INSERT INTO active_rooms
             (world, x, y, z, template_id, name, filename, doorways, themes, default_theme)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT (world, x, y, z) DO UPDATE SET
             template_id = excluded.template_id,
             name = excluded.name,
             filename = excluded.filename,
             doorways = excluded.doorways,
             themes = excluded.themes,
             default_theme = excluded.default_theme",
        params![
            key.world,
            key.x,
            key.y,
            key.z,
            room.template_id().map(|id| id.0),
            room.name(),
            room.filename(),
            &raw[..],
            room.themes().joined(),
            room.themes().default_theme(),
        ],
    )
}

/// SQLite implementation of [`RoomStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
    rng: Mutex<ChaCha8Rng>,
    location: String,
}

impl SqliteStore {
    /// Opens (or creates) a store file and ensures the schema.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`] if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let location = path.display().to_string();
        let conn = Connection::open(path).map_err(|e| StoreError::get(e, &location))?;
        Self::from_connection(conn, location)
    }

    /// Opens a private in-memory store.
    ///
    /// # Errors
    ///
    /// [`StoreError::Get`] if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::get(e, ":memory:"))?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> StoreResult<Self> {
        conn.execute_batch(BASE_SCHEMA)
            .and_then(|()| conn.execute_batch(&library_schema()))
            .and_then(|()| conn.execute_batch(ROOM_SCHEMA))
            .map_err(|e| StoreError::get(e, &location))?;

        info!(location = %location, "room store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
            location,
        })
    }

    /// Reseeds the pick RNG, making random picks reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Reseeds the pick RNG in place.
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Where the store lives, for logs.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// One uniform pick among templates matching `required`.
    fn pick(&self, conn: &Connection, required: DoorwaySet) -> StoreResult<Option<TemplateRecord>> {
        let location = format!("random_template {required}");
        let predicate = doorway_predicate(required);

        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM library_rooms{predicate}"),
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::get(e, &location))?;
        if count == 0 {
            return Ok(None);
        }

        let offset = self.rng.lock().gen_range(0..count);
        conn.query_row(
            &format!(
                "SELECT {TEMPLATE_COLUMNS} FROM library_rooms{predicate} \
                 ORDER BY id LIMIT 1 OFFSET ?1"
            ),
            [offset],
            template_from_row,
        )
        .optional()
        .map_err(|e| StoreError::get(e, &location))
    }

    fn template_where(
        &self,
        clause: &str,
        value: &dyn rusqlite::ToSql,
        location: &str,
    ) -> StoreResult<Option<TemplateRecord>> {
        self.conn
            .lock()
            .query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM library_rooms WHERE {clause} = ?1"),
                [value],
                template_from_row,
            )
            .optional()
            .map_err(|e| StoreError::get(e, location))
    }
}

impl RoomStore for SqliteStore {
    fn load_chunk(&self, key: &ChunkKey) -> StoreResult<Option<Chunk>> {
        let location = key.to_string();
        let conn = self.conn.lock();

        let exists = conn
            .query_row(
                "SELECT 1 FROM active_chunks WHERE world = ?1 AND x = ?2 AND z = ?3",
                params![key.world, key.x, key.z],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| StoreError::get(e, &location))?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(&format!(
                "{ROOM_SELECT} WHERE r.world = ?1 AND r.x = ?2 AND r.z = ?3 ORDER BY r.y"
            ))
            .map_err(|e| StoreError::get(e, &location))?;
        let rooms = stmt
            .query_map(params![key.world, key.x, key.z], |row| room_from_row(key, row))
            .and_then(Iterator::collect::<rusqlite::Result<Vec<Room>>>)
            .map_err(|e| StoreError::get(e, &location))?;

        let mut chunk = Chunk::new(key.clone());
        for room in rooms {
            if !chunk.set_room(room) {
                warn!(chunk = %key, "stored room out of range, skipped");
            }
        }
        chunk.modified = false;
        Ok(Some(chunk))
    }

    fn save_chunk(&self, chunk: &Chunk) -> StoreResult<()> {
        let key = chunk.key();
        let location = key.to_string();
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::save(e, &location))?;
        tx.execute(
            "INSERT INTO active_chunks (world, x, z, generated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (world, x, z) DO NOTHING",
            params![key.world, key.x, key.z, unix_now()],
        )
        .map_err(|e| StoreError::save(e, &location))?;

        let mut saved = 0usize;
        for room in chunk.loaded_rooms() {
            upsert_room(&tx, room).map_err(|e| StoreError::save(e, room.key()))?;
            saved += 1;
        }
        tx.commit().map_err(|e| StoreError::save(e, &location))?;

        debug!(chunk = %key, rooms = saved, "chunk saved");
        Ok(())
    }

    fn delete_chunk(&self, key: &ChunkKey) -> StoreResult<()> {
        let location = key.to_string();
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| StoreError::delete(e, &location))?;
        tx.execute(
            "DELETE FROM active_rooms WHERE world = ?1 AND x = ?2 AND z = ?3",
            params![key.world, key.x, key.z],
        )
        .and_then(|_| {
            tx.execute(
                "DELETE FROM active_chunks WHERE world = ?1 AND x = ?2 AND z = ?3",
                params![key.world, key.x, key.z],
            )
        })
        .map_err(|e| StoreError::delete(e, &location))?;
        tx.commit().map_err(|e| StoreError::delete(e, &location))
    }

    fn chunk_exists(&self, key: &ChunkKey) -> StoreResult<bool> {
        let count: i64 = self
            .conn
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM active_chunks WHERE world = ?1 AND x = ?2 AND z = ?3",
                params![key.world, key.x, key.z],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::get(e, key))?;
        Ok(count > 0)
    }

    fn load_room(&self, key: &RoomKey) -> StoreResult<Option<Room>> {
        let chunk = key.chunk();
        self.conn
            .lock()
            .query_row(
                &format!(
                    "{ROOM_SELECT} WHERE r.world = ?1 AND r.x = ?2 AND r.y = ?3 AND r.z = ?4"
                ),
                params![key.world, key.x, key.y, key.z],
                |row| room_from_row(&chunk, row),
            )
            .optional()
            .map_err(|e| StoreError::get(e, key))
    }

    fn save_room(&self, room: &Room) -> StoreResult<()> {
        let conn = self.conn.lock();
        upsert_room(&conn, room).map_err(|e| StoreError::save(e, room.key()))?;
        Ok(())
    }

    fn delete_room(&self, key: &RoomKey) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "DELETE FROM active_rooms WHERE world = ?1 AND x = ?2 AND y = ?3 AND z = ?4",
                params![key.world, key.x, key.y, key.z],
            )
            .map_err(|e| StoreError::delete(e, key))?;
        Ok(())
    }

    fn save_template(&self, template: &TemplateRecord) -> StoreResult<TemplateId> {
        let location = template.filename.clone();
        let conn = self.conn.lock();

        let mut columns = vec!["filename", "name"];
        let mut values = vec![
            Value::Text(template.filename.clone()),
            Value::Text(template.name.clone()),
        ];
        for direction in Direction::ALL {
            columns.push(door_column(direction));
            values.push(Value::Integer(i64::from(template.doorways.contains(direction))));
        }
        columns.push("default_theme");
        values.push(Value::Text(template.themes.default_theme().to_string()));
        columns.push("themes");
        values.push(Value::Text(template.themes.joined()));

        if let Some(id) = template.id {
            columns.push("id");
            values.push(Value::Integer(id.0));
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|column| **column != "id")
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();
        let sql = format!(
            "INSERT INTO library_rooms ({}) VALUES ({}) ON CONFLICT (id) DO UPDATE SET {}",
            columns.join(", "),
            placeholders.join(", "),
            updates.join(", "),
        );

        conn.execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| StoreError::save(e, &location))?;

        let id = template.id.unwrap_or_else(|| TemplateId(conn.last_insert_rowid()));
        debug!(template = %id, filename = %location, doorways = %template.doorways, "template saved");
        Ok(id)
    }

    fn template(&self, id: TemplateId) -> StoreResult<Option<TemplateRecord>> {
        self.template_where("id", &id.0, &format!("template {id}"))
    }

    fn template_by_filename(&self, filename: &str) -> StoreResult<Option<TemplateRecord>> {
        self.template_where("filename", &filename, filename)
    }

    fn delete_template(&self, id: TemplateId) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM library_rooms WHERE id = ?1", [id.0])
            .map_err(|e| StoreError::delete(e, format!("template {id}")))?;
        Ok(())
    }

    fn templates(&self) -> StoreResult<Vec<TemplateRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT {TEMPLATE_COLUMNS} FROM library_rooms ORDER BY id"))
            .map_err(|e| StoreError::get(e, "templates"))?;
        stmt.query_map([], template_from_row)
            .and_then(Iterator::collect)
            .map_err(|e| StoreError::get(e, "templates"))
    }

    fn random_template(&self, required: &[Direction]) -> StoreResult<Option<TemplateRecord>> {
        let required: DoorwaySet = required.iter().copied().collect();
        let conn = self.conn.lock();

        if let Some(template) = self.pick(&conn, required)? {
            return Ok(Some(template));
        }
        if required.is_empty() {
            return Ok(None);
        }

        debug!(required = %required, "no template matches, picking unconstrained");
        self.pick(&conn, DoorwaySet::empty())
    }

    fn save_room_set(&self, set: &RoomSet) -> StoreResult<i64> {
        let location = format!("room set {}", set.name);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO room_sets (id, name, world, x, y, z, size_x, size_y, size_z)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name, world = excluded.world,
                 x = excluded.x, y = excluded.y, z = excluded.z,
                 size_x = excluded.size_x, size_y = excluded.size_y, size_z = excluded.size_z",
            params![
                set.id,
                set.name,
                set.origin.world,
                set.origin.x,
                set.origin.y,
                set.origin.z,
                set.size_x,
                set.size_y,
                set.size_z,
            ],
        )
        .map_err(|e| StoreError::save(e, &location))?;
        Ok(set.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    fn room_set(&self, id: i64) -> StoreResult<Option<RoomSet>> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, name, world, x, y, z, size_x, size_y, size_z
                 FROM room_sets WHERE id = ?1",
                [id],
                room_set_from_row,
            )
            .optional()
            .map_err(|e| StoreError::get(e, format!("room set {id}")))
    }

    fn delete_room_set(&self, id: i64) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM room_sets WHERE id = ?1", [id])
            .map_err(|e| StoreError::delete(e, format!("room set {id}")))?;
        Ok(())
    }

    fn save_widget(&self, widget: &Widget) -> StoreResult<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO widgets (id, name, filename, themes, default_theme)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name, filename = excluded.filename,
                 themes = excluded.themes, default_theme = excluded.default_theme",
            params![
                widget.id,
                widget.name,
                widget.filename,
                widget.themes.joined(),
                widget.themes.default_theme(),
            ],
        )
        .map_err(|e| StoreError::save(e, &widget.filename))?;
        Ok(widget.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    fn widget(&self, id: i64) -> StoreResult<Option<Widget>> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, name, filename, themes, default_theme FROM widgets WHERE id = ?1",
                [id],
                widget_from_row,
            )
            .optional()
            .map_err(|e| StoreError::get(e, format!("widget {id}")))
    }

    fn delete_widget(&self, id: i64) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM widgets WHERE id = ?1", [id])
            .map_err(|e| StoreError::delete(e, format!("widget {id}")))?;
        Ok(())
    }

    fn widgets(&self) -> StoreResult<Vec<Widget>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, filename, themes, default_theme FROM widgets ORDER BY id")
            .map_err(|e| StoreError::get(e, "widgets"))?;
        stmt.query_map([], widget_from_row)
            .and_then(Iterator::collect)
            .map_err(|e| StoreError::get(e, "widgets"))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
