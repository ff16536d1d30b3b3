//! # CATACOMB Store
//!
//! Durable side of the room engine: the room library, the active world
//! records and the template files rooms are stamped from.
//!
//! ## Design Principles
//!
//! 1. **Not found is not a failure** - lookups return `Ok(None)`
//! 2. **Closed SQL** - doorway predicates come from a fixed column table
//! 3. **One writer** - the backend serializes every statement sequence
//! 4. **Decode once** - template payloads are shared through a bounded cache
//!
//! ## Example
//!
//! ```rust
//! use catacomb_core::{Direction, DoorwaySet, TemplateRecord};
//! use catacomb_store::{RoomStore, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory()?.with_seed(42);
//! store.save_template(&TemplateRecord::new(
//!     "stair.room",
//!     "Stair",
//!     DoorwaySet::of(&[Direction::N, Direction::Down]),
//! ))?;
//!
//! let picked = store.random_template(&[Direction::N])?;
//! assert_eq!(picked.map(|t| t.filename), Some("stair.room".to_string()));
//! # Ok::<(), catacomb_store::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod schematic;
pub mod schematic_cache;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use schematic::RoomSchematic;
pub use schematic_cache::SchematicCache;
pub use sqlite::SqliteStore;
pub use store::RoomStore;
