//! # CATACOMB Procedural Assembly
//!
//! Builds new chunks out of library rooms so that every doorway meets a
//! doorway on the other side.
//!
//! ## Design Principles
//!
//! 1. **Neighbors decide**: a new room must answer every doorway that an
//!    existing neighbor points at it
//! 2. **Bottom up**: rooms are placed from height 0 to 15, each seeing the
//!    one below it
//! 3. **All or nothing**: a chunk that cannot be completed is never saved
//! 4. **One owner per coordinate**: the cache holds the canonical chunk,
//!    neighbors are resolved by key
//!
//! ## Core Components
//!
//! - `DataManager`: adjacency queries, assembly, load/save with degraded
//!   results
//! - `ChunkCacheManager`: bounded chunk cache, load-or-generate on miss
//! - `CatacombConfig`: TOML configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use catacomb_core::ChunkKey;
//! use catacomb_procedural::{CatacombConfig, ChunkCacheManager};
//!
//! let config = CatacombConfig::load("catacomb.toml")?;
//! let cache = ChunkCacheManager::open(&config)?;
//!
//! match cache.get(&ChunkKey::new("world", 0, 0)) {
//!     Some(chunk) => assert!(chunk.is_complete()),
//!     None => { /* library empty: place a flat layout instead */ }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk_cache;
pub mod config;
pub mod data_manager;
pub mod error;

pub use chunk_cache::ChunkCacheManager;
pub use config::{CatacombConfig, ConfigError};
pub use data_manager::{AdjacentDoorways, DataManager, NeighborLookup};
pub use error::AssemblyError;
