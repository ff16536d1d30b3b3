//! # Assembly Errors
//!
//! Both variants mean the same thing to the caller: the chunk has no rooms
//! and nothing was persisted. The caller picks the fallback layout.

use catacomb_core::ChunkKey;
use catacomb_store::StoreError;
use thiserror::Error;

/// Why a new chunk could not be assembled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// The library had no template at all for a room slot.
    #[error("no rooms available for {chunk} at height {height}")]
    NoRoomsAvailable {
        /// Chunk being assembled.
        chunk: ChunkKey,
        /// Room slot that could not be filled.
        height: u8,
    },

    /// The store or a template file failed mid-assembly.
    #[error("assembly of {chunk} aborted: {source}")]
    Store {
        /// Chunk being assembled.
        chunk: ChunkKey,
        /// Underlying failure.
        #[source]
        source: StoreError,
    },
}

impl AssemblyError {
    /// Chunk the failure belongs to.
    #[must_use]
    pub fn chunk(&self) -> &ChunkKey {
        match self {
            Self::NoRoomsAvailable { chunk, .. } | Self::Store { chunk, .. } => chunk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_chunk() {
        let chunk = ChunkKey::new("test", 1, -2);
        let err = AssemblyError::NoRoomsAvailable {
            chunk: chunk.clone(),
            height: 4,
        };
        assert_eq!(err.to_string(), "no rooms available for test@1,-2 at height 4");

        let err = AssemblyError::Store {
            chunk: chunk.clone(),
            source: StoreError::get("locked", "random_template {}"),
        };
        assert!(err.to_string().contains("get failed at random_template {}"));
        assert_eq!(err.chunk(), &chunk);
    }
}
