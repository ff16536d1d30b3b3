//! # Store Error Types
//!
//! Failures are split by intent so callers can pick a recovery policy:
//! a failed save is retried differently from a failed read. Every variant
//! carries a reason and the location that was being accessed (coordinate,
//! filename or operation name).
//!
//! "Not found" is not an error. Lookups return `Ok(None)`.

use thiserror::Error;

/// Errors that can occur in the room library store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading from the store failed.
    #[error("get failed at {location}: {reason}")]
    Get {
        /// What went wrong.
        reason: String,
        /// What was being read.
        location: String,
    },

    /// Writing to the store failed.
    #[error("save failed at {location}: {reason}")]
    Save {
        /// What went wrong.
        reason: String,
        /// What was being written.
        location: String,
    },

    /// Deleting from the store failed.
    #[error("delete failed at {location}: {reason}")]
    Delete {
        /// What went wrong.
        reason: String,
        /// What was being deleted.
        location: String,
    },

    /// Encoding or decoding a template file failed.
    #[error("asset failure at {location}: {reason}")]
    Asset {
        /// What went wrong.
        reason: String,
        /// The file involved.
        location: String,
    },
}

impl StoreError {
    /// Builds a [`StoreError::Get`].
    pub fn get(reason: impl ToString, location: impl ToString) -> Self {
        Self::Get {
            reason: reason.to_string(),
            location: location.to_string(),
        }
    }

    /// Builds a [`StoreError::Save`].
    pub fn save(reason: impl ToString, location: impl ToString) -> Self {
        Self::Save {
            reason: reason.to_string(),
            location: location.to_string(),
        }
    }

    /// Builds a [`StoreError::Delete`].
    pub fn delete(reason: impl ToString, location: impl ToString) -> Self {
        Self::Delete {
            reason: reason.to_string(),
            location: location.to_string(),
        }
    }

    /// Builds a [`StoreError::Asset`].
    pub fn asset(reason: impl ToString, location: impl ToString) -> Self {
        Self::Asset {
            reason: reason.to_string(),
            location: location.to_string(),
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Get { reason, .. }
            | Self::Save { reason, .. }
            | Self::Delete { reason, .. }
            | Self::Asset { reason, .. } => reason,
        }
    }

    /// What was being accessed.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Get { location, .. }
            | Self::Save { location, .. }
            | Self::Delete { location, .. }
            | Self::Asset { location, .. } => location,
        }
    }

    /// Short name of the failure kind, for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Save { .. } => "save",
            Self::Delete { .. } => "delete",
            Self::Asset { .. } => "asset",
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_and_location() {
        let err = StoreError::save("disk full", "test@0,3,0");
        assert_eq!(err.reason(), "disk full");
        assert_eq!(err.location(), "test@0,3,0");
        assert_eq!(err.kind(), "save");
        assert_eq!(err.to_string(), "save failed at test@0,3,0: disk full");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            StoreError::get("r", "l"),
            StoreError::save("r", "l"),
            StoreError::delete("r", "l"),
            StoreError::asset("r", "l"),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
