//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! database_path = "catacomb.db"
//! library_dir = "library"
//! chunk_cache_capacity = 256
//! schematic_cache_capacity = 128
//! seed = 12345
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML was malformed or had wrong value types.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatacombConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory template files are resolved against.
    pub library_dir: PathBuf,
    /// Chunks kept in memory.
    pub chunk_cache_capacity: usize,
    /// Decoded template payloads kept in memory.
    pub schematic_cache_capacity: usize,
    /// Seed for template picks. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for CatacombConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("catacomb.db"),
            library_dir: PathBuf::from("library"),
            chunk_cache_capacity: 256,
            schematic_cache_capacity: 128,
            seed: None,
        }
    }
}

impl CatacombConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] on a zero cache capacity.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`CatacombConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.schematic_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "schematic_cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(CatacombConfig::from_toml_str("").unwrap(), CatacombConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = CatacombConfig::from_toml_str(
            r#"
            database_path = "/var/lib/catacomb/world.db"
            library_dir = "/srv/rooms"
            chunk_cache_capacity = 64
            schematic_cache_capacity = 32
            seed = 99
            "#,
        )
        .unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/srv/rooms"));
        assert_eq!(config.chunk_cache_capacity, 64);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            CatacombConfig::from_toml_str("chunk_cache_capacity = 0"),
            Err(ConfigError::Invalid { field: "chunk_cache_capacity", .. })
        ));
        assert!(matches!(
            CatacombConfig::from_toml_str("seed = \"abc\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CatacombConfig::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CatacombConfig::load("/nonexistent/catacomb.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
