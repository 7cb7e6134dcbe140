//! Error types for the assetgen-core library.
//!
//! Every fatal condition of a generator run is a variant of [`Error`]. None of
//! them are recoverable mid-run: the generators return before writing any
//! artifact. Malformed registry lines are not errors at all and never show up
//! here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for assetgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all assetgen operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An asset listed for embedding could not be read
    #[error("failed to read asset '{path}': {source}")]
    AssetRead {
        /// Path of the asset
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Two entries compose to the same symbol name
    #[error("duplicate symbol '{symbol}' (from '{first}' and '{second}')")]
    DuplicateSymbol {
        /// The composed symbol name
        symbol: String,
        /// Source path of the entry that claimed the symbol first
        first: PathBuf,
        /// Source path of the colliding entry
        second: PathBuf,
    },

    /// A composed symbol name is not a valid C identifier
    #[error("invalid symbol name '{symbol}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidSymbol {
        /// The offending composed name
        symbol: String,
    },

    /// The artifact base name cannot be used as a file name and include path
    #[error("invalid artifact base name '{name}': must be a plain file name without quotes or path separators")]
    InvalidBaseName {
        /// The offending base name
        name: String,
    },

    /// The service registry could not be opened or read
    #[error("service registry '{path}' is unavailable: {source}")]
    RegistryUnavailable {
        /// Path of the registry file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an asset manifest
    #[error("failed to read manifest '{path}': {source}")]
    ManifestRead {
        /// Path of the manifest
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An asset manifest is not valid TOML or misses required keys
    #[error("invalid manifest '{path}': {message}")]
    ManifestParse {
        /// Path of the manifest
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Failed to write an output artifact
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a structured document
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new asset read error
    pub fn asset_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AssetRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new duplicate symbol error
    pub fn duplicate_symbol(
        symbol: impl Into<String>,
        first: impl Into<PathBuf>,
        second: impl Into<PathBuf>,
    ) -> Self {
        Self::DuplicateSymbol {
            symbol: symbol.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Creates a new invalid symbol error
    pub fn invalid_symbol(symbol: impl Into<String>) -> Self {
        Self::InvalidSymbol {
            symbol: symbol.into(),
        }
    }

    /// Creates a new invalid base name error
    pub fn invalid_base_name(name: impl Into<String>) -> Self {
        Self::InvalidBaseName { name: name.into() }
    }

    /// Creates a new registry unavailable error
    pub fn registry_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RegistryUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Creates a new manifest read error
    pub fn manifest_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ManifestRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new manifest parse error
    pub fn manifest_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error was caused by the generator's inputs
    /// rather than by writing its outputs
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::AssetRead { .. }
                | Self::DuplicateSymbol { .. }
                | Self::InvalidSymbol { .. }
                | Self::InvalidBaseName { .. }
                | Self::RegistryUnavailable { .. }
                | Self::ManifestRead { .. }
                | Self::ManifestParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_symbol("GFontData", "a.ttf", "b.ttf");
        let msg = err.to_string();
        assert!(msg.contains("GFontData"));
        assert!(msg.contains("a.ttf"));
        assert!(msg.contains("b.ttf"));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::registry_unavailable("/etc/services", io);
        assert!(err.to_string().contains("/etc/services"));
    }

    #[test]
    fn test_is_input_error() {
        assert!(Error::invalid_symbol("1bad").is_input_error());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::file_write("/out/Assets.cpp", io).is_input_error());
    }
}
