//! Asset descriptors and the reader that loads them.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::trace;

/// One file to embed, as listed in a manifest or on the command line.
///
/// Entries are kept in the order they are supplied; that order is the
/// emission order of the generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetEntry {
    /// Path of the file to embed
    #[serde(rename = "path")]
    pub source_path: PathBuf,
    /// Logical name; the composed symbol is prefix + name + role suffix
    #[serde(rename = "symbol")]
    pub symbol_name: String,
}

impl AssetEntry {
    /// Creates a new asset entry
    pub fn new(source_path: impl Into<PathBuf>, symbol_name: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            symbol_name: symbol_name.into(),
        }
    }

    /// Returns a copy with a relative source path resolved against `base`
    pub fn resolved_against(&self, base: &Path) -> Self {
        if self.source_path.is_absolute() {
            return self.clone();
        }
        Self {
            source_path: base.join(&self.source_path),
            symbol_name: self.symbol_name.clone(),
        }
    }
}

/// The full contents of an asset, read once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBlob {
    symbol_name: String,
    bytes: Vec<u8>,
}

impl AssetBlob {
    /// Creates a blob from bytes already in memory
    pub fn new(symbol_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            bytes,
        }
    }

    /// Logical name of the asset
    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    /// Raw file contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty file
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reads the complete contents of an entry's source file.
pub fn read_asset(entry: &AssetEntry) -> Result<AssetBlob> {
    trace!("Reading {}", entry.source_path.display());
    let bytes =
        std::fs::read(&entry.source_path).map_err(|e| Error::asset_read(&entry.source_path, e))?;
    trace!(
        "Read {} bytes from {}",
        bytes.len(),
        entry.source_path.display()
    );
    Ok(AssetBlob::new(entry.symbol_name.clone(), bytes))
}
