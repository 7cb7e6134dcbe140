//! Resource embedding compiler.
//!
//! Turns an ordered list of [`AssetEntry`] values into a pair of C++
//! artifacts sharing one base name:
//!
//! - `<name>.cpp` includes `<name>.hpp` and defines, per entry, an
//!   `unsigned char const <prefix><Symbol>Data[]` array and an
//!   `unsigned int const <prefix><Symbol>Size` constant.
//! - `<name>.hpp` carries `#pragma once` and the matching `extern`
//!   declarations, so it can be included without the definitions.
//!
//! ## Pipeline
//!
//! 1. Validate the base name, then compose and validate every symbol name
//!    (no file is touched yet)
//! 2. Read all assets with [`read_asset`]
//! 3. Render both bodies in input order
//!
//! Any failure aborts the whole compilation; nothing is written until the
//! caller hands the finished [`EmbedOutput`] to [`EmbedOutput::write_to`].

mod asset;
mod format;

use crate::error::{Error, Result};
use crate::output::{write_artifacts, Artifact};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use asset::{read_asset, AssetBlob, AssetEntry};
pub use format::{format_byte_array, INDENT};

/// Prefix used by the consuming application for embedded globals
pub const DEFAULT_PREFIX: &str = "G";

/// Octets per initializer line
pub const DEFAULT_BYTES_PER_LINE: usize = 16;

/// Suffix of the array symbol
pub const DATA_SUFFIX: &str = "Data";

/// Suffix of the size symbol
pub const SIZE_SUFFIX: &str = "Size";

/// Configuration for the embedding compiler
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Prefix prepended to every symbol name
    pub prefix: String,
    /// Octets per initializer line (0 = single line)
    pub bytes_per_line: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
        }
    }
}

impl EmbedConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the symbol prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the number of octets per initializer line
    pub fn bytes_per_line(mut self, n: usize) -> Self {
        self.bytes_per_line = n;
        self
    }

    /// Composes the data and size symbols for a logical name
    pub fn compose(&self, symbol_name: &str) -> SymbolNames {
        SymbolNames {
            data: format!("{}{}{}", self.prefix, symbol_name, DATA_SUFFIX),
            size: format!("{}{}{}", self.prefix, symbol_name, SIZE_SUFFIX),
        }
    }
}

/// The pair of globals emitted for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNames {
    /// Name of the byte array
    pub data: String,
    /// Name of the size constant
    pub size: String,
}

/// Generated sources for one compilation, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOutput {
    base_name: String,
    /// Contents of `<name>.cpp`
    pub implementation: String,
    /// Contents of `<name>.hpp`
    pub declaration: String,
    /// Number of embedded assets
    pub asset_count: usize,
    /// Sum of all embedded asset sizes
    pub total_bytes: usize,
}

impl EmbedOutput {
    /// Base name shared by both artifacts
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// File name of the implementation artifact
    pub fn implementation_file_name(&self) -> String {
        format!("{}.cpp", self.base_name)
    }

    /// File name of the declaration artifact
    pub fn declaration_file_name(&self) -> String {
        format!("{}.hpp", self.base_name)
    }

    /// Both artifacts with their destinations inside `dir`
    pub fn artifacts(&self, dir: &Path) -> [Artifact; 2] {
        [
            Artifact::new(
                dir.join(self.implementation_file_name()),
                self.implementation.as_bytes(),
            ),
            Artifact::new(
                dir.join(self.declaration_file_name()),
                self.declaration.as_bytes(),
            ),
        ]
    }

    /// Writes both artifacts into `dir` and returns their paths
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let artifacts = self.artifacts(dir);
        write_artifacts(&artifacts)?;
        Ok(artifacts.into_iter().map(|a| a.path).collect())
    }
}

/// Compiles asset entries into an implementation/declaration pair
#[derive(Debug, Clone, Default)]
pub struct ResourceCompiler {
    config: EmbedConfig,
}

impl ResourceCompiler {
    /// Creates a new compiler with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new compiler with custom configuration
    pub fn with_config(config: EmbedConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Compiles `entries` into sources for `<base_name>.cpp` / `<base_name>.hpp`.
    pub fn compile(&self, base_name: &str, entries: &[AssetEntry]) -> Result<EmbedOutput> {
        check_base_name(base_name)?;
        let symbols = self.check_symbols(entries)?;

        let blobs = entries
            .iter()
            .map(read_asset)
            .collect::<Result<Vec<_>>>()?;

        let mut implementation = format!("#include \"{}.hpp\"\n", base_name);
        let mut declaration = String::from("#pragma once\n");
        let mut total_bytes = 0;

        for ((entry, blob), names) in entries.iter().zip(&blobs).zip(&symbols) {
            if blob.is_empty() {
                warn!(
                    "{} is empty; {} will be a zero-length array",
                    entry.source_path.display(),
                    names.data
                );
            }
            debug!(
                "Embedding {} as {} ({} bytes)",
                entry.source_path.display(),
                names.data,
                blob.len()
            );

            implementation.push('\n');
            self.write_definition(&mut implementation, names, blob)
                .expect("String write cannot fail");
            declaration.push('\n');
            write_declaration(&mut declaration, names).expect("String write cannot fail");

            total_bytes += blob.len();
        }

        info!(
            "Compiled {} assets ({} bytes) into {}",
            blobs.len(),
            total_bytes,
            base_name
        );

        Ok(EmbedOutput {
            base_name: base_name.to_string(),
            implementation,
            declaration,
            asset_count: blobs.len(),
            total_bytes,
        })
    }

    /// Composes every symbol and rejects invalid or colliding names
    fn check_symbols(&self, entries: &[AssetEntry]) -> Result<Vec<SymbolNames>> {
        let mut claimed: HashMap<String, &Path> = HashMap::new();
        let mut all = Vec::with_capacity(entries.len());

        for entry in entries {
            let names = self.config.compose(&entry.symbol_name);
            for symbol in [&names.data, &names.size] {
                if !is_c_identifier(symbol) {
                    return Err(Error::invalid_symbol(symbol.as_str()));
                }
                if let Some(first) = claimed.insert(symbol.clone(), &entry.source_path) {
                    return Err(Error::duplicate_symbol(
                        symbol.as_str(),
                        first,
                        &entry.source_path,
                    ));
                }
            }
            all.push(names);
        }

        Ok(all)
    }

    fn write_definition(
        &self,
        w: &mut impl FmtWrite,
        names: &SymbolNames,
        blob: &AssetBlob,
    ) -> std::fmt::Result {
        writeln!(w, "unsigned char const {}[] = {{", names.data)?;
        let body = format_byte_array(blob.as_bytes(), self.config.bytes_per_line);
        if !body.is_empty() {
            writeln!(w, "{}", body)?;
        }
        writeln!(w, "}};")?;
        writeln!(w, "unsigned int const {} = {};", names.size, blob.len())
    }
}

/// Rejects base names that would leave the output directory or break the
/// `#include "<name>.hpp"` line
fn check_base_name(name: &str) -> Result<()> {
    let bad_char = |c: char| matches!(c, '/' | '\\' | '"') || c.is_control();
    if name.is_empty() || name == "." || name == ".." || name.contains(bad_char) {
        return Err(Error::invalid_base_name(name));
    }
    Ok(())
}

fn write_declaration(w: &mut impl FmtWrite, names: &SymbolNames) -> std::fmt::Result {
    writeln!(w, "extern unsigned char const {}[];", names.data)?;
    writeln!(w, "extern unsigned int const {};", names.size)
}

/// Returns true if `s` matches `[A-Za-z_][A-Za-z0-9_]*`
fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
