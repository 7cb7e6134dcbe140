//! TOML manifest describing an embedding run.
//!
//! ```toml
//! [output]
//! directory = "../Source/Gui"
//! name = "Assets"
//! prefix = "G"
//! bytes_per_line = 16
//!
//! [[asset]]
//! path = "../Thirdparty/jetbrains-mono/JetBrainsMono-Regular.ttf"
//! symbol = "Font"
//! ```
//!
//! Relative paths are resolved against the directory containing the
//! manifest. Every key of `[output]` is optional.

use crate::embed::{AssetEntry, EmbedConfig, DEFAULT_BYTES_PER_LINE, DEFAULT_PREFIX};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base name used when a manifest does not name its artifacts
pub const DEFAULT_BASE_NAME: &str = "Assets";

/// Where and how the artifacts are written
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Output directory
    pub directory: PathBuf,
    /// Base name shared by the `.cpp` and `.hpp` artifacts
    pub name: String,
    /// Symbol prefix
    pub prefix: String,
    /// Octets per initializer line (0 = single line)
    pub bytes_per_line: usize,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            name: DEFAULT_BASE_NAME.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
        }
    }
}

/// A parsed asset manifest
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Output settings
    #[serde(default)]
    pub output: OutputSection,
    /// Assets in emission order
    #[serde(default, rename = "asset")]
    pub assets: Vec<AssetEntry>,
}

impl Manifest {
    /// Loads a manifest and resolves its relative paths
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::manifest_read(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let manifest = Self::parse(&contents, path)?.resolved_against(base);
        debug!(
            "Loaded manifest {} ({} assets)",
            path.display(),
            manifest.assets.len()
        );
        Ok(manifest)
    }

    /// Parses manifest text; `origin` is only used in error messages
    pub fn parse(contents: &str, origin: impl AsRef<Path>) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::manifest_parse(origin.as_ref(), e.message()))
    }

    /// Returns a copy with every relative path joined onto `base`
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if self.output.directory.is_relative() {
            self.output.directory = base.join(&self.output.directory);
        }
        self.assets = self
            .assets
            .iter()
            .map(|entry| entry.resolved_against(base))
            .collect();
        self
    }

    /// Compiler configuration derived from `[output]`
    pub fn embed_config(&self) -> EmbedConfig {
        EmbedConfig::new()
            .prefix(self.output.prefix.clone())
            .bytes_per_line(self.output.bytes_per_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[output]
directory = "../Source/Gui"
name = "Assets"
bytes_per_line = 0

[[asset]]
path = "../Thirdparty/cereal/LICENSE.txt"
symbol = "CerealLicense"

[[asset]]
path = "./I18n/de_DE.json"
symbol = "de_DE"
"#;

    #[test]
    fn test_parse() {
        let manifest = Manifest::parse(SAMPLE, "assets.toml").unwrap();
        assert_eq!(manifest.output.name, "Assets");
        assert_eq!(manifest.output.prefix, "G");
        assert_eq!(manifest.output.bytes_per_line, 0);
        assert_eq!(
            manifest.assets,
            vec![
                AssetEntry::new("../Thirdparty/cereal/LICENSE.txt", "CerealLicense"),
                AssetEntry::new("./I18n/de_DE.json", "de_DE"),
            ]
        );
    }

    #[test]
    fn test_defaults() {
        let manifest = Manifest::parse("", "empty.toml").unwrap();
        assert_eq!(manifest.output, OutputSection::default());
        assert!(manifest.assets.is_empty());
        assert_eq!(manifest.embed_config().bytes_per_line, DEFAULT_BYTES_PER_LINE);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Manifest::parse("[[asset]]\npath = \"a\"\nsymbol = \"A\"\nname = \"x\"\n", "m.toml")
            .unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
        assert!(err.to_string().contains("m.toml"));
    }

    #[test]
    fn test_load_resolves_paths() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("Meta");
        std::fs::create_dir(&meta).unwrap();
        let path = meta.join("assets.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.output.directory, meta.join("../Source/Gui"));
        assert_eq!(
            manifest.assets[1].source_path,
            meta.join("./I18n/de_DE.json")
        );
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, Error::ManifestRead { .. }));
    }
}
