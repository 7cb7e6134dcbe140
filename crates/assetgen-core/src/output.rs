//! Atomic artifact writing.
//!
//! A run's artifacts are staged as temporary files next to their
//! destinations and only renamed into place once every one of them has been
//! written and flushed. A failure while staging leaves all destinations
//! untouched.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// A generated file waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Destination path
    pub path: PathBuf,
    /// Complete file contents
    pub contents: Vec<u8>,
}

impl Artifact {
    /// Creates a new artifact
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Writes all artifacts, replacing whatever exists at their paths.
///
/// Missing parent directories are created.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<()> {
    let mut staged = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let dir = parent_dir(&artifact.path);
        std::fs::create_dir_all(dir).map_err(|e| Error::directory_create(dir, e))?;

        let mut tmp = staging_file(dir, &artifact.path)
            .map_err(|e| Error::file_write(&artifact.path, e))?;
        tmp.write_all(&artifact.contents)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::file_write(&artifact.path, e))?;

        debug!(
            "Staged {} ({} bytes) at {}",
            artifact.path.display(),
            artifact.contents.len(),
            tmp.path().display()
        );
        staged.push((tmp, &artifact.path));
    }

    for (tmp, path) in staged {
        tmp.persist(path)
            .map_err(|e| Error::file_write(path, e.error))?;
        debug!("Wrote {}", path.display());
    }

    Ok(())
}

/// Creates the temporary file that will replace `dest`.
///
/// New artifacts get the same mode a plain create would (0666 minus the
/// umask); an existing destination keeps its permissions.
fn staging_file(dir: &Path, dest: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir)?;

    if let Ok(existing) = std::fs::metadata(dest) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    Ok(tmp)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Source").join("Gui").join("Assets.cpp");

        write_artifacts(&[Artifact::new(&path, "int x;\n")]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "int x;\n");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Assets.hpp");
        std::fs::write(&path, "old contents that are longer").unwrap();

        write_artifacts(&[Artifact::new(&path, "new")]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn test_new_artifact_has_default_mode() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.txt");
        std::fs::write(&plain, "x").unwrap();
        let path = dir.path().join("Assets.cpp");

        write_artifacts(&[Artifact::new(&path, "x")]).unwrap();
        assert_eq!(mode(&path), mode(&plain));
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BuiltinProtocolDB.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_artifacts(&[Artifact::new(&path, "{\n}")]).unwrap();
        assert_eq!(mode(&path), 0o640);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n}");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        write_artifacts(&[
            Artifact::new(dir.path().join("a.cpp"), "a"),
            Artifact::new(dir.path().join("a.hpp"), "b"),
        ])
        .unwrap();

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.cpp", "a.hpp"]);
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("Assets.cpp")), Path::new("."));
        assert_eq!(parent_dir(Path::new("out/Assets.cpp")), Path::new("out"));
    }
}
