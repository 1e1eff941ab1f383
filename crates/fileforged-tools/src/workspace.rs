//! Scratch workspace management for conversions.
//!
//! Some converters cannot write to a caller-chosen path: LibreOffice keeps
//! the input's file name, pdftoppm appends its own extension, magick splits
//! multi-frame sources into numbered files, and the camera path needs an
//! intermediate raster. A [`Workspace`] gives such a conversion
//! a private directory and moves the produced file to its final location.
//! The directory is deleted when the workspace is dropped, whatever the
//! outcome.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Private scratch directory for one conversion.
///
/// # Example
///
/// ```no_run
/// use fileforged_tools::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new_in(Path::new("/data/jobs"), "render-")?;
/// // ... let a tool write into workspace.path() ...
/// if let Some(pdf) = workspace.find_produced("pdf")? {
///     workspace.deliver(&pdf, Path::new("/data/outputs/report.pdf"))?;
/// }
/// # Ok::<(), fileforged_tools::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace directory inside `parent`, named `<prefix><random>`.
    pub fn new_in(parent: &Path, prefix: &str) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| {
                Error::Workspace(format!(
                    "failed to create scratch dir in {}: {e}",
                    parent.display()
                ))
            })?;

        Ok(Self { temp_dir })
    }

    /// Get the workspace directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// First regular file (by name) in the workspace with the given extension.
    pub fn find_produced(&self, extension: &str) -> Result<Option<PathBuf>> {
        let mut candidates = Vec::new();

        for entry in std::fs::read_dir(self.path())? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                candidates.push(path);
            }
        }

        candidates.sort();
        Ok(candidates.into_iter().next())
    }

    /// Move a produced file out of the workspace to `destination`.
    pub fn deliver(&self, produced: &Path, destination: &Path) -> Result<PathBuf> {
        if !produced.exists() {
            return Err(Error::file_not_found(produced));
        }

        move_file(produced, destination).map_err(|e| {
            Error::Workspace(format!(
                "failed to move {} to {}: {e}",
                produced.display(),
                destination.display()
            ))
        })?;

        Ok(destination.to_path_buf())
    }
}

/// Move a file, falling back to copy + remove across filesystems.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    std::fs::copy(from, to)?;
    if let Err(e) = std::fs::remove_file(from) {
        #[cfg(feature = "tracing")]
        tracing::warn!("Copied {:?} but could not remove the original: {}", from, e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn workspace_lives_in_parent() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path(), "render-").unwrap();

        assert!(ws.path().starts_with(parent.path()));
        let name = ws.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("render-"));
        assert!(ws.temp_file("page.png").starts_with(ws.path()));
    }

    #[test]
    fn directory_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path(), "x-").unwrap();
        let dir = ws.path().to_path_buf();
        fs::write(ws.temp_file("leftover.tmp"), b"data").unwrap();

        drop(ws);
        assert!(!dir.exists());
    }

    #[test]
    fn find_produced_matches_extension_case_insensitively() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path(), "x-").unwrap();
        fs::write(ws.temp_file("notes.txt"), b"log").unwrap();
        fs::write(ws.temp_file("Report.PDF"), b"%PDF").unwrap();

        let found = ws.find_produced("pdf").unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "Report.PDF");
        assert!(ws.find_produced("png").unwrap().is_none());
    }

    #[test]
    fn deliver_moves_file() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path(), "x-").unwrap();
        let produced = ws.temp_file("out.pdf");
        fs::write(&produced, b"%PDF-1.7").unwrap();

        let dest = parent.path().join("final.pdf");
        let delivered = ws.deliver(&produced, &dest).unwrap();

        assert_eq!(delivered, dest);
        assert!(!produced.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn deliver_fails_when_output_missing() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path(), "x-").unwrap();
        let result = ws.deliver(&ws.temp_file("missing.pdf"), &parent.path().join("a.pdf"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn move_file_renames() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.bin");
        let to = dir.path().join("b.bin");
        fs::write(&from, b"payload").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"payload");
    }
}
