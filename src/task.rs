//! Units of work flowing through a request.

use fileforged_common::paths::extension_of;
use std::io;
use std::path::{Path, PathBuf};

/// A file named by the caller as part of a conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: PathBuf,
    /// Name shown in the log, usually the original filename.
    pub name: String,
}

impl Upload {
    /// Upload displayed under its own file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }

    pub fn named(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// One concrete file to convert, produced by expanding uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Size in bytes, measured on disk when the task was created.
    pub size: u64,
    /// Lowercased extension without the dot.
    pub extension: String,
    /// Name shown in the log. Archive members are shown as
    /// `archive.zip/member/path`.
    pub name: String,
}

impl FileTask {
    /// Build a task from an existing regular file.
    pub fn from_path(path: impl Into<PathBuf>, name: impl Into<String>) -> io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{path:?} is not a regular file"),
            ));
        }
        Ok(Self {
            extension: extension_of(&path),
            size: metadata.len(),
            name: name.into(),
            path,
        })
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
