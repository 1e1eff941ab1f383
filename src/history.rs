//! Listing of recently produced outputs.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct OutputEntry {
    pub name: String,
    pub modified: DateTime<Local>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl OutputEntry {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// The `limit` most recently modified files in `dir`, newest first.
///
/// A missing directory yields an empty list.
pub fn list_outputs(dir: &Path, limit: usize) -> io::Result<Vec<OutputEntry>> {
    let reader = match std::fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        entries.push(OutputEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: DateTime::<Local>::from(metadata.modified()?),
            size_bytes: metadata.len(),
            path: entry.path(),
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(limit);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    fn touch(dir: &Path, name: &str, age_secs: u64, size: usize) {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn newest_first_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "old.pdf", 300, 10);
        touch(dir.path(), "new.jpg", 10, 2048);
        touch(dir.path(), "mid.zip", 100, 10);
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let entries = list_outputs(dir.path(), 2).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["new.jpg", "mid.zip"]);
        assert_eq!(entries[0].size_kb(), 2.0);
    }

    #[test]
    fn missing_directory_is_empty() {
        assert!(list_outputs(Path::new("/nonexistent/fileforged/outputs"), 10)
            .unwrap()
            .is_empty());
    }
}
