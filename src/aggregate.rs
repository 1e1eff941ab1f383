//! Result aggregation.
//!
//! A request hands back at most one file: the single converted output, or a
//! ZIP bundling all of them.

use crate::cleanup::remove_path;
use crate::error::RequestError;
use crate::report::{ConversionLog, Issue};
use crate::task::display_name;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Collapse `outputs` into the single file handed back to the caller.
///
/// With more than one output the files are bundled into `archive_path` and
/// deleted as they are written. If bundling fails the partial archive is
/// removed and the remaining outputs are left for the caller to clean up.
pub fn aggregate(
    mut outputs: Vec<PathBuf>,
    archive_path: &Path,
    log: &mut ConversionLog,
) -> Result<Option<PathBuf>, RequestError> {
    match outputs.len() {
        0 => {
            log.issue(
                Issue::NoOutputsProduced,
                "no file could be converted",
                None,
            );
            Ok(None)
        }
        1 => Ok(outputs.pop()),
        count => {
            if let Err(e) = bundle(&outputs, archive_path) {
                remove_path(archive_path);
                return Err(e.into());
            }
            log.info(format!(
                "{count} outputs bundled into {}",
                display_name(archive_path)
            ));
            Ok(Some(archive_path.to_path_buf()))
        }
    }
}

fn bundle(outputs: &[PathBuf], archive_path: &Path) -> ZipResult<()> {
    let mut zip = ZipWriter::new(File::create(archive_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();

    for output in outputs {
        let name = unique_entry_name(&display_name(output), &mut used);
        zip.start_file(name, options)?;
        let mut file = File::open(output)?;
        io::copy(&mut file, &mut zip)?;
        drop(file);
        remove_path(output);
    }

    zip.finish()?;
    Ok(())
}

/// `name`, or `name` with a numeric suffix before the extension when it is
/// already taken.
fn unique_entry_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::EntryKind;
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn no_outputs_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ConversionLog::new();
        let result = aggregate(Vec::new(), &dir.path().join("x.zip"), &mut log).unwrap();
        assert!(result.is_none());
        assert_eq!(log.count(EntryKind::Info), 1);
        assert_eq!(log.issues(Issue::NoOutputsProduced).count(), 1);
    }

    #[test]
    fn single_output_is_returned_directly() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.jpg");
        fs::write(&out, b"jpeg").unwrap();
        let archive = dir.path().join("x.zip");

        let result = aggregate(vec![out.clone()], &archive, &mut ConversionLog::new()).unwrap();
        assert_eq!(result, Some(out.clone()));
        assert!(out.exists());
        assert!(!archive.exists());
    }

    #[test]
    fn many_outputs_are_bundled_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();
        let archive_path = dir.path().join("job-converted.zip");

        let result = aggregate(vec![a.clone(), b.clone()], &archive_path, &mut ConversionLog::new())
            .unwrap();
        assert_eq!(result, Some(archive_path.clone()));
        assert!(!a.exists());
        assert!(!b.exists());

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive.by_name("b.jpg").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn entry_names_are_unique() {
        let mut used = HashSet::new();
        assert_eq!(unique_entry_name("a.jpg", &mut used), "a.jpg");
        assert_eq!(unique_entry_name("a.jpg", &mut used), "a-2.jpg");
        assert_eq!(unique_entry_name("a.jpg", &mut used), "a-3.jpg");
        assert_eq!(unique_entry_name("README", &mut used), "README");
        assert_eq!(unique_entry_name("README", &mut used), "README-2");
    }

    #[test]
    fn failed_bundle_removes_partial_archive() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        fs::write(&a, b"first").unwrap();
        let archive_path = dir.path().join("job-converted.zip");

        let result = aggregate(
            vec![a, dir.path().join("missing.jpg")],
            &archive_path,
            &mut ConversionLog::new(),
        );
        assert!(result.is_err());
        assert!(!archive_path.exists());
    }
}
