//! Source expansion.
//!
//! Turns the uploads of a request into a flat list of [`FileTask`]s. Plain
//! files map to one task each. ZIP archives are checked against the jobs
//! volume, extracted into their own directory under `jobs/` and replaced by
//! their members; nested archives are expanded up to a depth limit.

use crate::budget::{BudgetPolicy, StorageBudget};
use crate::cleanup::remove_path;
use crate::report::{ConversionLog, Issue};
use crate::task::{FileTask, Upload};
use fileforged_common::paths::is_archive;
use fileforged_common::JobId;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use zip::result::ZipResult;
use zip::ZipArchive;

/// Default nesting limit for archives inside archives.
pub const DEFAULT_MAX_ARCHIVE_DEPTH: u32 = 3;

/// Result of expanding a request's uploads.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Tasks in upload order, archive members in archive order.
    pub tasks: Vec<FileTask>,
    /// Directories created for extracted members; removed at the end of the
    /// request.
    pub extraction_dirs: Vec<PathBuf>,
}

/// Expands uploads for one request.
pub struct Expander<'a> {
    jobs_dir: &'a Path,
    budget: &'a dyn StorageBudget,
    policy: BudgetPolicy,
    job: JobId,
    max_depth: u32,
    next_dir: usize,
}

impl<'a> Expander<'a> {
    pub fn new(
        jobs_dir: &'a Path,
        budget: &'a dyn StorageBudget,
        policy: BudgetPolicy,
        job: JobId,
    ) -> Self {
        Self {
            jobs_dir,
            budget,
            policy,
            job,
            max_depth: DEFAULT_MAX_ARCHIVE_DEPTH,
            next_dir: 1,
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Expand every upload. Problems with individual uploads or archives are
    /// logged and never abort the request.
    pub fn expand(mut self, uploads: &[Upload], log: &mut ConversionLog) -> Expansion {
        let mut expansion = Expansion::default();
        for upload in uploads {
            self.expand_path(&upload.path, &upload.name, 0, &mut expansion, log);
        }
        tracing::debug!(
            "Expanded {} upload(s) into {} task(s)",
            uploads.len(),
            expansion.tasks.len()
        );
        expansion
    }

    fn expand_path(
        &mut self,
        path: &Path,
        name: &str,
        depth: u32,
        out: &mut Expansion,
        log: &mut ConversionLog,
    ) {
        if !path.exists() {
            // Missing uploads were already reported by the guard.
            return;
        }

        if is_archive(path) {
            self.expand_archive(path, name, depth, out, log);
            return;
        }

        match FileTask::from_path(path, name) {
            Ok(task) => out.tasks.push(task),
            Err(e) => log.issue(Issue::MissingUpload, format!("{name}: {e}"), None),
        }
    }

    fn expand_archive(
        &mut self,
        path: &Path,
        name: &str,
        depth: u32,
        out: &mut Expansion,
        log: &mut ConversionLog,
    ) {
        if depth >= self.max_depth {
            remove_path(path);
            log.issue(
                Issue::ArchiveUnreadable,
                format!(
                    "{name}: archives nested more than {} level(s) deep are not expanded",
                    self.max_depth
                ),
                None,
            );
            return;
        }

        let mut archive = match open_archive(path) {
            Ok(archive) => archive,
            Err(e) => {
                remove_path(path);
                log.issue(
                    Issue::ArchiveUnreadable,
                    format!("{name}: cannot open archive: {e}"),
                    None,
                );
                return;
            }
        };

        match declared_size(&mut archive) {
            Some(total) => {
                let available = self.policy.sample(self.budget);
                if total > available {
                    remove_path(path);
                    log.issue(
                        Issue::ArchiveTooLarge,
                        format!(
                            "{name}: needs {total} bytes uncompressed but only {available} bytes are available"
                        ),
                        None,
                    );
                    return;
                }
            }
            None => {
                tracing::warn!(
                    "Member sizes of {:?} are unreadable, extracting without a size check",
                    path
                );
            }
        }

        let dir = self
            .jobs_dir
            .join(format!("{}-x{}", self.job.short(), self.next_dir));
        self.next_dir += 1;

        let members = match extract(&mut archive, &dir) {
            Ok(members) => members,
            Err(e) => {
                remove_path(&dir);
                remove_path(path);
                log.issue(
                    Issue::ArchiveUnreadable,
                    format!("{name}: extraction failed: {e}"),
                    None,
                );
                return;
            }
        };
        drop(archive);

        tracing::info!("Extracted {} member(s) of {:?} into {:?}", members.len(), path, dir);
        out.extraction_dirs.push(dir);
        remove_path(path);

        for (member_path, member_name) in members {
            let display = format!("{name}/{member_name}");
            self.expand_path(&member_path, &display, depth + 1, out, log);
        }
    }
}

fn open_archive(path: &Path) -> ZipResult<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file)
}

/// Sum of declared uncompressed member sizes, `None` if any entry cannot be
/// read.
fn declared_size<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<u64> {
    let mut total: u64 = 0;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).ok()?;
        total = total.saturating_add(entry.size());
    }
    Some(total)
}

/// Extract regular-file members into `dest`. Returns each written path with
/// its archive-relative name.
fn extract<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
) -> ZipResult<Vec<(PathBuf, String)>> {
    fs::create_dir_all(dest)?;

    let mut members = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping archive member with unsafe path {:?}", entry.name());
            continue;
        };
        if relative.starts_with("__MACOSX") {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&target)?;
        io::copy(&mut entry, &mut file)?;

        let name = relative.to_string_lossy().replace('\\', "/");
        members.push((target, name));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::FixedBudget;
    use crate::report::EntryKind;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    struct Dirs {
        _root: tempfile::TempDir,
        uploads: PathBuf,
        jobs: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let jobs = root.path().join("jobs");
        fs::create_dir_all(&uploads).unwrap();
        fs::create_dir_all(&jobs).unwrap();
        Dirs { _root: root, uploads, jobs }
    }

    #[test]
    fn plain_files_become_tasks_in_order() {
        let d = dirs();
        let a = d.uploads.join("a.png");
        let b = d.uploads.join("b.mov");
        fs::write(&a, vec![0u8; 3]).unwrap();
        fs::write(&b, vec![0u8; 5]).unwrap();

        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(u64::MAX), BudgetPolicy::new(0, 1.0), JobId::new())
            .expand(&[Upload::new(&a), Upload::new(&b)], &mut log);

        let names: Vec<_> = expansion.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.mov"]);
        assert_eq!(expansion.tasks[1].size, 5);
        assert!(expansion.extraction_dirs.is_empty());
    }

    #[test]
    fn archive_members_replace_the_archive() {
        let d = dirs();
        let archive = d.uploads.join("batch.zip");
        write_zip(
            &archive,
            &[
                ("photos/one.jpg", b"jpeg-bytes"),
                ("__MACOSX/photos/._one.jpg", b"fork"),
                ("readme.txt", b"hello"),
            ],
        );

        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(u64::MAX), BudgetPolicy::new(0, 1.0), JobId::new())
            .expand(&[Upload::new(&archive)], &mut log);

        assert!(!archive.exists());
        assert_eq!(expansion.extraction_dirs.len(), 1);
        let names: Vec<_> = expansion.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["batch.zip/photos/one.jpg", "batch.zip/readme.txt"]);
        assert_eq!(expansion.tasks[0].size, 10);
        assert_eq!(expansion.tasks[0].extension, "jpg");
        assert!(expansion.tasks.iter().all(|t| t.path.starts_with(&expansion.extraction_dirs[0])));
        assert!(log.is_empty());
    }

    #[test]
    fn oversized_archive_is_dropped() {
        let d = dirs();
        let archive = d.uploads.join("huge.zip");
        write_zip(&archive, &[("a.png", &[0u8; 2048])]);

        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(1_100), BudgetPolicy::new(100, 1.0), JobId::new())
            .expand(&[Upload::new(&archive)], &mut log);

        assert!(expansion.tasks.is_empty());
        assert!(!archive.exists());
        assert_eq!(log.issues(Issue::ArchiveTooLarge).count(), 1);
        assert!(log.render().contains("2048"));
        assert_eq!(fs::read_dir(&d.jobs).unwrap().count(), 0);
    }

    #[test]
    fn corrupt_archive_is_dropped() {
        let d = dirs();
        let archive = d.uploads.join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(u64::MAX), BudgetPolicy::new(0, 1.0), JobId::new())
            .expand(&[Upload::new(&archive)], &mut log);

        assert!(expansion.tasks.is_empty());
        assert!(!archive.exists());
        assert_eq!(log.count(EntryKind::Failed), 1);
        assert_eq!(log.issues(Issue::ArchiveUnreadable).count(), 1);
    }

    #[test]
    fn nested_archives_expand_up_to_the_limit() {
        let d = dirs();
        let inner = zip_bytes(&[("deep.png", b"png")]);
        let archive = d.uploads.join("outer.zip");
        write_zip(&archive, &[("inner.zip", &inner), ("top.png", b"png")]);

        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(u64::MAX), BudgetPolicy::new(0, 1.0), JobId::new())
            .expand(&[Upload::new(&archive)], &mut log);
        let names: Vec<_> = expansion.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["outer.zip/inner.zip/deep.png", "outer.zip/top.png"]);
        assert_eq!(expansion.extraction_dirs.len(), 2);

        let d = dirs();
        let archive = d.uploads.join("outer.zip");
        write_zip(&archive, &[("inner.zip", &inner), ("top.png", b"png")]);
        let mut log = ConversionLog::new();
        let expansion = Expander::new(&d.jobs, &FixedBudget(u64::MAX), BudgetPolicy::new(0, 1.0), JobId::new())
            .with_max_depth(1)
            .expand(&[Upload::new(&archive)], &mut log);
        let names: Vec<_> = expansion.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["outer.zip/top.png"]);
        assert_eq!(log.issues(Issue::ArchiveUnreadable).count(), 1);
    }
}
