//! Conversion routing table and the convertibility filter.

use crate::cleanup::remove_path;
use crate::report::{ConversionLog, Issue};
use crate::task::FileTask;
use fileforged_common::{SourceKind, TargetFormat};
use std::collections::{BTreeMap, BTreeSet};

/// Targets each source family can be converted to.
fn targets_for(kind: SourceKind) -> &'static [TargetFormat] {
    use TargetFormat::*;
    match kind {
        SourceKind::Raster | SourceKind::CameraRaw => &[Png, Jpg, Webp, Tiff, Pdf],
        SourceKind::Video => &[Mp4, Webm, Mkv, Mp3, Wav],
        SourceKind::Audio => &[Mp3, Wav],
        SourceKind::Office => &[Pdf],
        SourceKind::Pdf => &[OcrPdf, Png, Jpg],
    }
}

/// Immutable map from source extension to allowed targets.
#[derive(Debug, Clone)]
pub struct ConversionMatrix {
    routes: BTreeMap<&'static str, BTreeSet<TargetFormat>>,
}

impl ConversionMatrix {
    /// The built-in table covering every supported source family.
    pub fn standard() -> Self {
        let mut routes = BTreeMap::new();
        for kind in SourceKind::ALL {
            let targets: BTreeSet<TargetFormat> = targets_for(kind).iter().copied().collect();
            for ext in kind.extensions() {
                routes.insert(*ext, targets.clone());
            }
        }
        Self { routes }
    }

    /// Targets reachable from `ext`; empty for unknown extensions.
    pub fn allowed_targets(&self, ext: &str) -> BTreeSet<TargetFormat> {
        self.routes
            .get(ext.to_ascii_lowercase().as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_allowed(&self, ext: &str, target: TargetFormat) -> bool {
        self.routes
            .get(ext.to_ascii_lowercase().as_str())
            .is_some_and(|targets| targets.contains(&target))
    }

    /// Every known extension with its targets, sorted by extension.
    pub fn routes(&self) -> impl Iterator<Item = (&'static str, &BTreeSet<TargetFormat>)> {
        self.routes.iter().map(|(ext, targets)| (*ext, targets))
    }

    /// Extensions that can be converted to `target`.
    pub fn sources_for(&self, target: TargetFormat) -> Vec<&'static str> {
        self.routes
            .iter()
            .filter(|(_, targets)| targets.contains(&target))
            .map(|(ext, _)| *ext)
            .collect()
    }
}

impl Default for ConversionMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

/// Keep the tasks that can reach `target`. Every other task's file is deleted
/// and an `unconvertible` skip is logged for it.
pub fn retain_convertible(
    tasks: Vec<FileTask>,
    matrix: &ConversionMatrix,
    target: TargetFormat,
    log: &mut ConversionLog,
) -> Vec<FileTask> {
    let mut kept = Vec::with_capacity(tasks.len());
    for task in tasks {
        if matrix.is_allowed(&task.extension, target) {
            kept.push(task);
            continue;
        }

        remove_path(&task.path);
        let source = if task.extension.is_empty() {
            "files without an extension".to_string()
        } else {
            format!(".{}", task.extension)
        };
        log.issue(
            Issue::Unconvertible,
            format!("{}: cannot convert {} to {}", task.name, source, target),
            None,
        );
    }
    kept
}
