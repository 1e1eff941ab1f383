//! Converter dispatch.
//!
//! A [`Dispatcher`] maps `(source family, target kind)` to a
//! [`ConverterStrategy`] and runs exactly one conversion per call. It never
//! returns an error: every outcome is a [`ConversionResult`], and a result of
//! `Converted` always points at an existing, nonempty file.

mod strategies;

pub use strategies::{
    CameraDocument, CameraRaster, Ffmpeg, ImageMagick, LibreOffice, OcrMyPdf, PdfRaster,
};

use crate::cleanup::remove_path;
use fileforged_common::{SourceKind, TargetFormat, TargetKind, VideoPreset};
use fileforged_tools::ToolRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-request encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Quality for lossy raster targets, 1..=100.
    pub image_quality: u8,
    pub video_preset: VideoPreset,
    /// Tesseract language code passed to OCRmyPDF.
    pub ocr_language: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            image_quality: 85,
            video_preset: VideoPreset::default(),
            ocr_language: "fra".to_string(),
        }
    }
}

/// Everything a strategy needs for one conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConvertJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub target: TargetFormat,
    pub options: &'a ConvertOptions,
    /// Parent directory for per-conversion scratch workspaces.
    pub scratch_dir: &'a Path,
}

/// A failed conversion with the tool's captured text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct ConvertError {
    pub reason: String,
    pub output: String,
}

impl ConvertError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            output: String::new(),
        }
    }
}

impl From<fileforged_tools::Error> for ConvertError {
    fn from(err: fileforged_tools::Error) -> Self {
        Self {
            output: err.tool_output().unwrap_or_default().to_string(),
            reason: err.to_string(),
        }
    }
}

/// One way of converting a source family into a target kind.
pub trait ConverterStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write `job.output` from `job.input`, returning the captured tool text.
    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError>;
}

/// Outcome of converting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Converted { output: PathBuf, log: String },
    Failed { reason: String, log: String },
}

impl ConversionResult {
    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionResult::Converted { .. })
    }

    fn failed(reason: impl Into<String>) -> Self {
        ConversionResult::Failed {
            reason: reason.into(),
            log: String::new(),
        }
    }
}

/// Routes single conversions to strategies.
pub struct Dispatcher {
    routes: HashMap<(SourceKind, TargetKind), Arc<dyn ConverterStrategy>>,
    scratch_dir: PathBuf,
}

impl Dispatcher {
    /// Dispatcher with no strategies registered.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            routes: HashMap::new(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Dispatcher wired to the external tools found in `tools`.
    pub fn standard(tools: Arc<ToolRegistry>, scratch_dir: impl Into<PathBuf>) -> Self {
        let magick: Arc<dyn ConverterStrategy> = Arc::new(ImageMagick::new(tools.clone()));
        let ffmpeg: Arc<dyn ConverterStrategy> = Arc::new(Ffmpeg::new(tools.clone()));

        let mut dispatcher = Self::new(scratch_dir);
        dispatcher
            .register(SourceKind::Raster, TargetKind::Raster, magick.clone())
            .register(SourceKind::Raster, TargetKind::Document, magick)
            .register(SourceKind::CameraRaw, TargetKind::Raster, Arc::new(CameraRaster))
            .register(
                SourceKind::CameraRaw,
                TargetKind::Document,
                Arc::new(CameraDocument::new(tools.clone())),
            )
            .register(SourceKind::Video, TargetKind::Media, ffmpeg.clone())
            .register(SourceKind::Audio, TargetKind::Media, ffmpeg)
            .register(
                SourceKind::Office,
                TargetKind::Document,
                Arc::new(LibreOffice::new(tools.clone())),
            )
            .register(SourceKind::Pdf, TargetKind::Ocr, Arc::new(OcrMyPdf::new(tools.clone())))
            .register(SourceKind::Pdf, TargetKind::Raster, Arc::new(PdfRaster::new(tools)));
        dispatcher
    }

    /// Register (or replace) the strategy for a route.
    pub fn register(
        &mut self,
        source: SourceKind,
        target: TargetKind,
        strategy: Arc<dyn ConverterStrategy>,
    ) -> &mut Self {
        self.routes.insert((source, target), strategy);
        self
    }

    /// Strategy handling `extension` to `target`, if any.
    pub fn strategy_for(
        &self,
        extension: &str,
        target: TargetFormat,
    ) -> Option<&Arc<dyn ConverterStrategy>> {
        let source = SourceKind::from_extension(extension)?;
        self.routes.get(&(source, target.kind()))
    }

    /// Convert a single file.
    ///
    /// On failure any partial file at `output` is removed. The input is left
    /// untouched; the caller owns it.
    pub fn dispatch(
        &self,
        extension: &str,
        input: &Path,
        output: &Path,
        target: TargetFormat,
        options: &ConvertOptions,
    ) -> ConversionResult {
        let Some(strategy) = self.strategy_for(extension, target) else {
            return ConversionResult::failed(format!(
                "no converter from .{extension} to {target}"
            ));
        };

        let job = ConvertJob {
            input,
            output,
            target,
            options,
            scratch_dir: &self.scratch_dir,
        };

        tracing::info!("Converting {:?} to {} with {}", input, target, strategy.name());
        match strategy.convert(&job) {
            Ok(log) if is_nonempty_file(output) => ConversionResult::Converted {
                output: output.to_path_buf(),
                log,
            },
            Ok(log) => {
                remove_path(output);
                ConversionResult::Failed {
                    reason: format!("{} finished without producing an output file", strategy.name()),
                    log,
                }
            }
            Err(e) => {
                tracing::warn!("{} failed on {:?}: {}", strategy.name(), input, e.reason);
                remove_path(output);
                ConversionResult::Failed {
                    reason: e.reason,
                    log: e.output,
                }
            }
        }
    }
}

fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Writes(&'static [u8]);

    impl ConverterStrategy for Writes {
        fn name(&self) -> &'static str {
            "writes"
        }

        fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
            std::fs::write(job.output, self.0).map_err(|e| ConvertError::new(e.to_string()))?;
            Ok("wrote output".into())
        }
    }

    struct Fails;

    impl ConverterStrategy for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
            std::fs::write(job.output, b"partial").unwrap();
            Err(ConvertError {
                reason: "tool exited with status 1".into(),
                output: "Error: bad input".into(),
            })
        }
    }

    fn setup(strategy: Arc<dyn ConverterStrategy>) -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = Dispatcher::new(dir.path());
        dispatcher.register(SourceKind::Raster, TargetKind::Raster, strategy);
        (dir, dispatcher)
    }

    #[test]
    fn successful_conversion_returns_output() {
        let (dir, dispatcher) = setup(Arc::new(Writes(b"jpeg")));
        let input = dir.path().join("a.png");
        let output = dir.path().join("a.jpg");
        std::fs::write(&input, b"png").unwrap();

        let result = dispatcher.dispatch("png", &input, &output, TargetFormat::Jpg, &ConvertOptions::default());
        assert_eq!(
            result,
            ConversionResult::Converted { output: output.clone(), log: "wrote output".into() }
        );
        assert!(input.exists());
    }

    #[test]
    fn empty_output_is_a_failure() {
        let (dir, dispatcher) = setup(Arc::new(Writes(b"")));
        let input = dir.path().join("a.png");
        let output = dir.path().join("a.jpg");
        std::fs::write(&input, b"png").unwrap();

        let result = dispatcher.dispatch("png", &input, &output, TargetFormat::Jpg, &ConvertOptions::default());
        assert_matches!(result, ConversionResult::Failed { .. });
        assert!(!output.exists());
    }

    #[test]
    fn failure_keeps_tool_text_and_removes_partial_output() {
        let (dir, dispatcher) = setup(Arc::new(Fails));
        let input = dir.path().join("a.png");
        let output = dir.path().join("a.jpg");
        std::fs::write(&input, b"png").unwrap();

        let result = dispatcher.dispatch("png", &input, &output, TargetFormat::Jpg, &ConvertOptions::default());
        assert_matches!(
            &result,
            ConversionResult::Failed { reason, log }
                if reason == "tool exited with status 1" && log == "Error: bad input"
        );
        assert!(!output.exists());
    }

    #[test]
    fn unrouted_pairs_fail_without_running_anything() {
        let (dir, dispatcher) = setup(Arc::new(Writes(b"x")));
        let output = dir.path().join("a.mp3");
        let result = dispatcher.dispatch(
            "docx",
            &dir.path().join("a.docx"),
            &output,
            TargetFormat::Mp3,
            &ConvertOptions::default(),
        );
        assert!(!result.is_converted());
        assert!(!output.exists());
    }

    #[test]
    fn standard_dispatcher_covers_every_route() {
        let dispatcher = Dispatcher::standard(Arc::new(ToolRegistry::default()), "/tmp");
        let matrix = crate::routing::ConversionMatrix::standard();
        for (ext, targets) in matrix.routes() {
            for target in targets {
                assert!(
                    dispatcher.strategy_for(ext, *target).is_some(),
                    "no strategy for .{ext} -> {target}"
                );
            }
        }
    }

    #[test]
    fn missing_tool_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = Dispatcher::standard(Arc::new(ToolRegistry::default()), dir.path());
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"docx").unwrap();

        let result = dispatcher.dispatch(
            "docx",
            &input,
            &dir.path().join("report.pdf"),
            TargetFormat::Pdf,
            &ConvertOptions::default(),
        );
        assert_matches!(result, ConversionResult::Failed { reason, .. } if reason.contains("soffice"));
    }
}
