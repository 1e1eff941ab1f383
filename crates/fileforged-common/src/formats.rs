//! Format vocabulary shared by the routing table and the converters.
//!
//! Source files are classified into a [`SourceKind`] family by extension;
//! requested outputs are a closed set of [`TargetFormat`]s, each belonging to
//! one [`TargetKind`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Photographic raster formats handled by the general image tool.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tif", "tiff", "bmp", "gif"];

/// Camera-native raw formats that need an in-process decode first.
pub const CAMERA_RAW_EXTENSIONS: &[&str] = &[
    "cr2", "nef", "nrw", "arw", "srf", "sr2", "dng", "orf", "rw2", "raf", "pef", "srw",
];

/// Video containers.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "m4v"];

/// Audio-only containers and codecs.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac", "opus"];

/// Office documents rendered by the headless document tool.
pub const OFFICE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "odt", "rtf", "ppt", "pptx", "odp", "xls", "xlsx", "ods",
];

/// Page documents.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Family a source file belongs to, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Raster,
    CameraRaw,
    Video,
    Audio,
    Office,
    Pdf,
}

impl SourceKind {
    /// All families, in display order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Raster,
        SourceKind::CameraRaw,
        SourceKind::Video,
        SourceKind::Audio,
        SourceKind::Office,
        SourceKind::Pdf,
    ];

    /// Classify a lowercase extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext))
    }

    /// Extensions belonging to this family.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Raster => RASTER_EXTENSIONS,
            SourceKind::CameraRaw => CAMERA_RAW_EXTENSIONS,
            SourceKind::Video => VIDEO_EXTENSIONS,
            SourceKind::Audio => AUDIO_EXTENSIONS,
            SourceKind::Office => OFFICE_EXTENSIONS,
            SourceKind::Pdf => PDF_EXTENSIONS,
        }
    }

    /// Human-readable family name.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Raster => "image",
            SourceKind::CameraRaw => "camera raw",
            SourceKind::Video => "video",
            SourceKind::Audio => "audio",
            SourceKind::Office => "office document",
            SourceKind::Pdf => "pdf",
        }
    }
}

/// Broad category of a target format; selects the converter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Still image output.
    Raster,
    /// Audio or video output.
    Media,
    /// Page document output.
    Document,
    /// Text-searchable page document.
    Ocr,
}

/// A requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Png,
    Jpg,
    Webp,
    Tiff,
    Mp4,
    Webm,
    Mkv,
    Mp3,
    Wav,
    Pdf,
    OcrPdf,
}

impl TargetFormat {
    /// Every target, in the order the CLI lists them.
    pub const ALL: [TargetFormat; 11] = [
        TargetFormat::Png,
        TargetFormat::Jpg,
        TargetFormat::Webp,
        TargetFormat::Tiff,
        TargetFormat::Mp4,
        TargetFormat::Webm,
        TargetFormat::Mkv,
        TargetFormat::Mp3,
        TargetFormat::Wav,
        TargetFormat::Pdf,
        TargetFormat::OcrPdf,
    ];

    /// Name used on the command line and in config files.
    pub fn name(&self) -> &'static str {
        match self {
            TargetFormat::Png => "png",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Webp => "webp",
            TargetFormat::Tiff => "tiff",
            TargetFormat::Mp4 => "mp4",
            TargetFormat::Webm => "webm",
            TargetFormat::Mkv => "mkv",
            TargetFormat::Mp3 => "mp3",
            TargetFormat::Wav => "wav",
            TargetFormat::Pdf => "pdf",
            TargetFormat::OcrPdf => "ocrpdf",
        }
    }

    /// File extension of the produced file.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::OcrPdf => "pdf",
            other => other.name(),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetFormat::Png | TargetFormat::Jpg | TargetFormat::Webp | TargetFormat::Tiff => {
                TargetKind::Raster
            }
            TargetFormat::Mp4
            | TargetFormat::Webm
            | TargetFormat::Mkv
            | TargetFormat::Mp3
            | TargetFormat::Wav => TargetKind::Media,
            TargetFormat::Pdf => TargetKind::Document,
            TargetFormat::OcrPdf => TargetKind::Ocr,
        }
    }

    /// Whether the encoder takes a quality setting.
    pub fn is_lossy_raster(&self) -> bool {
        matches!(self, TargetFormat::Jpg | TargetFormat::Webp)
    }

    /// Whether the encoder takes a speed/quality preset.
    pub fn is_video(&self) -> bool {
        matches!(self, TargetFormat::Mp4 | TargetFormat::Webm | TargetFormat::Mkv)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(TargetFormat::Png),
            "jpg" | "jpeg" => Ok(TargetFormat::Jpg),
            "webp" => Ok(TargetFormat::Webp),
            "tif" | "tiff" => Ok(TargetFormat::Tiff),
            "mp4" => Ok(TargetFormat::Mp4),
            "webm" => Ok(TargetFormat::Webm),
            "mkv" => Ok(TargetFormat::Mkv),
            "mp3" => Ok(TargetFormat::Mp3),
            "wav" => Ok(TargetFormat::Wav),
            "pdf" => Ok(TargetFormat::Pdf),
            "ocrpdf" | "ocr-pdf" | "ocr" => Ok(TargetFormat::OcrPdf),
            _ => Err(Error::unknown_format(s)),
        }
    }
}

/// ffmpeg encoding speed/quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPreset {
    Ultrafast,
    Fast,
    #[default]
    Medium,
    Slow,
}

impl VideoPreset {
    /// Value passed to `-preset`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoPreset::Ultrafast => "ultrafast",
            VideoPreset::Fast => "fast",
            VideoPreset::Medium => "medium",
            VideoPreset::Slow => "slow",
        }
    }
}

impl fmt::Display for VideoPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ultrafast" => Ok(VideoPreset::Ultrafast),
            "fast" => Ok(VideoPreset::Fast),
            "medium" => Ok(VideoPreset::Medium),
            "slow" => Ok(VideoPreset::Slow),
            _ => Err(Error::invalid_input(format!(
                "unknown video preset '{s}' (expected ultrafast, fast, medium or slow)"
            ))),
        }
    }
}
