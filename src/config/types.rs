use crate::budget::BudgetPolicy;
use crate::dispatch::ConvertOptions;
use crate::request::Layout;
use fileforged_common::VideoPreset;
use fileforged_tools::ToolPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub tools: ToolPaths,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root of the working directories (overridden by `DATA_DIR`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Working area for uploads (default: `<data_dir>/uploads`)
    #[serde(default)]
    pub uploads_dir: Option<PathBuf>,

    /// Converted results (default: `<data_dir>/outputs`)
    #[serde(default)]
    pub outputs_dir: Option<PathBuf>,

    /// Archive extraction and scratch space (default: `<data_dir>/jobs`)
    #[serde(default)]
    pub jobs_dir: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            uploads_dir: None,
            outputs_dir: None,
            jobs_dir: None,
        }
    }
}

impl PathsConfig {
    pub fn uploads(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }

    pub fn outputs(&self) -> PathBuf {
        self.outputs_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("outputs"))
    }

    pub fn jobs(&self) -> PathBuf {
        self.jobs_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("jobs"))
    }

    pub fn layout(&self) -> Layout {
        Layout {
            uploads: self.uploads(),
            outputs: self.outputs(),
            jobs: self.jobs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Space always left free on every volume, in MiB (default: 512)
    #[serde(default = "default_safety_margin_mb")]
    pub safety_margin_mb: u64,

    /// Estimated output size as a multiple of the input size (default: 2.0)
    #[serde(default = "default_output_multiplier")]
    pub output_multiplier: f64,

    /// How deep archives inside archives are expanded (default: 3)
    #[serde(default = "default_max_archive_depth")]
    pub max_archive_depth: u32,
}

fn default_safety_margin_mb() -> u64 {
    512
}

fn default_output_multiplier() -> f64 {
    2.0
}

fn default_max_archive_depth() -> u32 {
    crate::expand::DEFAULT_MAX_ARCHIVE_DEPTH
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            safety_margin_mb: default_safety_margin_mb(),
            output_multiplier: default_output_multiplier(),
            max_archive_depth: default_max_archive_depth(),
        }
    }
}

impl StorageConfig {
    pub fn policy(&self) -> BudgetPolicy {
        BudgetPolicy::new(
            self.safety_margin_mb.saturating_mul(1024 * 1024),
            self.output_multiplier,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    /// JPEG/WebP quality (default: 85)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// ffmpeg preset for video targets (default: "medium")
    #[serde(default)]
    pub video_preset: VideoPreset,

    /// OCR language code (default: "fra")
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
}

fn default_image_quality() -> u8 {
    85
}

fn default_ocr_language() -> String {
    "fra".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            image_quality: default_image_quality(),
            video_preset: VideoPreset::default(),
            ocr_language: default_ocr_language(),
        }
    }
}

impl DefaultsConfig {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            image_quality: self.image_quality,
            video_preset: self.video_preset,
            ocr_language: self.ocr_language.clone(),
        }
    }
}
