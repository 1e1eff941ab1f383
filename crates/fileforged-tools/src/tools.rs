//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the external
//! converters (magick, ffmpeg, soffice, ocrmypdf, pdftoppm) and provides
//! lookup methods for the rest of the crate.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// External executables fileforged delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// ImageMagick, general image conversion.
    Magick,
    /// FFmpeg, audio/video transcoding.
    Ffmpeg,
    /// LibreOffice, headless document rendering.
    Soffice,
    /// OCRmyPDF, text layer for scanned PDFs.
    OcrMyPdf,
    /// Poppler's page rasterizer.
    Pdftoppm,
}

impl Tool {
    /// Every managed tool.
    pub const ALL: [Tool; 5] = [
        Tool::Magick,
        Tool::Ffmpeg,
        Tool::Soffice,
        Tool::OcrMyPdf,
        Tool::Pdftoppm,
    ];

    /// Executable name looked up in `PATH`.
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Magick => "magick",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Soffice => "soffice",
            Tool::OcrMyPdf => "ocrmypdf",
            Tool::Pdftoppm => "pdftoppm",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "-version",
            Tool::Pdftoppm => "-v",
            _ => "--version",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Optional explicit executable paths, taking precedence over `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub magick_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub soffice_path: Option<PathBuf>,
    pub ocrmypdf_path: Option<PathBuf>,
    pub pdftoppm_path: Option<PathBuf>,
}

impl ToolPaths {
    /// Configured override for `tool`, if any.
    pub fn get(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Magick => self.magick_path.as_deref(),
            Tool::Ffmpeg => self.ffmpeg_path.as_deref(),
            Tool::Soffice => self.soffice_path.as_deref(),
            Tool::OcrMyPdf => self.ocrmypdf_path.as_deref(),
            Tool::Pdftoppm => self.pdftoppm_path.as_deref(),
        }
    }

    /// Set the override for `tool`.
    pub fn set(&mut self, tool: Tool, path: impl Into<PathBuf>) {
        let slot = match tool {
            Tool::Magick => &mut self.magick_path,
            Tool::Ffmpeg => &mut self.ffmpeg_path,
            Tool::Soffice => &mut self.soffice_path,
            Tool::OcrMyPdf => &mut self.ocrmypdf_path,
            Tool::Pdftoppm => &mut self.pdftoppm_path,
        };
        *slot = Some(path.into());
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of the version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool locations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<Tool, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// For each known tool, a configured path is used directly when it exists.
    /// Otherwise [`which::which`] is used to locate the tool in `PATH`. Tools
    /// that are not found are silently omitted from the registry.
    pub fn discover(paths: &ToolPaths) -> Self {
        let mut tools = HashMap::new();

        for tool in Tool::ALL {
            let resolved = match paths.get(tool) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                // Configured path does not exist; fall back to PATH.
                _ => which::which(tool.binary()).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(tool, path);
            }
        }

        Self { tools }
    }

    /// Path to `tool`, or [`Error::ToolNotFound`] if discovery missed it.
    pub fn require(&self, tool: Tool) -> Result<&Path> {
        self.tools
            .get(&tool)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::tool_not_found(tool.binary()))
    }

    /// Whether `tool` was found.
    pub fn has(&self, tool: Tool) -> bool {
        self.tools.contains_key(&tool)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        Tool::ALL
            .iter()
            .map(|&tool| match self.tools.get(&tool) {
                Some(path) => ToolInfo {
                    name: tool.binary().to_string(),
                    available: true,
                    version: detect_version(path, tool.version_arg()),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: tool.binary().to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> <version_arg>` and return the first non-empty output line.
///
/// Some tools (pdftoppm) print their version on stderr.
fn detect_version(path: &Path, version_arg: &str) -> Option<String> {
    let output = Command::new(path).arg(version_arg).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|s| s.to_string())
}
