//! Error types for fileforged-tools.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}; is it installed and in PATH?")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute or exited nonzero.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed {
        tool: String,
        message: String,
        /// Combined stdout/stderr captured from the process.
        output: String,
    },

    /// The tool exited successfully but the expected file is missing.
    #[error("{tool} did not produce a .{expected} file")]
    NoOutput {
        tool: String,
        expected: String,
        /// Combined stdout/stderr captured from the process.
        output: String,
    },

    /// The specified file was not found.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// In-process decoding failed.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Image encoding failed.
    #[cfg(feature = "camera")]
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace error.
    #[error("workspace error: {0}")]
    Workspace(String),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(
        tool: impl Into<String>,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
            output: output.into(),
        }
    }

    /// Create a missing output error.
    pub fn no_output(
        tool: impl Into<String>,
        expected: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::NoOutput {
            tool: tool.into(),
            expected: expected.into(),
            output: output.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Text the tool printed before failing, if any was captured.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Error::ToolFailed { output, .. } | Error::NoOutput { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}
