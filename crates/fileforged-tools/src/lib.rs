//! # fileforged-tools
//!
//! Invocation of the external converters used by fileforged.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to magick,
//!   ffmpeg, soffice, ocrmypdf and pdftoppm.
//! - **Command execution** ([`ToolCommand`]) -- blocking builder that captures
//!   the combined stdout/stderr stream of a process.
//! - **Workspace management** ([`Workspace`]) -- per-task scratch directories
//!   that are removed on drop.
//! - **Action functions** ([`actions`]) -- one function per conversion path.
//!
//! ## Features
//!
//! - `camera` (default) - decode camera raw files in-process
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use fileforged_tools::{actions, Tool, ToolPaths, ToolRegistry};
//! use std::path::Path;
//!
//! let registry = ToolRegistry::discover(&ToolPaths::default());
//! let magick = registry.require(Tool::Magick)?;
//! let log = actions::convert_image(
//!     magick,
//!     Path::new("in.png"),
//!     Path::new("out.jpg"),
//!     Some(85),
//!     Path::new("/data/jobs"),
//! )?;
//! println!("{log}");
//! # Ok::<(), fileforged_tools::Error>(())
//! ```

pub mod actions;
pub mod command;
mod error;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use tools::{Tool, ToolInfo, ToolPaths, ToolRegistry};
pub use workspace::{move_file, Workspace};
