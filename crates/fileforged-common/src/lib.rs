//! Fileforged-Common: shared types, constants, and utilities.
//!
//! This crate provides common functionality used across fileforged:
//!
//! - **Typed IDs**: a UUID wrapper identifying one conversion request
//! - **Formats**: source families, target formats, and encoder presets
//! - **Path Utilities**: extension detection and archive recognition
//! - **Error Handling**: common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use fileforged_common::{JobId, SourceKind, TargetFormat};
//! use fileforged_common::paths::{extension_of, is_archive};
//! use std::path::Path;
//!
//! let job = JobId::new();
//! assert_eq!(job.short().len(), 8);
//!
//! assert_eq!(extension_of(Path::new("Holiday.JPG")), "jpg");
//! assert!(is_archive(Path::new("batch.zip")));
//!
//! let target: TargetFormat = "jpeg".parse().unwrap();
//! assert_eq!(target, TargetFormat::Jpg);
//! assert_eq!(SourceKind::from_extension("nef"), Some(SourceKind::CameraRaw));
//! ```

pub mod error;
pub mod formats;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use formats::{SourceKind, TargetFormat, TargetKind, VideoPreset};
pub use ids::JobId;
