//! Path utilities for detecting file types by extension.

use std::path::Path;

/// Archive extensions the expander unpacks.
const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// Lowercase extension of `path` without the dot, or an empty string.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fileforged_common::paths::extension_of;
///
/// assert_eq!(extension_of(Path::new("/uploads/Report.DOCX")), "docx");
/// assert_eq!(extension_of(Path::new("README")), "");
/// ```
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Check if a path has an archive extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fileforged_common::paths::is_archive;
///
/// assert!(is_archive(Path::new("photos.ZIP")));
/// assert!(!is_archive(Path::new("photo.jpg")));
/// ```
pub fn is_archive(path: &Path) -> bool {
    ARCHIVE_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Get the list of archive extensions.
#[must_use]
pub fn archive_extensions() -> &'static [&'static str] {
    ARCHIVE_EXTENSIONS
}

/// File stem made safe for use inside generated file names.
///
/// Anything other than ASCII alphanumerics, `-`, `_` and `.` becomes `_`;
/// an empty stem becomes `file`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use fileforged_common::paths::sanitized_stem;
///
/// assert_eq!(sanitized_stem(Path::new("My Photo (1).jpg")), "My_Photo__1_");
/// assert_eq!(sanitized_stem(Path::new(".jpg")), ".jpg");
/// ```
pub fn sanitized_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
