//! OCR text layers with OCRmyPDF.

use crate::{Result, ToolCommand};
use std::path::Path;

/// Add a text layer to `input`, writing the result to `output`.
///
/// Pages that already carry text are left untouched (`--skip-text`).
pub fn ocr_pdf(
    ocrmypdf: &Path,
    input: &Path,
    output: &Path,
    language: Option<&str>,
) -> Result<String> {
    #[cfg(feature = "tracing")]
    tracing::info!("Running OCR on {:?} (language {:?})", input, language);

    let mut cmd = ToolCommand::new(ocrmypdf);
    cmd.arg("--skip-text");
    if let Some(lang) = language {
        cmd.arg("-l").arg(lang);
    }
    cmd.arg(input).arg(output);

    Ok(cmd.execute()?.output)
}
