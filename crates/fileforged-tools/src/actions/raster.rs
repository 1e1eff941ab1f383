//! Raster conversion with ImageMagick.

use crate::{Error, Result, ToolCommand, Workspace};
use std::path::Path;

/// Convert `input` to `output` with `magick`, the format chosen by the output
/// extension.
///
/// `quality` is forwarded as `-quality` and should only be set for lossy
/// targets (jpg, webp).
///
/// magick writes one file per frame for animated or multi-page sources
/// (`name-0.png`, `name-1.png`, ...), so it runs inside a workspace under
/// `scratch_parent` and only the single expected file is moved to `output`.
pub fn convert_image(
    magick: &Path,
    input: &Path,
    output: &Path,
    quality: Option<u8>,
    scratch_parent: &Path,
) -> Result<String> {
    #[cfg(feature = "tracing")]
    tracing::info!("Converting image {:?} -> {:?}", input, output);

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_string();
    let workspace = Workspace::new_in(scratch_parent, "magick-")?;
    let converted = workspace.temp_file(&format!("converted.{extension}"));

    let mut cmd = ToolCommand::new(magick);
    cmd.arg(input);
    if let Some(q) = quality {
        cmd.arg("-quality").arg(q.to_string());
    }
    cmd.arg(&converted);
    let log = cmd.execute()?.output;

    if !converted.is_file() {
        return Err(Error::no_output("magick", extension, log));
    }

    workspace.deliver(&converted, output)?;
    Ok(log)
}
