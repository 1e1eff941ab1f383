//! Audio/video transcoding with ffmpeg.

use crate::{Result, ToolCommand};
use std::path::Path;

/// Transcode `input` to `output` with ffmpeg, codecs chosen by the output
/// container. `preset` is forwarded as `-preset` for video targets.
pub fn transcode(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    preset: Option<&str>,
) -> Result<String> {
    #[cfg(feature = "tracing")]
    tracing::info!("Transcoding {:?} -> {:?}", input, output);

    let mut cmd = ToolCommand::new(ffmpeg);
    cmd.arg("-y").arg("-i").arg(input);
    if let Some(preset) = preset {
        cmd.arg("-preset").arg(preset);
    }
    cmd.arg(output);

    Ok(cmd.execute()?.output)
}
