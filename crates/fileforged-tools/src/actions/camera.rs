//! Camera raw decoding and re-encoding.
//!
//! Raw files are decoded in-process by imagepipe's default pipeline
//! (demosaic, white balance, colour conversion to sRGB, rotation to the
//! orientation the camera recorded). The result is normalized to 8-bit RGB
//! and encoded with the `image` crate.

use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Output encodings available for camera sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterEncoding {
    Png,
    Jpeg { quality: u8 },
    WebP,
    Tiff,
}

impl RasterEncoding {
    /// Encoding for a target extension; `quality` is used for JPEG only.
    pub fn for_extension(ext: &str, quality: u8) -> Option<Self> {
        match ext {
            "png" => Some(RasterEncoding::Png),
            "jpg" | "jpeg" => Some(RasterEncoding::Jpeg {
                quality: quality.clamp(1, 100),
            }),
            "webp" => Some(RasterEncoding::WebP),
            "tif" | "tiff" => Some(RasterEncoding::Tiff),
            _ => None,
        }
    }
}

/// Decode a camera raw file into upright sRGB pixels.
pub fn decode_raw(input: &Path) -> Result<DynamicImage> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Decoding camera raw {:?}", input);

    let srgb = imagepipe::simple_decode_8bit(input, 0, 0)
        .map_err(|e| Error::Decode(format!("{}: {e}", input.display())))?;

    let rgb = RgbImage::from_raw(srgb.width as u32, srgb.height as u32, srgb.data)
        .ok_or_else(|| {
            Error::Decode(format!(
                "{}: decoder returned a truncated buffer",
                input.display()
            ))
        })?;

    Ok(DynamicImage::ImageRgb8(rgb))
}

/// Convert to 8-bit RGB, dropping any alpha channel.
pub fn normalize(pixels: DynamicImage) -> DynamicImage {
    match pixels {
        rgb @ DynamicImage::ImageRgb8(_) => rgb,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Write `image` to `output` with the requested encoding.
pub fn encode(image: &DynamicImage, output: &Path, encoding: RasterEncoding) -> Result<()> {
    match encoding {
        RasterEncoding::Jpeg { quality } => {
            let writer = BufWriter::new(File::create(output)?);
            image.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))?;
        }
        RasterEncoding::Png => image.save_with_format(output, ImageFormat::Png)?,
        RasterEncoding::WebP => image.save_with_format(output, ImageFormat::WebP)?,
        RasterEncoding::Tiff => image.save_with_format(output, ImageFormat::Tiff)?,
    }
    Ok(())
}
