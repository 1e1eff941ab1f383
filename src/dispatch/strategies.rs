//! Built-in converter strategies.

use super::{ConvertError, ConvertJob, ConverterStrategy};
use fileforged_common::TargetFormat;
use fileforged_tools::actions::{self, camera, PageImage};
use fileforged_tools::{Tool, ToolRegistry, Workspace};
use std::sync::Arc;

/// Raster and page output through ImageMagick.
pub struct ImageMagick {
    tools: Arc<ToolRegistry>,
}

impl ImageMagick {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for ImageMagick {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let magick = self.tools.require(Tool::Magick)?;
        let quality = job
            .target
            .is_lossy_raster()
            .then_some(job.options.image_quality);
        Ok(actions::convert_image(
            magick,
            job.input,
            job.output,
            quality,
            job.scratch_dir,
        )?)
    }
}

/// Audio and video through ffmpeg.
pub struct Ffmpeg {
    tools: Arc<ToolRegistry>,
}

impl Ffmpeg {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for Ffmpeg {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let ffmpeg = self.tools.require(Tool::Ffmpeg)?;
        let preset = job
            .target
            .is_video()
            .then(|| job.options.video_preset.as_str());
        Ok(actions::transcode(ffmpeg, job.input, job.output, preset)?)
    }
}

/// Office documents to PDF through headless LibreOffice.
pub struct LibreOffice {
    tools: Arc<ToolRegistry>,
}

impl LibreOffice {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for LibreOffice {
    fn name(&self) -> &'static str {
        "libreoffice"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let soffice = self.tools.require(Tool::Soffice)?;
        Ok(actions::render_pdf(soffice, job.input, job.output, job.scratch_dir)?)
    }
}

/// Searchable PDF through OCRmyPDF.
pub struct OcrMyPdf {
    tools: Arc<ToolRegistry>,
}

impl OcrMyPdf {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for OcrMyPdf {
    fn name(&self) -> &'static str {
        "ocrmypdf"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let ocrmypdf = self.tools.require(Tool::OcrMyPdf)?;
        let language = job.options.ocr_language.trim();
        let language = (!language.is_empty()).then_some(language);
        Ok(actions::ocr_pdf(ocrmypdf, job.input, job.output, language)?)
    }
}

/// First PDF page to an image through pdftoppm.
pub struct PdfRaster {
    tools: Arc<ToolRegistry>,
}

impl PdfRaster {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for PdfRaster {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let format = match job.target {
            TargetFormat::Png => PageImage::Png,
            TargetFormat::Jpg => PageImage::Jpeg,
            other => {
                return Err(ConvertError::new(format!(
                    "pdf pages cannot be rendered as {other}"
                )))
            }
        };
        let pdftoppm = self.tools.require(Tool::Pdftoppm)?;
        Ok(actions::rasterize_first_page(
            pdftoppm,
            job.input,
            job.output,
            format,
            job.scratch_dir,
        )?)
    }
}

/// Camera raw to a raster format, decoded in-process.
pub struct CameraRaster;

impl ConverterStrategy for CameraRaster {
    fn name(&self) -> &'static str {
        "camera-raw"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let encoding =
            camera::RasterEncoding::for_extension(job.target.extension(), job.options.image_quality)
                .ok_or_else(|| {
                    ConvertError::new(format!("camera raw cannot be encoded as {}", job.target))
                })?;

        let image = camera::normalize(camera::decode_raw(job.input)?);
        camera::encode(&image, job.output, encoding)?;
        Ok(format!(
            "decoded {}x{} camera raw, encoded as {}",
            image.width(),
            image.height(),
            job.target
        ))
    }
}

/// Camera raw to PDF: decode to an intermediate PNG, then ImageMagick.
pub struct CameraDocument {
    tools: Arc<ToolRegistry>,
}

impl CameraDocument {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl ConverterStrategy for CameraDocument {
    fn name(&self) -> &'static str {
        "camera-raw+imagemagick"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        let magick = self.tools.require(Tool::Magick)?;
        let workspace = Workspace::new_in(job.scratch_dir, "camera-")?;
        let intermediate = workspace.temp_file("page.png");

        let image = camera::normalize(camera::decode_raw(job.input)?);
        camera::encode(&image, &intermediate, camera::RasterEncoding::Png)?;

        let log =
            actions::convert_image(magick, &intermediate, job.output, None, job.scratch_dir)?;
        Ok(format!(
            "decoded {}x{} camera raw\n{log}",
            image.width(),
            image.height()
        ))
    }
}
