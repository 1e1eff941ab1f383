//! Conversion actions.
//!
//! One function per conversion path. Each returns the combined text the tool
//! printed; failures carry the same text in the error.
//! - Raster conversion through ImageMagick
//! - Audio/video transcoding through ffmpeg
//! - Office documents to PDF through LibreOffice
//! - OCR text layers through OCRmyPDF
//! - PDF first-page rasterization through pdftoppm
//! - Camera raw decode and re-encode (in-process)

mod document;
mod media;
mod ocr;
mod pdf;
mod raster;

#[cfg(feature = "camera")]
pub mod camera;

pub use document::render_pdf;
pub use media::transcode;
pub use ocr::ocr_pdf;
pub use pdf::{rasterize_first_page, PageImage};
pub use raster::convert_image;
