//! PDF page rasterization with pdftoppm.

use crate::{Error, Result, ToolCommand, Workspace};
use std::path::Path;

/// Raster encodings pdftoppm can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageImage {
    Png,
    Jpeg,
}

impl PageImage {
    fn flag(&self) -> &'static str {
        match self {
            PageImage::Png => "-png",
            PageImage::Jpeg => "-jpeg",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            PageImage::Png => "png",
            PageImage::Jpeg => "jpg",
        }
    }
}

/// Render the first page of `input` to `output`.
///
/// pdftoppm appends its own extension to the output root, so the page is
/// written into a workspace under `scratch_parent` and moved afterwards.
pub fn rasterize_first_page(
    pdftoppm: &Path,
    input: &Path,
    output: &Path,
    format: PageImage,
    scratch_parent: &Path,
) -> Result<String> {
    let workspace = Workspace::new_in(scratch_parent, "page-")?;
    let root = workspace.temp_file("page");

    #[cfg(feature = "tracing")]
    tracing::info!("Rasterizing first page of {:?} as {:?}", input, format);

    let log = ToolCommand::new(pdftoppm)
        .arg("-singlefile")
        .arg(format.flag())
        .arg(input)
        .arg(&root)
        .execute()?
        .output;

    let produced = workspace.temp_file(&format!("page.{}", format.extension()));
    if !produced.exists() {
        return Err(Error::no_output("pdftoppm", format.extension(), log));
    }

    workspace.deliver(&produced, output)?;
    Ok(log)
}
