//! Office document rendering with headless LibreOffice.

use crate::{Error, Result, ToolCommand, Workspace};
use std::path::Path;

/// Render an office document to PDF at `output`.
///
/// LibreOffice names its output after the input file, so it writes into a
/// private workspace under `scratch_parent`; the single PDF found there is
/// moved to `output`. The workspace is removed on every path out of this
/// function.
pub fn render_pdf(
    soffice: &Path,
    input: &Path,
    output: &Path,
    scratch_parent: &Path,
) -> Result<String> {
    let workspace = Workspace::new_in(scratch_parent, "render-")?;

    #[cfg(feature = "tracing")]
    tracing::info!("Rendering {:?} to PDF in {:?}", input, workspace.path());

    let log = ToolCommand::new(soffice)
        .args(["--headless", "--nologo", "--nofirststartwizard"])
        .args(["--convert-to", "pdf"])
        .arg("--outdir")
        .arg(workspace.path())
        .arg(input)
        .execute()?
        .output;

    let produced = workspace
        .find_produced("pdf")?
        .ok_or_else(|| Error::no_output("soffice", "pdf", log.clone()))?;

    workspace.deliver(&produced, output)?;

    Ok(log)
}
