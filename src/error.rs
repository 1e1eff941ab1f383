//! Fatal request errors.
//!
//! Per-item problems are recorded in the [`ConversionLog`] and never surface
//! here. A [`RequestError`] aborts the whole request.

use crate::report::ConversionLog;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(
        "selected files total {selected} bytes but only {available} bytes are available \
         after the safety margin; the uploads were deleted and nothing was converted"
    )]
    AdmissionRejected { selected: u64, available: u64 },

    #[error(
        "insufficient space for this file: {file} needs an estimated {footprint} bytes \
         but only {available} bytes are available"
    )]
    InsufficientSpaceForItem {
        file: String,
        footprint: u64,
        available: u64,
    },

    #[error("failed to build result archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// A fatal error together with everything logged before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RequestFailure {
    #[source]
    pub error: RequestError,
    pub log: ConversionLog,
}
