//! Disk space guard.
//!
//! Runs once per request before anything is expanded or converted. A request
//! whose uploads do not fit into the uploads volume (minus the safety margin)
//! is rejected outright and its uploads are deleted.

use crate::budget::{BudgetPolicy, StorageBudget};
use crate::cleanup::remove_path;
use crate::error::RequestError;
use crate::report::{ConversionLog, Issue};
use crate::task::Upload;

/// Numbers behind a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub selected: u64,
    pub available: u64,
}

/// Admit or reject a request based on the raw size of its uploads.
pub fn admit(
    uploads: &[Upload],
    budget: &dyn StorageBudget,
    policy: &BudgetPolicy,
    log: &mut ConversionLog,
) -> Result<Admission, RequestError> {
    let mut selected: u64 = 0;
    for upload in uploads {
        match std::fs::metadata(&upload.path) {
            Ok(metadata) if metadata.is_file() => {
                selected = selected.saturating_add(metadata.len());
            }
            _ => log.issue(
                Issue::MissingUpload,
                format!("{}: upload not found", upload.name),
                None,
            ),
        }
    }

    let available = policy.sample(budget);
    tracing::debug!(
        "Admission check: {} bytes selected, {} bytes available",
        selected,
        available
    );

    if selected > available {
        tracing::warn!(
            "Rejecting request: {} bytes selected exceeds {} bytes available",
            selected,
            available
        );
        for upload in uploads {
            remove_path(&upload.path);
        }
        return Err(RequestError::AdmissionRejected {
            selected,
            available,
        });
    }

    Ok(Admission {
        selected,
        available,
    })
}
