//! Request orchestration.
//!
//! [`BatchConverter::run`] drives one conversion request through admission,
//! expansion, filtering, batch planning, per-file dispatch and aggregation.
//! When it returns, nothing the request created is left on disk except the
//! returned file.

use crate::aggregate::aggregate;
use crate::budget::{BudgetPolicy, StorageBudget, VolumeBudget};
use crate::cleanup::{remove_path, ScopedCleanup};
use crate::config::Config;
use crate::dispatch::{ConversionResult, ConvertOptions, Dispatcher};
use crate::error::{RequestError, RequestFailure};
use crate::expand::{Expander, DEFAULT_MAX_ARCHIVE_DEPTH};
use crate::guard;
use crate::planner::BatchPlanner;
use crate::report::{ConversionLog, Issue};
use crate::routing::{retain_convertible, ConversionMatrix};
use crate::task::{display_name, FileTask, Upload};
use fileforged_common::paths::sanitized_stem;
use fileforged_common::{JobId, TargetFormat};
use fileforged_tools::{move_file, ToolRegistry};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Working directories used by requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Working area; tasks are moved here right before conversion.
    pub uploads: PathBuf,
    /// Converted files and result archives.
    pub outputs: PathBuf,
    /// Archive extraction and converter scratch space.
    pub jobs: PathBuf,
}

impl Layout {
    /// Standard layout below one data directory.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            uploads: data_dir.join("uploads"),
            outputs: data_dir.join("outputs"),
            jobs: data_dir.join("jobs"),
        }
    }

    pub fn create_all(&self) -> io::Result<()> {
        for dir in [&self.uploads, &self.outputs, &self.jobs] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Free-space sources for the three working directories.
#[derive(Clone)]
pub struct Budgets {
    pub uploads: Arc<dyn StorageBudget>,
    pub outputs: Arc<dyn StorageBudget>,
    pub jobs: Arc<dyn StorageBudget>,
}

impl Budgets {
    /// Query the volumes holding each directory of `layout`.
    pub fn for_layout(layout: &Layout) -> Self {
        Self {
            uploads: Arc::new(VolumeBudget::new(&layout.uploads)),
            outputs: Arc::new(VolumeBudget::new(&layout.outputs)),
            jobs: Arc::new(VolumeBudget::new(&layout.jobs)),
        }
    }

    /// The same budget for every directory.
    pub fn uniform(budget: Arc<dyn StorageBudget>) -> Self {
        Self {
            uploads: budget.clone(),
            outputs: budget.clone(),
            jobs: budget,
        }
    }
}

/// One user action: convert these uploads to one target.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub uploads: Vec<Upload>,
    pub target: TargetFormat,
    pub options: ConvertOptions,
}

/// What a finished request hands back.
#[derive(Debug)]
pub struct RequestOutcome {
    pub job: JobId,
    /// The single converted file or the bundle of all of them.
    pub output: Option<PathBuf>,
    pub log: ConversionLog,
}

/// Runs conversion requests against a set of working directories.
pub struct BatchConverter {
    layout: Layout,
    budgets: Budgets,
    policy: BudgetPolicy,
    matrix: ConversionMatrix,
    dispatcher: Dispatcher,
    max_archive_depth: u32,
}

impl BatchConverter {
    pub fn new(layout: Layout, budgets: Budgets, policy: BudgetPolicy, dispatcher: Dispatcher) -> Self {
        Self {
            layout,
            budgets,
            policy,
            matrix: ConversionMatrix::standard(),
            dispatcher,
            max_archive_depth: DEFAULT_MAX_ARCHIVE_DEPTH,
        }
    }

    /// Converter for a loaded config, using the real volumes and tools.
    pub fn from_config(config: &Config, tools: Arc<ToolRegistry>) -> Self {
        let layout = config.paths.layout();
        let budgets = Budgets::for_layout(&layout);
        let dispatcher = Dispatcher::standard(tools, &layout.jobs);
        Self::new(layout, budgets, config.storage.policy(), dispatcher)
            .with_max_archive_depth(config.storage.max_archive_depth)
    }

    pub fn with_max_archive_depth(mut self, depth: u32) -> Self {
        self.max_archive_depth = depth;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Run one request to completion.
    ///
    /// Per-file problems end up in the log. A fatal error deletes everything
    /// the request produced and returns the log collected so far.
    pub fn run(&self, request: ConversionRequest) -> Result<RequestOutcome, RequestFailure> {
        let job = JobId::new();
        let mut log = ConversionLog::new();
        tracing::info!(
            "Request {}: {} upload(s) to {}",
            job.short(),
            request.uploads.len(),
            request.target
        );

        match self.execute(job, &request, &mut log) {
            Ok(output) => Ok(RequestOutcome { job, output, log }),
            Err(error) => {
                tracing::error!("Request {} failed: {}", job.short(), error);
                Err(RequestFailure { error, log })
            }
        }
    }

    fn execute(
        &self,
        job: JobId,
        request: &ConversionRequest,
        log: &mut ConversionLog,
    ) -> Result<Option<PathBuf>, RequestError> {
        let mut transient = ScopedCleanup::new("request");
        for upload in &request.uploads {
            transient.track(&upload.path);
        }

        guard::admit(&request.uploads, self.budgets.uploads.as_ref(), &self.policy, log)?;

        let expansion = Expander::new(&self.layout.jobs, self.budgets.jobs.as_ref(), self.policy, job)
            .with_max_depth(self.max_archive_depth)
            .expand(&request.uploads, log);
        for dir in &expansion.extraction_dirs {
            transient.track(dir);
        }

        let tasks = retain_convertible(expansion.tasks, &self.matrix, request.target, log);
        if tasks.is_empty() {
            log.issue(
                Issue::NoOutputsProduced,
                format!("nothing to convert to {}", request.target),
                None,
            );
            return Ok(None);
        }
        log.info(format!(
            "{} file(s) queued for conversion to {}",
            tasks.len(),
            request.target
        ));

        let mut produced = ScopedCleanup::new("outputs");
        let mut outputs = Vec::new();
        let mut planner = BatchPlanner::new(tasks, self.budgets.outputs.as_ref(), self.policy);
        let mut seq = 0;
        let mut batch_number = 0;

        while let Some(batch) = planner.next_batch()? {
            batch_number += 1;
            tracing::info!(
                "Batch {}: {} file(s), {} of {} bytes",
                batch_number,
                batch.tasks.len(),
                batch.footprint,
                batch.budget
            );
            for task in batch.tasks {
                seq += 1;
                if let Some(output) = self.convert_task(job, seq, task, request, log) {
                    produced.track(&output);
                    outputs.push(output);
                }
            }
        }

        let archive = self
            .layout
            .outputs
            .join(format!("{}-converted.zip", job.short()));
        let result = aggregate(outputs, &archive, log)?;
        produced.release_all();
        Ok(result)
    }

    /// Move a task into the working area, convert it and drop the working
    /// copy. Returns the output on success.
    fn convert_task(
        &self,
        job: JobId,
        seq: usize,
        task: FileTask,
        request: &ConversionRequest,
        log: &mut ConversionLog,
    ) -> Option<PathBuf> {
        let extension = if task.extension.is_empty() {
            "bin"
        } else {
            task.extension.as_str()
        };
        let working = self
            .layout
            .uploads
            .join(format!("{}-{:03}.{}", job.short(), seq, extension));

        if let Err(e) = move_file(&task.path, &working) {
            remove_path(&task.path);
            log.issue(
                Issue::ConversionFailed,
                format!("{}: cannot move into the working area: {}", task.name, e),
                None,
            );
            return None;
        }
        let _working = ScopedCleanup::with_path("working input", &working);

        let output = self.layout.outputs.join(format!(
            "{}-{}-{:03}.{}",
            sanitized_stem(Path::new(&task.name)),
            job.short(),
            seq,
            request.target.extension()
        ));

        match self.dispatcher.dispatch(
            &task.extension,
            &working,
            &output,
            request.target,
            &request.options,
        ) {
            ConversionResult::Converted { output, log: text } => {
                log.converted(
                    format!("{} -> {}", task.name, display_name(&output)),
                    text,
                );
                Some(output)
            }
            ConversionResult::Failed { reason, log: text } => {
                log.issue(
                    Issue::ConversionFailed,
                    format!("{}: {}", task.name, reason),
                    Some(text),
                );
                None
            }
        }
    }
}
