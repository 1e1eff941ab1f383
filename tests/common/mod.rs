//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which lays out uploads/outputs/jobs directories
//! in a temp dir, plus fake budgets and converter strategies so requests can
//! run without real disks filling up or real converters installed.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fileforged::budget::{BudgetPolicy, FixedBudget, StorageBudget};
use fileforged::dispatch::{ConvertError, ConvertJob, ConverterStrategy, Dispatcher};
use fileforged::request::{BatchConverter, Budgets, Layout};
use fileforged::task::Upload;
use fileforged_common::{SourceKind, TargetKind};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const MB: u64 = 1024 * 1024;

/// Budget returning scripted readings in order, repeating the last one.
pub struct ScriptedBudget {
    readings: Mutex<Vec<u64>>,
}

impl ScriptedBudget {
    pub fn new(readings: Vec<u64>) -> Self {
        assert!(!readings.is_empty());
        Self {
            readings: Mutex::new(readings),
        }
    }
}

impl StorageBudget for ScriptedBudget {
    fn free_bytes(&self) -> u64 {
        let mut readings = self.readings.lock().unwrap();
        if readings.len() > 1 {
            readings.remove(0)
        } else {
            readings[0]
        }
    }
}

/// What a [`FakeStrategy`] does when asked to convert.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Copy input to output.
    Copy,
    /// Fail with the given tool output.
    Fail(&'static str),
    /// Report success without writing anything.
    NoOutput,
}

/// Converter stand-in recording every input it was handed.
pub struct FakeStrategy {
    behavior: Behavior,
    calls: Mutex<Vec<String>>,
}

impl FakeStrategy {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// File names of the working inputs seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ConverterStrategy for FakeStrategy {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn convert(&self, job: &ConvertJob<'_>) -> Result<String, ConvertError> {
        assert!(job.input.exists(), "working input missing: {:?}", job.input);
        self.calls.lock().unwrap().push(
            job.input
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
        );

        match self.behavior {
            Behavior::Copy => {
                fs::copy(job.input, job.output).map_err(|e| ConvertError::new(e.to_string()))?;
                Ok(format!("fake converted to {}", job.target))
            }
            Behavior::Fail(output) => Err(ConvertError {
                reason: "tool execution failed: fake: exit status: 1".into(),
                output: output.into(),
            }),
            Behavior::NoOutput => Ok("fake finished".into()),
        }
    }
}

/// Dispatcher sending every route to `strategy`.
pub fn fake_dispatcher(scratch: &Path, strategy: Arc<FakeStrategy>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(scratch);
    for source in SourceKind::ALL {
        for target in [
            TargetKind::Raster,
            TargetKind::Media,
            TargetKind::Document,
            TargetKind::Ocr,
        ] {
            dispatcher.register(source, target, strategy.clone());
        }
    }
    dispatcher
}

/// Temp data directory with the standard layout.
pub struct TestHarness {
    pub root: TempDir,
    pub layout: Layout,
}

impl TestHarness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let layout = Layout::under(root.path());
        layout.create_all().expect("failed to create layout");
        Self { root, layout }
    }

    /// Write an upload of `size` bytes into the uploads directory.
    pub fn upload(&self, name: &str, size: usize) -> Upload {
        let path = self.layout.uploads.join(name);
        fs::write(&path, vec![0x5a; size]).unwrap();
        Upload::new(path)
    }

    /// Write a ZIP upload with the given members.
    pub fn zip_upload(&self, name: &str, members: &[(&str, &[u8])]) -> Upload {
        let path = self.layout.uploads.join(name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for (member, data) in members {
            zip.start_file(*member, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        Upload::new(path)
    }

    /// Converter with unlimited space and no safety margin.
    pub fn converter(&self, strategy: Arc<FakeStrategy>) -> BatchConverter {
        self.converter_with(
            Budgets::uniform(Arc::new(FixedBudget(u64::MAX))),
            BudgetPolicy::new(0, 2.0),
            strategy,
        )
    }

    pub fn converter_with(
        &self,
        budgets: Budgets,
        policy: BudgetPolicy,
        strategy: Arc<FakeStrategy>,
    ) -> BatchConverter {
        BatchConverter::new(
            self.layout.clone(),
            budgets,
            policy,
            fake_dispatcher(&self.layout.jobs, strategy),
        )
    }

    pub fn files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    /// Everything left in the uploads and jobs directories.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        let mut left = Self::files_in(&self.layout.uploads);
        left.extend(Self::files_in(&self.layout.jobs));
        left
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        Self::files_in(&self.layout.outputs)
    }
}

/// Write an executable shell script standing in for an external tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
