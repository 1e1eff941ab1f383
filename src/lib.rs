//! Fileforged - disk-space-aware batch file conversion
//!
//! This library crate exposes the request pipeline for the CLI and for
//! integration testing.

pub mod aggregate;
pub mod budget;
pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod expand;
pub mod guard;
pub mod history;
pub mod planner;
pub mod report;
pub mod request;
pub mod routing;
pub mod task;

pub use budget::{BudgetPolicy, FixedBudget, StorageBudget, VolumeBudget};
pub use error::{RequestError, RequestFailure};
pub use report::{ConversionLog, EntryKind, Issue};
pub use request::{BatchConverter, Budgets, ConversionRequest, Layout, RequestOutcome};
pub use routing::ConversionMatrix;
pub use task::{FileTask, Upload};
