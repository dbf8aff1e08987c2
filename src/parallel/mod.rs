// src/parallel/mod.rs

//! Bounded parallel scheduler for fleet-wide ("--all") state operations.
//!
//! - [`args`] strips the fleet marker before per-module runs.
//! - [`discovery`] finds module directories.
//! - [`scheduler`] fans the command out over a fixed worker pool and
//!   aggregates the outcomes.

pub mod args;
pub mod discovery;
pub mod scheduler;

pub use args::{has_all_marker, strip_all_marker, DEFAULT_ALL_MARKER};
pub use discovery::{discover_work_units, ModuleMatcher, DEFAULT_MODULE_MARKERS};
pub use scheduler::{execute_units, ParallelScheduler, DEFAULT_MAX_WORKERS};
