// src/exec/backend.rs

//! Pluggable shell executor abstraction.
//!
//! The parallel scheduler and the upgrade-retry wrapper never spawn plain
//! processes themselves; they talk to a [`ShellExecutor`]. Production code
//! uses [`RealShellExecutor`], tests substitute a fake that records calls
//! and scripts outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::ExecutionRequest;

use super::command::{run_captured, run_streaming};

/// Boxed future returned by [`ShellExecutor`] methods.
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Combined output of a captured run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedRun {
    /// Exit code, `None` if the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// stdout and stderr interleaved in arrival order.
    pub output: String,
}

/// Trait abstracting how a non-interactive command is executed.
pub trait ShellExecutor: Send + Sync {
    /// Run the command with output streamed straight to the console.
    ///
    /// A non-zero exit is reported as [`PilotError::CommandFailed`].
    ///
    /// [`PilotError::CommandFailed`]: crate::errors::PilotError::CommandFailed
    fn execute<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, ()>;

    /// Run the command, echoing output to the console while also keeping a
    /// combined copy in memory.
    ///
    /// A non-zero exit is *not* an error here; callers inspect
    /// [`CapturedRun::success`] together with the transcript.
    fn execute_captured<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, CapturedRun>;
}

/// Real executor backend used in production.
#[derive(Debug, Clone, Default)]
pub struct RealShellExecutor;

impl RealShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ShellExecutor for RealShellExecutor {
    fn execute<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, ()> {
        Box::pin(run_streaming(req))
    }

    fn execute_captured<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, CapturedRun> {
        Box::pin(run_captured(req))
    }
}
