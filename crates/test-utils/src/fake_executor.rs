use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tfpilot::errors::PilotError;
use tfpilot::exec::{CapturedRun, ExecFuture, ShellExecutor};
use tfpilot::types::ExecutionRequest;
use tokio::sync::mpsc;

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum FakeRun {
    Succeed { output: String },
    Fail { code: i32, output: String },
    Panic,
}

impl FakeRun {
    pub fn ok() -> Self {
        FakeRun::Succeed {
            output: String::new(),
        }
    }

    pub fn fail(code: i32, output: impl Into<String>) -> Self {
        FakeRun::Fail {
            code,
            output: output.into(),
        }
    }
}

/// Reported for every call, in the order the calls happen.
#[derive(Debug, Clone)]
pub enum ExecEvent {
    Started {
        request: ExecutionRequest,
        captured: bool,
    },
    Finished {
        request: ExecutionRequest,
    },
}

type Script = Arc<dyn Fn(&ExecutionRequest) -> FakeRun + Send + Sync>;

/// A fake executor that:
/// - decides each call's outcome from a script over the request
/// - reports start/finish of every call on a channel
/// - optionally sleeps between the two, so calls overlap.
///
/// Nothing is counted inside the executor; tests read the event stream.
pub struct FakeShellExecutor {
    script: Script,
    delay: Duration,
    events: mpsc::UnboundedSender<ExecEvent>,
}

impl FakeShellExecutor {
    /// Every call succeeds.
    pub fn new() -> (Self, ExecLog) {
        Self::scripted(|_| FakeRun::ok())
    }

    pub fn scripted<F>(script: F) -> (Self, ExecLog)
    where
        F: Fn(&ExecutionRequest) -> FakeRun + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let exec = Self {
            script: Arc::new(script),
            delay: Duration::ZERO,
            events: tx,
        };
        (exec, ExecLog { rx })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn call(&self, req: &ExecutionRequest, captured: bool) -> FakeRun {
        let _ = self.events.send(ExecEvent::Started {
            request: req.clone(),
            captured,
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let run = (self.script)(req);
        if matches!(run, FakeRun::Panic) {
            panic!("scripted panic for {}", req.display_command());
        }
        let _ = self.events.send(ExecEvent::Finished {
            request: req.clone(),
        });
        run
    }
}

impl ShellExecutor for FakeShellExecutor {
    fn execute<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            match self.call(req, false).await {
                FakeRun::Fail { code, .. } => Err(command_failed(req, code)),
                _ => Ok(()),
            }
        })
    }

    fn execute_captured<'a>(&'a self, req: &'a ExecutionRequest) -> ExecFuture<'a, CapturedRun> {
        Box::pin(async move {
            let run = match self.call(req, true).await {
                FakeRun::Fail { code, output } => CapturedRun {
                    exit_code: Some(code),
                    success: false,
                    output,
                },
                FakeRun::Succeed { output } => CapturedRun {
                    exit_code: Some(0),
                    success: true,
                    output,
                },
                FakeRun::Panic => CapturedRun::default(),
            };
            Ok::<_, PilotError>(run)
        })
    }
}

fn command_failed(req: &ExecutionRequest, code: i32) -> PilotError {
    PilotError::CommandFailed {
        command: req.display_command(),
        dir: req.working_directory().to_path_buf(),
        code: Some(code),
    }
}

/// Receiving end of a [`FakeShellExecutor`]'s events.
pub struct ExecLog {
    rx: mpsc::UnboundedReceiver<ExecEvent>,
}

impl ExecLog {
    /// Everything reported so far.
    pub fn drain(&mut self) -> Vec<ExecEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
        out
    }
}

/// Requests of all `Started` events, in order.
pub fn started(events: &[ExecEvent]) -> Vec<&ExecutionRequest> {
    events
        .iter()
        .filter_map(|ev| match ev {
            ExecEvent::Started { request, .. } => Some(request),
            ExecEvent::Finished { .. } => None,
        })
        .collect()
}

/// Working directories of all started calls, sorted.
pub fn started_dirs(events: &[ExecEvent]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = started(events)
        .into_iter()
        .map(|r| r.working_directory().to_path_buf())
        .collect();
    dirs.sort();
    dirs
}

/// Highest number of calls that were between `Started` and `Finished` at
/// the same time.
pub fn max_in_flight(events: &[ExecEvent]) -> usize {
    let mut current = 0usize;
    let mut max = 0usize;
    for ev in events {
        match ev {
            ExecEvent::Started { .. } => {
                current += 1;
                max = max.max(current);
            }
            ExecEvent::Finished { .. } => current = current.saturating_sub(1),
        }
    }
    max
}

/// Whether `req` runs `args` in `dir`.
pub fn is_call(req: &ExecutionRequest, args: &[&str], dir: &Path) -> bool {
    req.arguments().iter().map(String::as_str).eq(args.iter().copied())
        && req.working_directory() == dir
}

