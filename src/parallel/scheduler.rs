// src/parallel/scheduler.rs

//! Bounded fan-out of one command over many module directories.
//!
//! A fixed pool of workers pulls [`WorkUnit`]s from a shared queue, runs
//! the plain executor once per unit and sends exactly one [`JobOutcome`]
//! back. The calling task is the only aggregator: it owns the
//! [`BatchResult`] and stops once it has seen one outcome per unit.
//! Workers never touch shared counters.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::errors::{PilotError, Result};
use crate::exec::ShellExecutor;
use crate::fs::FileSystem;
use crate::parallel::args::strip_all_marker;
use crate::parallel::discovery::{discover_work_units, ModuleMatcher};
use crate::types::{BatchResult, ExecutionRequest, JobOutcome, WorkUnit};

/// Default size of the worker pool.
pub const DEFAULT_MAX_WORKERS: usize = 5;

type WorkQueue = Arc<Mutex<mpsc::Receiver<WorkUnit>>>;

/// Runs state-mutating commands across every module below a root.
pub struct ParallelScheduler {
    executor: Arc<dyn ShellExecutor>,
    fs: Arc<dyn FileSystem>,
    executable: Arc<str>,
    matcher: ModuleMatcher,
    all_marker: String,
}

impl ParallelScheduler {
    pub fn new(
        executor: Arc<dyn ShellExecutor>,
        fs: Arc<dyn FileSystem>,
        executable: impl Into<Arc<str>>,
        matcher: ModuleMatcher,
        all_marker: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            fs,
            executable: executable.into(),
            matcher,
            all_marker: all_marker.into(),
        }
    }

    /// Discover the work units below `root`; an empty result is an error.
    pub fn discover(&self, root: &Path) -> Result<Vec<WorkUnit>> {
        let units = discover_work_units(self.fs.as_ref(), root, &self.matcher)?;
        if units.is_empty() {
            return Err(PilotError::NoModulesFound(root.to_path_buf()));
        }
        Ok(units)
    }

    /// Run `arguments` in every module below `root` and return the
    /// per-unit outcomes.
    ///
    /// Errors only for discovery problems; unit failures are in the batch.
    pub async fn run_batch(
        &self,
        root: &Path,
        arguments: &[String],
        max_workers: usize,
    ) -> Result<BatchResult> {
        let units = self.discover(root)?;
        let arguments = strip_all_marker(arguments, &self.all_marker);

        info!(
            root = %root.display(),
            modules = units.len(),
            workers = max_workers,
            args = ?arguments,
            "running command across modules"
        );

        Ok(execute_units(
            Arc::clone(&self.executor),
            Arc::clone(&self.executable),
            arguments,
            units,
            max_workers,
        )
        .await)
    }

    /// Like [`run_batch`](Self::run_batch), but any failed unit turns into
    /// one summarising [`PilotError::BatchFailed`].
    pub async fn run(&self, root: &Path, arguments: &[String], max_workers: usize) -> Result<()> {
        let batch = self.run_batch(root, arguments, max_workers).await?;

        if batch.is_success() {
            info!(succeeded = batch.succeeded, failed = 0, "all modules succeeded");
            return Ok(());
        }

        warn!(
            succeeded = batch.succeeded,
            failed = batch.failed.len(),
            "some modules failed"
        );
        for (unit, err) in &batch.failed {
            warn!(unit = %unit, error = %err, "failed module");
        }

        Err(PilotError::BatchFailed {
            failed: batch.failed.len(),
            total: batch.total(),
        })
    }
}

/// Run every unit through `executor` with at most `max_workers` in flight.
pub async fn execute_units(
    executor: Arc<dyn ShellExecutor>,
    executable: Arc<str>,
    arguments: Vec<String>,
    units: Vec<WorkUnit>,
    max_workers: usize,
) -> BatchResult {
    let total = units.len();
    let mut batch = BatchResult::default();
    if total == 0 {
        return batch;
    }
    let workers = max_workers.clamp(1, total);

    // The queue holds every unit up front, so sends never wait.
    let (work_tx, work_rx) = mpsc::channel::<WorkUnit>(total);
    for unit in units {
        if work_tx.send(unit).await.is_err() {
            break;
        }
    }
    drop(work_tx);
    let queue: WorkQueue = Arc::new(Mutex::new(work_rx));

    let (result_tx, mut result_rx) = mpsc::channel::<JobOutcome>(workers);
    let arguments: Arc<[String]> = arguments.into();

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        handles.push(tokio::spawn(worker_loop(
            worker_id,
            Arc::clone(&executor),
            Arc::clone(&executable),
            Arc::clone(&arguments),
            Arc::clone(&queue),
            result_tx.clone(),
        )));
    }
    drop(result_tx);

    while batch.total() < total {
        match result_rx.recv().await {
            Some(outcome) => batch.record(outcome),
            None => {
                error!(
                    received = batch.total(),
                    expected = total,
                    "workers stopped before reporting every module"
                );
                break;
            }
        }
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "worker task ended abnormally");
        }
    }

    batch
}

async fn worker_loop(
    worker_id: usize,
    executor: Arc<dyn ShellExecutor>,
    executable: Arc<str>,
    arguments: Arc<[String]>,
    queue: WorkQueue,
    results: mpsc::Sender<JobOutcome>,
) {
    debug!(worker = worker_id, "worker started");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(unit) = next else {
            break;
        };

        let req = ExecutionRequest::new(
            &*executable,
            arguments.iter().cloned(),
            unit.path.clone(),
        );
        debug!(worker = worker_id, unit = %unit, command = %req.display_command(), "starting module");

        let error = run_unit(Arc::clone(&executor), req).await.err();
        match &error {
            None => info!(unit = %unit, "module succeeded"),
            Some(err) => error!(unit = %unit, error = %err, "module failed"),
        }

        if results.send(JobOutcome { unit, error }).await.is_err() {
            break;
        }
    }

    debug!(worker = worker_id, "worker finished");
}

/// Run one unit on its own task so a panicking executor still yields an
/// outcome for that unit.
async fn run_unit(executor: Arc<dyn ShellExecutor>, req: ExecutionRequest) -> Result<()> {
    let handle = tokio::spawn(async move { executor.execute(&req).await });
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(PilotError::Other(anyhow!("module execution aborted: {e}"))),
    }
}
