// src/upgrade/retry.rs

//! Run a command once; if it fails because the working directory needs
//! `init --upgrade`, reinitialise and try exactly once more.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{PilotError, Result};
use crate::exec::ShellExecutor;
use crate::types::ExecutionRequest;
use crate::upgrade::signatures::find_upgrade_signature;

/// Arguments of the reinitialisation command.
pub const REINIT_ARGS: &[&str] = &["init", "--upgrade"];

/// Where a call stands. `Retried` is terminal: its arm streams the command
/// once and returns whatever happens, so a recurring signature cannot loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Initial,
    Retried,
}

/// Stateless wrapper; safe to share between concurrent callers.
#[derive(Clone)]
pub struct UpgradeRetry {
    executor: Arc<dyn ShellExecutor>,
}

impl UpgradeRetry {
    pub fn new(executor: Arc<dyn ShellExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run(&self, req: &ExecutionRequest) -> Result<()> {
        let mut state = RetryState::Initial;

        loop {
            match state {
                RetryState::Initial => {
                    let run = self.executor.execute_captured(req).await?;
                    if run.success {
                        return Ok(());
                    }

                    let original = PilotError::CommandFailed {
                        command: req.display_command(),
                        dir: req.working_directory().to_path_buf(),
                        code: run.exit_code,
                    };

                    let Some(signature) = find_upgrade_signature(&run.output) else {
                        return Err(original);
                    };

                    info!(
                        command = %req.display_command(),
                        signature,
                        "command failed with an init signature; running init --upgrade"
                    );

                    let reinit = req.with_arguments(REINIT_ARGS.iter().copied());
                    if let Err(e) = self.executor.execute(&reinit).await {
                        warn!(error = %e, "reinitialization failed; not retrying");
                        return Err(PilotError::ReinitFailed {
                            reinit: Box::new(e),
                            original: Box::new(original),
                        });
                    }

                    state = RetryState::Retried;
                }
                RetryState::Retried => {
                    info!(command = %req.display_command(), "retrying after reinitialization");
                    return self.executor.execute(req).await;
                }
            }
        }
    }
}
