// src/engine/mod.rs

//! The command-execution engine.
//!
//! [`Engine`] owns the injected collaborators (plain executor, filesystem,
//! prompt rules) and exposes the three execution paths:
//! - [`Engine::run_interactive`]: PTY session with prompt automation;
//! - [`Engine::run_parallel`]: bounded fan-out over discovered modules;
//! - [`Engine::run_with_upgrade_retry`]: plain run with one reinit retry.
//!
//! The paths share no mutable state. Each owns its child processes for the
//! duration of the call.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ConfigFile;
use crate::errors::{PilotError, Result};
use crate::exec::ShellExecutor;
use crate::fs::FileSystem;
use crate::parallel::{ModuleMatcher, ParallelScheduler};
use crate::prompt::{builtin_rules, run_interactive, PromptRule};
use crate::types::{Answer, BatchResult, ExecutionRequest, WorkUnit};
use crate::upgrade::UpgradeRetry;

/// Resolved settings the engine runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub executable: String,
    pub parallelism: usize,
    pub default_answer: Answer,
    pub all_marker: String,
    pub markers: Vec<String>,
    /// Version of the running binary, injected by the caller.
    pub version: String,
}

impl EngineConfig {
    pub fn from_config(cfg: &ConfigFile, version: impl Into<String>) -> Self {
        Self {
            executable: cfg.config.executable.clone(),
            parallelism: cfg.config.parallelism,
            default_answer: cfg.config.default_answer,
            all_marker: cfg.config.all_marker.clone(),
            markers: cfg.modules.markers.clone(),
            version: version.into(),
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    rules: Arc<[PromptRule]>,
    scheduler: ParallelScheduler,
    upgrade: UpgradeRetry,
}

impl Engine {
    /// Build an engine with the built-in prompt rules.
    pub fn new(
        config: EngineConfig,
        executor: Arc<dyn ShellExecutor>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let rules = builtin_rules().map_err(|e| PilotError::Other(e.into()))?;
        Self::with_rules(config, executor, fs, rules)
    }

    pub fn with_rules(
        config: EngineConfig,
        executor: Arc<dyn ShellExecutor>,
        fs: Arc<dyn FileSystem>,
        rules: Vec<PromptRule>,
    ) -> Result<Self> {
        let matcher = ModuleMatcher::new(&config.markers)?;
        let scheduler = ParallelScheduler::new(
            Arc::clone(&executor),
            fs,
            config.executable.as_str(),
            matcher,
            config.all_marker.clone(),
        );

        Ok(Self {
            rules: rules.into(),
            scheduler,
            upgrade: UpgradeRetry::new(executor),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Request for the configured executable.
    pub fn request(&self, arguments: &[String], dir: &Path) -> ExecutionRequest {
        ExecutionRequest::new(&self.config.executable, arguments.iter().cloned(), dir)
    }

    /// Run `req` on a pseudo-terminal, answering known prompts.
    pub async fn run_interactive(&self, req: &ExecutionRequest, default_answer: Answer) -> Result<()> {
        info!(version = %self.config.version, mode = "interactive", "tfpilot starting");
        run_interactive(req, Arc::clone(&self.rules), default_answer).await
    }

    /// Modules below `root`, sorted. Errors if there are none.
    pub fn discover(&self, root: &Path) -> Result<Vec<WorkUnit>> {
        self.scheduler.discover(root)
    }

    /// Fan `arguments` out over every module below `root`, returning the
    /// per-module outcomes.
    pub async fn run_parallel_batch(
        &self,
        root: &Path,
        arguments: &[String],
        max_workers: usize,
    ) -> Result<BatchResult> {
        if max_workers == 0 {
            return Err(PilotError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        info!(version = %self.config.version, mode = "parallel", "tfpilot starting");
        self.scheduler.run_batch(root, arguments, max_workers).await
    }

    /// As [`run_parallel_batch`](Self::run_parallel_batch), failing with
    /// [`PilotError::BatchFailed`] if any module failed.
    pub async fn run_parallel(&self, root: &Path, arguments: &[String], max_workers: usize) -> Result<()> {
        if max_workers == 0 {
            return Err(PilotError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        info!(version = %self.config.version, mode = "parallel", "tfpilot starting");
        self.scheduler.run(root, arguments, max_workers).await
    }

    pub async fn run_with_upgrade_retry(&self, req: &ExecutionRequest) -> Result<()> {
        info!(version = %self.config.version, mode = "upgrade-retry", "tfpilot starting");
        self.upgrade.run(req).await
    }
}
