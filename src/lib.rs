// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod parallel;
pub mod prompt;
pub mod types;
pub mod upgrade;

use std::sync::Arc;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{load_config, ConfigOverrides};
use crate::dispatch::{classify, Mode};
use crate::engine::{Engine, EngineConfig};
use crate::errors::Result;
use crate::exec::RealShellExecutor;
use crate::fs::{FileSystem, RealFileSystem};

pub use crate::errors::PilotError;

/// High-level entry point used by `main.rs`.
///
/// Loads configuration, builds the [`Engine`] with the real executor and
/// filesystem, classifies the invocation and runs exactly one of the three
/// execution paths.
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let overrides = ConfigOverrides {
        executable: args.executable.clone(),
        parallelism: args.parallelism,
        default_answer: args.answer_directive(),
    };
    let cfg = load_config(fs.as_ref(), args.config.as_deref(), &overrides)?;

    let directive = args
        .answer_directive()
        .or(args.interactive.then_some(cfg.config.default_answer));
    let mode = classify(&args.tool_args, &cfg.config, directive);

    let engine = Engine::new(
        EngineConfig::from_config(&cfg, env!("CARGO_PKG_VERSION")),
        Arc::new(RealShellExecutor::new()),
        fs,
    )?;

    if args.dry_run {
        return print_dry_run(&engine, mode, &args);
    }

    let req = engine.request(&args.tool_args, &args.chdir);
    match mode {
        Mode::Parallel => {
            let workers = engine.config().parallelism;
            engine.run_parallel(&args.chdir, &args.tool_args, workers).await
        }
        Mode::Interactive(answer) => engine.run_interactive(&req, answer).await,
        Mode::UpgradeRetry => engine.run_with_upgrade_retry(&req).await,
    }
}

/// Print the resolved configuration, the mode and (for fleet runs) the
/// modules that would be touched.
fn print_dry_run(engine: &Engine, mode: Mode, args: &CliArgs) -> Result<()> {
    let cfg = engine.config();
    println!("tfpilot {} dry-run", cfg.version);
    println!("  config.executable = {}", cfg.executable);
    println!("  config.parallelism = {}", cfg.parallelism);
    println!("  config.default_answer = {}", cfg.default_answer);
    println!("  config.all_marker = {}", cfg.all_marker);
    println!("  modules.markers = {:?}", cfg.markers);
    println!();
    println!("mode: {mode}");
    println!(
        "command: {}",
        engine.request(&args.tool_args, &args.chdir).display_command()
    );
    println!("directory: {}", args.chdir.display());

    if mode == Mode::Parallel {
        let units = engine.discover(&args.chdir)?;
        println!();
        println!("modules ({}):", units.len());
        for unit in units {
            println!("  - {unit}");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
