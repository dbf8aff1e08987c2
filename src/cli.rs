// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! tfpilot's own flags come first; everything from the first positional
//! argument on is handed to the wrapped tool untouched:
//!
//! ```text
//! tfpilot --parallelism 8 state rm --all aws_instance.legacy
//! tfpilot --yes destroy
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::Answer;

/// Command-line arguments for `tfpilot`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfpilot",
    version,
    about = "Drive terragrunt/terraform: answer prompts, fan state changes out over modules, recover from stale init.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `tfpilot.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TFPILOT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Maximum number of modules processed at once for `--all` state
    /// operations.
    #[arg(long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Tool to run instead of the configured one.
    #[arg(long, value_name = "PROGRAM")]
    pub executable: Option<String>,

    /// Run on a pseudo-terminal and answer generic y/n prompts with this
    /// value.
    #[arg(long, value_name = "y|n", conflicts_with = "yes")]
    pub auto_answer: Option<Answer>,

    /// Shorthand for `--auto-answer y`.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Run on a pseudo-terminal with the configured default answer.
    #[arg(long)]
    pub interactive: bool,

    /// Directory to run in (and, for `--all` state operations, to search
    /// for modules).
    #[arg(long, short = 'C', value_name = "DIR", default_value = ".")]
    pub chdir: PathBuf,

    /// Resolve configuration and mode, list modules, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Arguments for the wrapped tool.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true
    )]
    pub tool_args: Vec<String>,
}

impl CliArgs {
    /// Answer requested by `--auto-answer` / `--yes`, if any.
    pub fn answer_directive(&self) -> Option<Answer> {
        self.auto_answer.or(self.yes.then_some(Answer::Yes))
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
